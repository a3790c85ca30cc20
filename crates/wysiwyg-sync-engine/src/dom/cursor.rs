/// A byte cursor over markup source.
///
/// Only ever stops on ASCII delimiters, so every index it reports is a valid
/// char boundary for slicing `s`.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The markup being read.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    /// Checks if the remaining input starts with `pat`, ignoring ASCII case.
    pub fn starts_with_ignore_case(&self, pat: &[u8]) -> bool {
        let rest = &self.s.as_bytes()[self.i.min(self.s.len())..];
        rest.len() >= pat.len() && rest[..pat.len()].eq_ignore_ascii_case(pat)
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Advances while `pred` holds, returning the consumed slice.
    pub fn eat_while(&mut self, mut pred: impl FnMut(u8) -> bool) -> &'a str {
        let start = self.i;
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.i += 1;
        }
        &self.s[start..self.i]
    }

    pub fn skip_whitespace(&mut self) {
        self.eat_while(|b| b.is_ascii_whitespace());
    }

    /// Moves past the next occurrence of `pat`, or to the end when absent.
    /// Returns the text before `pat`.
    pub fn eat_until(&mut self, pat: &str) -> &'a str {
        let start = self.i.min(self.s.len());
        match self.s[start..].find(pat) {
            Some(found) => {
                self.i = start + found + pat.len();
                &self.s[start..start + found]
            }
            None => {
                self.i = self.s.len();
                &self.s[start..]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("<p>");
        assert!(!cur.eof());
        assert_eq!(cur.peek(), Some(b'<'));
        assert_eq!(cur.bump(), Some(b'<'));
        assert_eq!(cur.i, 1);
    }

    #[test]
    fn empty_string_input() {
        let cur = Cursor::new("");
        assert!(cur.eof());
        assert_eq!(cur.peek(), None);
    }

    #[test]
    fn starts_with_ignores_case() {
        let cur = Cursor::new("</SCRIPT>");
        assert!(cur.starts_with_ignore_case(b"</script"));
        assert!(!cur.starts_with_ignore_case(b"</style"));
    }

    #[test]
    fn starts_with_pattern_longer_than_remaining() {
        let mut cur = Cursor::new("ab");
        assert!(!cur.starts_with_ignore_case(b"abcdef"));
        cur.bump_n(2);
        assert!(cur.starts_with_ignore_case(b""));
        assert!(!cur.starts_with_ignore_case(b"a"));
    }

    #[test]
    fn eat_while_stops_at_delimiter() {
        let mut cur = Cursor::new("span class");
        assert_eq!(cur.eat_while(|b| b.is_ascii_alphanumeric()), "span");
        cur.skip_whitespace();
        assert_eq!(cur.peek(), Some(b'c'));
    }

    #[test]
    fn eat_until_consumes_pattern() {
        let mut cur = Cursor::new(" a comment -->rest");
        assert_eq!(cur.eat_until("-->"), " a comment ");
        assert_eq!(&cur.s[cur.i..], "rest");
    }

    #[test]
    fn eat_until_missing_pattern_runs_to_end() {
        let mut cur = Cursor::new("never closed");
        assert_eq!(cur.eat_until("-->"), "never closed");
        assert!(cur.eof());
        assert_eq!(cur.bump(), None);
    }
}
