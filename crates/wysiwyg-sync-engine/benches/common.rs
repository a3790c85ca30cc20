// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use wysiwyg_sync_engine::{KeywordDescriptor, KeywordTable};

#[allow(dead_code)]
pub fn generate_markup(paragraphs: usize) -> String {
    let base = "<p>Some text with a smile :) and a <b>bold lol</b> in it.</p>\
                <ul><li>item :-)</li><li>plain item</li></ul>\
                <pre>code :) stays</pre>";
    base.repeat(paragraphs)
}

#[allow(dead_code)]
pub fn keyword_table(extra: usize) -> KeywordTable {
    let mut entries: Vec<(String, String)> = [":)", ":-)", ":(", "lol", "<3", ":D"]
        .iter()
        .map(|code| (code.to_string(), format!("{code}.png")))
        .collect();
    for i in 0..extra {
        entries.push((format!(":k{i}:"), format!("k{i}.png")));
    }
    KeywordTable::new(entries.into_iter().map(|(code, url)| {
        (
            code,
            KeywordDescriptor {
                content_url: url,
                tooltip: None,
            },
        )
    }))
}
