//! # Keyword substitution
//!
//! Configured shorthand codes (`:)`, `lol`) are swapped for replacement
//! elements, either across a whole subtree ([`replace_keywords`]) or at the
//! caret while typing ([`PositionTracker::replace_keyword`]). Replacements
//! remember their code in [`KEYWORD_ATTR`] so they can be turned back into
//! text when substitution is switched off or, in compat mode, when typing
//! glues them to a neighbouring word.
//!
//! [`PositionTracker::replace_keyword`]: crate::selection::PositionTracker::replace_keyword

pub mod keystroke;
pub mod substitute;
pub mod table;
pub mod verbatim;

pub use substitute::{check_whitespace, is_keyword_space, replace_keywords, restore_codes};
pub use table::{
    KEYWORD_ATTR, Keyword, KeywordDescriptor, KeywordTable, create_replacement, replacement_markup,
};
pub use verbatim::{DefaultVerbatim, VERBATIM_ATTR, VerbatimPredicate, in_verbatim};
