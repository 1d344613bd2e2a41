//! Utility modules.

pub mod text;

pub use text::{clean_paragraphs, clean_text, clean_text_strict, normalize, remove_html};
