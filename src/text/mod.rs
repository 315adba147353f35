//! Text normalization and script helpers.

mod cleanup;

pub use cleanup::{normalize_whitespace, CleanupOptions, CleanupPipeline};

/// Check if character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
        // Fullwidth forms (：，；)
        || (0xFF00..=0xFFEF).contains(&code)
}

/// Whether every non-whitespace character of `text` is CJK.
pub fn is_cjk_only(text: &str) -> bool {
    let mut any = false;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        if !is_spaceless_script_char(c) {
            return false;
        }
        any = true;
    }
    any
}
