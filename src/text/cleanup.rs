//! Whitespace normalization shared by the text-layer and OCR paths.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static MULTI_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());
static NEWLINE_INDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s+").unwrap());
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// Options for text cleanup.
///
/// The whitespace rules always run; the remaining switches control the
/// Unicode fixes applied before them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Fix ligatures (fi, fl, etc.)
    pub fix_ligatures: bool,

    /// Remove Private Use Area (PUA) characters
    pub remove_pua: bool,

    /// Remove Unicode replacement character (U+FFFD)
    pub remove_replacement_char: bool,

    /// Collapse three or more newlines into a blank line
    pub collapse_blank_lines: bool,
}

impl CleanupOptions {
    /// Whitespace rules only.
    pub fn minimal() -> Self {
        Self {
            normalize_unicode: false,
            fix_ligatures: false,
            remove_pua: false,
            remove_replacement_char: false,
            collapse_blank_lines: true,
        }
    }

    /// Cleanup for text-layer output.
    pub fn standard() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: true,
            remove_pua: false,
            remove_replacement_char: true,
            collapse_blank_lines: true,
        }
    }

    /// Cleanup for recognized text; the blank-line cap is not applied.
    pub fn ocr() -> Self {
        Self {
            collapse_blank_lines: false,
            ..Self::standard()
        }
    }

    /// Enable or disable NFC normalization.
    pub fn with_unicode_normalization(mut self, enabled: bool) -> Self {
        self.normalize_unicode = enabled;
        self
    }

    /// Enable or disable Private Use Area removal.
    pub fn with_pua_removal(mut self, enabled: bool) -> Self {
        self.remove_pua = enabled;
        self
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Text cleanup pipeline.
#[derive(Debug, Clone, Default)]
pub struct CleanupPipeline {
    options: CleanupOptions,
}

impl CleanupPipeline {
    /// Create a new cleanup pipeline with the given options.
    pub fn new(options: CleanupOptions) -> Self {
        Self { options }
    }

    /// Pipeline for text-layer output.
    pub fn standard() -> Self {
        Self::new(CleanupOptions::standard())
    }

    /// Pipeline for OCR output.
    pub fn ocr() -> Self {
        Self::new(CleanupOptions::ocr())
    }

    /// The active options.
    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Process text through the cleanup pipeline.
    pub fn process(&self, text: &str) -> String {
        let mut result = if self.options.normalize_unicode {
            text.nfc().collect::<String>()
        } else {
            text.to_string()
        };

        if self.options.fix_ligatures && result.chars().any(is_ligature) {
            result = result
                .chars()
                .fold(String::with_capacity(result.len()), |mut acc, c| {
                    match LIGATURES.iter().find(|(lig, _)| *lig == c) {
                        Some((_, replacement)) => acc.push_str(replacement),
                        None => acc.push(c),
                    }
                    acc
                });
        }

        if self.options.remove_pua {
            result.retain(|c| !is_private_use(c));
        }

        if self.options.remove_replacement_char {
            result.retain(|c| c != '\u{FFFD}');
        }

        normalize_whitespace(&result, self.options.collapse_blank_lines)
    }
}

/// Apply the whitespace rules in order: collapse runs of two or more
/// whitespace characters into one space, strip whitespace after each
/// newline, optionally cap newline runs at two, then trim.
///
/// The first rule runs before the newline rules, so a run such as `"\n\n"`
/// is already a single space by the time they apply.
pub fn normalize_whitespace(text: &str, collapse_blank_lines: bool) -> String {
    let result = MULTI_WHITESPACE.replace_all(text, " ");
    let result = NEWLINE_INDENT.replace_all(&result, "\n");
    let result = if collapse_blank_lines {
        BLANK_LINES.replace_all(&result, "\n\n")
    } else {
        result
    };
    result.trim().to_string()
}

fn is_ligature(c: char) -> bool {
    ('\u{FB00}'..='\u{FB06}').contains(&c)
}

fn is_private_use(c: char) -> bool {
    let code = c as u32;
    (0xE000..=0xF8FF).contains(&code)
        || (0xF0000..=0xFFFFD).contains(&code)
        || (0x100000..=0x10FFFD).contains(&code)
}
