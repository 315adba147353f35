//! Labeled-section splitting.
//!
//! A résumé is treated as a list of lines. A section starts after the first
//! line mentioning one of its labels and runs until the next line that looks
//! like a header.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::is_cjk_only;

/// Headers shorter than this are recognized by shape alone.
const MAX_HEADER_CHARS: usize = 30;

/// `Education & Experience`, `技能 / 证书`, `Skills | Tools`.
static PAIRED_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z\p{Han}][a-z\p{Han}]*\s*[&/|]\s*[A-Z\p{Han}]").unwrap()
});

/// The sections the analyzer knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Summary,
    Skills,
    Education,
    Experience,
    Projects,
    Certificates,
}

impl SectionKind {
    /// Every section kind.
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Summary,
        SectionKind::Skills,
        SectionKind::Education,
        SectionKind::Experience,
        SectionKind::Projects,
        SectionKind::Certificates,
    ];

    /// Labels that introduce this section, Chinese and English.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            SectionKind::Summary => &["个人简介", "自我介绍", "简介", "summary", "about me"],
            SectionKind::Skills => &[
                "技能",
                "专业技能",
                "技术栈",
                "专业技术",
                "skills",
                "technical skills",
            ],
            SectionKind::Education => &["教育", "教育背景", "学历", "education"],
            SectionKind::Experience => &["工作经验", "工作经历", "职业经历", "experience"],
            SectionKind::Projects => &["项目经历", "项目经验", "项目", "projects"],
            SectionKind::Certificates => {
                &["证书", "资格证书", "certificates", "certifications"]
            }
        }
    }

    /// Whether `line` mentions one of this section's labels.
    pub fn is_mentioned_in(self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.synonyms().iter().any(|s| lower.contains(s))
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SectionKind::Summary => "summary",
            SectionKind::Skills => "skills",
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Projects => "projects",
            SectionKind::Certificates => "certificates",
        };
        write!(f, "{}", name)
    }
}

fn mentions_any_label(line: &str) -> bool {
    SectionKind::ALL.iter().any(|k| k.is_mentioned_in(line))
}

fn is_exact_label(line: &str) -> bool {
    let bare = line
        .trim_end_matches([':', '：'])
        .trim()
        .to_lowercase();
    SectionKind::ALL
        .iter()
        .flat_map(|k| k.synonyms().iter())
        .any(|s| *s == bare)
}

fn is_upper_latin(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_uppercase())
        && line
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_whitespace())
}

/// Check if a trimmed line looks like a section header.
pub fn looks_like_header(line: &str) -> bool {
    let short = line.chars().count() < MAX_HEADER_CHARS;

    (short && is_upper_latin(line))
        || line.ends_with(':')
        || line.ends_with('：')
        || PAIRED_HEADER.is_match(line)
        // A bare CJK line is just as likely a school or company name (清华大学)
        || (short && is_cjk_only(line) && mentions_any_label(line))
        || (short && is_exact_label(line))
}

/// Find the body of a section, or `None` when it is absent or empty.
pub fn find_section(text: &str, kind: SectionKind) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();

    let start = lines.iter().position(|l| kind.is_mentioned_in(l.trim()))?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| looks_like_header(l.trim()))
        .map_or(lines.len(), |offset| start + 1 + offset);

    let body = &lines[start + 1..end];
    let mut section = body.join("\n");

    // A repeated label on the first body line is not content
    if body.len() > 1 && kind.is_mentioned_in(body[0]) {
        let rest = body[1..].join("\n").trim().to_string();
        if !rest.is_empty() {
            section = rest;
        }
    }

    if section.trim().is_empty() {
        log::debug!("Section '{}' has an empty body", kind);
        return None;
    }
    Some(section)
}

/// Non-empty trimmed lines of a section body.
pub fn body_lines(section: &str) -> Vec<&str> {
    section
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}
