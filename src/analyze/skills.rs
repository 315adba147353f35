//! Skill list extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest entry accepted from a skills section, exclusive.
const MAX_SKILL_CHARS: usize = 50;

/// Technologies recognized anywhere in the text when there is no skills
/// section.
pub const SKILL_VOCABULARY: &[&str] = &[
    "JavaScript", "TypeScript", "Python", "Java", "PHP", "Ruby", "Swift",
    "React", "Vue", "Angular", "Node.js", "Express", "Django", "Flask", "Spring",
    "HTML", "CSS", "SASS", "LESS", "Bootstrap", "Tailwind",
    "SQL", "MySQL", "PostgreSQL", "MongoDB", "Redis", "Oracle",
    "AWS", "Azure", "GCP", "Docker", "Kubernetes", "CI/CD",
    "Git", "SVN", "Agile", "Scrum", "Jira", "TDD", "BDD",
];

/// Names that a word boundary can't delimit; matched as substrings.
const SYMBOL_SKILLS: &[&str] = &["C++", "C#"];

static SKILL_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,，、;；\s]+").unwrap());

static VOCABULARY_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    SKILL_VOCABULARY
        .iter()
        .map(|skill| {
            // ASCII boundaries, so "熟悉Java和Python" still matches.
            let pattern = format!(r"(?i)(?-u:\b){}(?-u:\b)", regex::escape(skill));
            (*skill, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Split the body of a skills section into entries.
pub fn split_skill_list(section: &str) -> Vec<String> {
    SKILL_SEPARATOR
        .split(section)
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.chars().count() < MAX_SKILL_CHARS)
        .map(str::to_string)
        .collect()
}

/// Known technologies mentioned anywhere in `text`, in vocabulary order.
pub fn scan_known_skills(text: &str) -> Vec<String> {
    let mut found: Vec<String> = VOCABULARY_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(skill, _)| skill.to_string())
        .collect();

    found.extend(
        SYMBOL_SKILLS
            .iter()
            .filter(|s| text.contains(**s))
            .map(|s| s.to_string()),
    );
    found
}
