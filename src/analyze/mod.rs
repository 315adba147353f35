//! Résumé field analysis.
//!
//! [`analyze_resume_text`] turns extracted text into a [`ResumeRecord`]
//! using line-shape heuristics, labeled sections and a few regular
//! expressions. It is pure and deterministic: the same text always yields
//! the same record, and no input makes it fail.
//!
//! # Example
//!
//! ```
//! use unresume::analyze::analyze_resume_text;
//!
//! let record = analyze_resume_text("Alice Chen\nBackend Engineer\nalice@example.com");
//! assert_eq!(record.name, "Alice Chen");
//! assert_eq!(record.title, "Backend Engineer");
//! assert_eq!(record.contact.email, "alice@example.com");
//! ```

mod contact;
mod entries;
mod sections;
mod skills;

pub use contact::{extract_contact, find_email, find_github, find_phone, find_website};
pub use entries::{
    certificate_list, education_entry, experience_entry, find_date_range, project_entry,
};
pub use sections::{find_section, looks_like_header, SectionKind};
pub use skills::{scan_known_skills, split_skill_list, SKILL_VOCABULARY};

use crate::model::ResumeRecord;

/// Most skills kept on a record.
pub const MAX_SKILLS: usize = 10;

/// Names are shorter than this.
const MAX_NAME_CHARS: usize = 30;

/// Titles are shorter than this.
const MAX_TITLE_CHARS: usize = 50;

/// Title candidates are taken from lines 2 to 5.
const TITLE_SEARCH_LINES: usize = 5;

const CONTACT_KEYWORDS: &[&str] = &["联系", "电话", "邮箱", "contact", "phone", "email"];

fn has_contact_punctuation(line: &str) -> bool {
    line.contains(['@', ':', '/', '(', ')'])
}

fn is_name_like(line: &str) -> bool {
    line.chars().count() < MAX_NAME_CHARS && !has_contact_punctuation(line)
}

fn is_title_like(line: &str) -> bool {
    let lower = line.to_lowercase();
    line.chars().count() < MAX_TITLE_CHARS
        && !has_contact_punctuation(line)
        && !CONTACT_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn content_lines(text: &str) -> Vec<&str> {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// The candidate's name: the first or second line, if it looks like one.
pub fn extract_name(text: &str) -> String {
    content_lines(text)
        .into_iter()
        .take(2)
        .find(|l| is_name_like(l))
        .unwrap_or_default()
        .to_string()
}

/// The job title: the first short line after the name that isn't contact
/// information.
pub fn extract_title(text: &str, name: &str) -> String {
    content_lines(text)
        .into_iter()
        .skip(1)
        .take(TITLE_SEARCH_LINES - 1)
        .find(|l| is_title_like(l) && *l != name)
        .unwrap_or_default()
        .to_string()
}

/// Skills from the skills section, or from the known vocabulary when the
/// résumé has none. Not capped.
pub fn extract_skills(text: &str) -> Vec<String> {
    match find_section(text, SectionKind::Skills) {
        Some(section) => split_skill_list(&section),
        None => scan_known_skills(text),
    }
}

/// Analyze résumé text into a structured record.
pub fn analyze_resume_text(text: &str) -> ResumeRecord {
    if text.trim().is_empty() {
        return ResumeRecord::new();
    }

    let name = extract_name(text);
    let title = extract_title(text, &name);

    let mut skills = extract_skills(text);
    skills.truncate(MAX_SKILLS);

    let section = |kind| find_section(text, kind);

    let record = ResumeRecord {
        title,
        summary: section(SectionKind::Summary)
            .and_then(|s| s.lines().map(str::trim).find(|l| !l.is_empty()).map(str::to_string))
            .unwrap_or_default(),
        contact: extract_contact(text),
        skills,
        education: section(SectionKind::Education)
            .and_then(|s| education_entry(&s))
            .into_iter()
            .collect(),
        experience: section(SectionKind::Experience)
            .and_then(|s| experience_entry(&s))
            .into_iter()
            .collect(),
        projects: section(SectionKind::Projects)
            .and_then(|s| project_entry(&s))
            .into_iter()
            .collect(),
        certificates: section(SectionKind::Certificates)
            .map(|s| certificate_list(&s))
            .unwrap_or_default(),
        name,
    };

    log::debug!(
        "Analyzed résumé: {} fields populated, {} skills",
        record.populated_fields(),
        record.skills.len()
    );
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EducationEntry;

    #[test]
    fn test_end_to_end_chinese_resume() {
        let text = "张三\n软件工程师\n技能\nJava, Python, React\n教育\n清华大学\n学士";
        let record = analyze_resume_text(text);

        assert_eq!(record.name, "张三");
        assert_eq!(record.title, "软件工程师");
        assert_eq!(record.skills, vec!["Java", "Python", "React"]);
        assert_eq!(
            record.education,
            vec![EducationEntry {
                school: "清华大学".into(),
                degree: "学士".into(),
                ..Default::default()
            }]
        );
        assert!(record.experience.is_empty());
        assert!(record.contact.is_empty());
    }

    #[test]
    fn test_empty_text_gives_empty_record() {
        assert!(analyze_resume_text("").is_empty());
        assert!(analyze_resume_text(" \n\t ").is_empty());
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let text = "Li Wei\nData Engineer\nli@example.com\nSkills\nSpark, Kafka\nWORK EXPERIENCE";
        assert_eq!(analyze_resume_text(text), analyze_resume_text(text));
    }

    #[test]
    fn test_name_falls_back_to_second_line() {
        let text = "Email: li@example.com\nLi Wei\nData Engineer";
        assert_eq!(extract_name(text), "Li Wei");
        assert_eq!(extract_title(text, "Li Wei"), "Data Engineer");
    }

    #[test]
    fn test_title_skips_contact_lines() {
        let text = "王五\n联系电话 13812345678\n产品经理";
        let record = analyze_resume_text(text);
        assert_eq!(record.title, "产品经理");
        assert_eq!(record.contact.phone, "13812345678");
    }

    #[test]
    fn test_skills_are_capped() {
        let text = "Bob\nSkills\na, b, c, d, e, f, g, h, i, j, k, l";
        let record = analyze_resume_text(text);
        assert_eq!(record.skills.len(), MAX_SKILLS);
        assert_eq!(record.skills[0], "a");
        // The uncapped list is still available
        assert_eq!(extract_skills(text).len(), 12);
    }

    #[test]
    fn test_vocabulary_fallback() {
        let record = analyze_resume_text("Bob\nBuilt services with Rust, Docker and PostgreSQL");
        assert_eq!(record.skills, vec!["PostgreSQL", "Docker"]);
    }

    #[test]
    fn test_full_english_resume() {
        let text = "\
Alice Chen
Senior Backend Engineer
alice@example.com | https://alice.dev | github.com/alice
Summary
Engineer who likes distributed systems.
Experience
ACME Corp
Staff Engineer
2019.03 - Present
Led the storage team.
Projects
Tiny KV
An embedded key-value store.
Certifications
AWS Solutions Architect
";
        let record = analyze_resume_text(text);
        assert_eq!(record.name, "Alice Chen");
        assert_eq!(record.title, "Senior Backend Engineer");
        assert_eq!(record.summary, "Engineer who likes distributed systems.");
        assert_eq!(record.contact.website, "https://alice.dev");
        assert_eq!(record.contact.github, "https://github.com/alice");

        let job = &record.experience[0];
        assert_eq!(job.company, "ACME Corp");
        assert_eq!(job.position, "Staff Engineer");
        assert_eq!(job.start_date, "2019.03");
        assert_eq!(job.end_date, "Present");

        assert_eq!(record.projects[0].name, "Tiny KV");
        assert_eq!(record.certificates, vec!["AWS Solutions Architect"]);
    }
}
