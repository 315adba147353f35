//! Education, experience and project entries.
//!
//! Each section yields at most one entry: the first two lines name it and
//! the rest becomes its description.

use once_cell::sync::Lazy;
use regex::Regex;

use super::sections::body_lines;
use crate::model::{EducationEntry, ExperienceEntry, ProjectEntry};

/// `2018.09 - 2022.06`, `2019年3月 至 至今`, `2020/01 ~ Present`.
static DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d{4})\s*[.\-/年]\s*(\d{1,2})月?\s*(?:[-–—~～至到]|to)\s*(?:(\d{4})\s*[.\-/年]\s*(\d{1,2})月?|(至今|present|now))",
    )
    .unwrap()
});

/// First date range in `text` as `(start, end)`.
///
/// Dates are normalized to `YYYY.MM`; an open end keeps its original word.
pub fn find_date_range(text: &str) -> Option<(String, String)> {
    let caps = DATE_RANGE.captures(text)?;
    let start = format_month(&caps[1], &caps[2]);
    let end = match (caps.get(3), caps.get(4), caps.get(5)) {
        (Some(year), Some(month), _) => format_month(year.as_str(), month.as_str()),
        (_, _, Some(open)) => open.as_str().to_string(),
        _ => return None,
    };
    Some((start, end))
}

fn format_month(year: &str, month: &str) -> String {
    match month.parse::<u8>() {
        Ok(m) => format!("{}.{:02}", year, m),
        Err(_) => format!("{}.{}", year, month),
    }
}

fn split_dates(section: &str) -> (String, String) {
    find_date_range(section).unwrap_or_default()
}

/// Build an education entry from a section body of at least two lines.
pub fn education_entry(section: &str) -> Option<EducationEntry> {
    let lines = body_lines(section);
    if lines.len() < 2 {
        return None;
    }
    let (start_date, end_date) = split_dates(section);
    Some(EducationEntry {
        school: lines[0].to_string(),
        degree: lines[1].to_string(),
        start_date,
        end_date,
        description: lines[2..].join("\n"),
    })
}

/// Build an experience entry from a section body of at least two lines.
pub fn experience_entry(section: &str) -> Option<ExperienceEntry> {
    let lines = body_lines(section);
    if lines.len() < 2 {
        return None;
    }
    let (start_date, end_date) = split_dates(section);
    Some(ExperienceEntry {
        company: lines[0].to_string(),
        position: lines[1].to_string(),
        start_date,
        end_date,
        description: lines[2..].join("\n"),
    })
}

/// Build a project entry from a non-empty section body.
pub fn project_entry(section: &str) -> Option<ProjectEntry> {
    let lines = body_lines(section);
    let (name, rest) = lines.split_first()?;
    Some(ProjectEntry {
        name: name.to_string(),
        description: rest.join("\n"),
        ..Default::default()
    })
}

/// Non-empty lines of a certificates section.
pub fn certificate_list(section: &str) -> Vec<String> {
    body_lines(section).into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_forms() {
        assert_eq!(
            find_date_range("2018.9 - 2022.06"),
            Some(("2018.09".into(), "2022.06".into()))
        );
        assert_eq!(
            find_date_range("2019年3月 至 至今"),
            Some(("2019.03".into(), "至今".into()))
        );
        assert_eq!(
            find_date_range("Jan: 2020/01 ~ Present"),
            Some(("2020.01".into(), "Present".into()))
        );
        assert_eq!(find_date_range("since 2020"), None);
    }

    #[test]
    fn test_education_entry() {
        let entry = education_entry("北京大学\n计算机硕士\n2018.09-2021.06\n导师：王教授").unwrap();
        assert_eq!(entry.school, "北京大学");
        assert_eq!(entry.degree, "计算机硕士");
        assert_eq!(entry.start_date, "2018.09");
        assert_eq!(entry.end_date, "2021.06");
        assert_eq!(entry.description, "2018.09-2021.06\n导师：王教授");
    }

    #[test]
    fn test_single_line_sections() {
        assert!(education_entry("Tsinghua").is_none());
        assert!(experience_entry("ACME").is_none());
        let project = project_entry("Search engine").unwrap();
        assert_eq!(project.name, "Search engine");
        assert!(project.description.is_empty());
    }

    #[test]
    fn test_experience_without_dates() {
        let entry = experience_entry("ACME Corp\nBackend Engineer").unwrap();
        assert_eq!(entry.company, "ACME Corp");
        assert_eq!(entry.position, "Backend Engineer");
        assert!(entry.start_date.is_empty() && entry.end_date.is_empty());
    }

    #[test]
    fn test_certificate_list() {
        assert_eq!(certificate_list("CET-6\n\n PMP "), vec!["CET-6", "PMP"]);
    }
}
