//! Structured résumé record types.

use serde::{Deserialize, Serialize};

/// Contact fields found anywhere in the résumé text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub phone: String,
    pub website: String,
    pub github: String,
}

impl Contact {
    /// Check if no contact field was found.
    pub fn is_empty(&self) -> bool {
        self.email.is_empty()
            && self.phone.is_empty()
            && self.website.is_empty()
            && self.github.is_empty()
    }
}

/// One education entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

/// One work-experience entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

/// One project entry.
///
/// Only `name` and `description` are filled by the analyzer; the remaining
/// fields exist for the editor to complete by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub name: String,
    pub development_cycle: String,
    pub project_scale: String,
    pub frontend_tech: String,
    pub backend_tech: String,
    pub tools: String,
    pub description: String,
}

/// The structured résumé produced by the field analyzer.
///
/// Every field defaults to empty. The pipeline treats a record as a value:
/// once built it is handed to the caller and never mutated again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub name: String,
    pub title: String,
    pub summary: String,
    pub contact: Contact,
    pub skills: Vec<String>,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub projects: Vec<ProjectEntry>,
    pub certificates: Vec<String>,
}

impl ResumeRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the analyzer found nothing at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.title.is_empty()
            && self.summary.is_empty()
            && self.contact.is_empty()
            && self.skills.is_empty()
            && self.education.is_empty()
            && self.experience.is_empty()
            && self.projects.is_empty()
            && self.certificates.is_empty()
    }

    /// Number of populated top-level fields, for quick quality reporting.
    pub fn populated_fields(&self) -> usize {
        [
            !self.name.is_empty(),
            !self.title.is_empty(),
            !self.summary.is_empty(),
            !self.contact.email.is_empty(),
            !self.contact.phone.is_empty(),
            !self.contact.website.is_empty(),
            !self.contact.github.is_empty(),
            !self.skills.is_empty(),
            !self.education.is_empty(),
            !self.experience.is_empty(),
            !self.projects.is_empty(),
            !self.certificates.is_empty(),
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}
