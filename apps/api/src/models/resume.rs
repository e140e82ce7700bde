use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured resume record produced by extraction and stored in session state.
///
/// Every scalar is optional and every list defaults to empty, so partially
/// extracted resumes still deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeData {
    pub basics: Basics,
    pub experience: Vec<ExperienceItem>,
    pub education: Vec<EducationItem>,
    /// Skill category → skills, e.g. "Programming Languages" → ["Rust", "Go"].
    pub skills: BTreeMap<String, Vec<String>>,
    pub certifications: Vec<String>,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Basics {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceItem {
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationItem {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_record_deserializes_with_defaults() {
        let json = r#"{
            "basics": {"name": "Ada Lovelace"},
            "skills": {"Programming Languages": ["Rust"]}
        }"#;
        let data: ResumeData = serde_json::from_str(json).unwrap();
        assert_eq!(data.basics.name.as_deref(), Some("Ada Lovelace"));
        assert!(data.basics.email.is_none());
        assert!(data.experience.is_empty());
        assert_eq!(data.skills["Programming Languages"], vec!["Rust".to_string()]);
    }

    #[test]
    fn test_null_lists_are_rejected() {
        // The model must use [] for missing lists; null is a malformed response.
        let json = r#"{"experience": null}"#;
        assert!(serde_json::from_str::<ResumeData>(json).is_err());
    }
}
