//! The structured resume document — the single data model flowing through
//! structuring, chat editing, and rendering.
//!
//! Every field defaults to an empty string/list/map. Absence of information is
//! represented by emptiness, never by dropping the field, so any snapshot can
//! be serialized and re-validated without losing shape. Edits always replace
//! the whole snapshot; nothing patches a `Resume` in place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Contact block at the top of the resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub portfolio: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub major: String,
    pub grad: String,
    /// Kept as text: values like "3.8" and "Pass" are both legal. The renderer
    /// decides visibility (numeric >= 3.5, or non-numeric shown verbatim).
    pub gpa: String,
    pub coursework: Vec<String>,
}

/// Skills aggregate: four flat categories plus free-form named groups
/// ("Cloud", "Databases", ...) that the user can create through chat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub tools: Vec<String>,
    pub concepts: Vec<String>,
    pub groups: BTreeMap<String, Vec<String>>,
}

impl Skills {
    pub fn is_empty(&self) -> bool {
        self.languages.iter().all(|s| s.trim().is_empty())
            && self.frameworks.iter().all(|s| s.trim().is_empty())
            && self.tools.iter().all(|s| s.trim().is_empty())
            && self.concepts.iter().all(|s| s.trim().is_empty())
            && self
                .groups
                .values()
                .all(|items| items.iter().all(|s| s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleEntry {
    pub company: String,
    pub location: String,
    pub role: String,
    pub start: String,
    pub end: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectEntry {
    pub name: String,
    pub link: String,
    pub stack: Vec<String>,
    pub start: String,
    pub end: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadershipEntry {
    pub org: String,
    pub title: String,
    pub start: String,
    pub end: String,
    pub bullets: Vec<String>,
}

/// The full resume document. Immutable from the pipeline's perspective:
/// every accepted edit produces a complete new snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resume {
    pub header: Header,
    pub education: Vec<EducationEntry>,
    pub skills: Skills,
    pub experience: Vec<RoleEntry>,
    pub projects: Vec<ProjectEntry>,
    pub leadership: Vec<LeadershipEntry>,
    pub awards: Vec<String>,
}
