use serde::{Deserialize, Serialize};

/// A job application as submitted for scoring, together with the posting it targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationData {
    /// Opaque, echoed back unchanged.
    pub application_id: String,
    pub skills: Vec<String>,
    pub education: Education,
    pub experience: Experience,
    pub projects: Vec<Project>,
    #[serde(rename = "Job")]
    pub job: JobPosting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub highest_level: String,
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    /// Free-form range or bound, e.g. "1-3 years" or "10+ years".
    pub total_years: String,
    #[serde(default)]
    pub current_position: Option<String>,
    #[serde(default)]
    pub achievements: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub requirements: String,
    pub responsibilities: String,
}
