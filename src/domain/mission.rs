use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub difficulty: MissionDifficulty,
    pub points: i64,
    pub category_id: Option<Uuid>,
    pub requires_photo: bool,
    pub requires_description: bool,
    pub requires_file: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissionDifficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl MissionDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionDifficulty::Easy => "easy",
            MissionDifficulty::Medium => "medium",
            MissionDifficulty::Hard => "hard",
            MissionDifficulty::Expert => "expert",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(MissionDifficulty::Easy),
            "medium" => Some(MissionDifficulty::Medium),
            "hard" => Some(MissionDifficulty::Hard),
            "expert" => Some(MissionDifficulty::Expert),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMissionRequest {
    pub title: String,
    pub description: String,
    pub difficulty: MissionDifficulty,
    pub points: i64,
    pub category_id: Option<Uuid>,
    pub requires_photo: bool,
    pub requires_description: bool,
    pub requires_file: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionSubmission {
    pub id: Uuid,
    pub mission_id: Uuid,
    pub team_id: Uuid,
    pub submitted_by: Uuid,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub file_url: Option<String>,
    pub status: SubmissionStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Submission lifecycle: `Pending -> Approved` or `Pending -> Rejected`.
/// Both outcomes are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(SubmissionStatus::Pending),
            "approved" => Some(SubmissionStatus::Approved),
            "rejected" => Some(SubmissionStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }
}

/// Outcome chosen by a reviewer. Only terminal states are expressible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn status(&self) -> SubmissionStatus {
        match self {
            ReviewDecision::Approved => SubmissionStatus::Approved,
            ReviewDecision::Rejected => SubmissionStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSubmissionRequest {
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub file_url: Option<String>,
}

impl CreateSubmissionRequest {
    /// Check the proof a mission asks for is present.
    pub fn check_requirements(&self, mission: &Mission) -> Result<(), &'static str> {
        let present = |v: &Option<String>| v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);

        if mission.requires_photo && !present(&self.photo_url) {
            return Err("Photo is required for this mission");
        }
        if mission.requires_file && !present(&self.file_url) {
            return Err("File is required for this mission");
        }
        if mission.requires_description && !present(&self.description) {
            return Err("Description is required for this mission");
        }
        Ok(())
    }
}
