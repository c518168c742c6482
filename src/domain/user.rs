use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub school_id: Option<Uuid>,
    pub is_active: bool,
    pub is_verified: bool,
    pub avatar_url: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "student" => Some(UserRole::Student),
            "teacher" => Some(UserRole::Teacher),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Capabilities held by each role. This is the only place role names
    /// turn into permissions.
    pub fn grants(&self, capability: Capability) -> bool {
        match (self, capability) {
            (UserRole::Student, Capability::SubmitMissions) => true,
            (UserRole::Student, Capability::ManageTeams) => true,
            (UserRole::Teacher, Capability::ReviewSubmissions) => true,
            (UserRole::Admin, Capability::ReviewSubmissions) => true,
            (UserRole::Admin, Capability::ManageTeams) => true,
            (UserRole::Admin, Capability::ManagePlatform) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SubmitMissions,
    ReviewSubmissions,
    ManageTeams,
    ManagePlatform,
}

impl Capability {
    pub fn describe(&self) -> &'static str {
        match self {
            Capability::SubmitMissions => "Only students can submit missions",
            Capability::ReviewSubmissions => "Only teachers and admins can review submissions",
            Capability::ManageTeams => "Insufficient permissions to manage teams",
            Capability::ManagePlatform => "Admin access required",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub password: String,
    pub role: UserRole,
    pub school_id: Option<Uuid>,
}
