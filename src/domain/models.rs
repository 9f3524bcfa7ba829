use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
        }
    }
}

/// Authenticated caller of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Owners see their own records; admins see everything.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "account_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    PendingVerification,
    Active,
}

/// Questionnaire categories. Each user owns at most one submission per type.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[sqlx(type_name = "form_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormType {
    ApplicantInfo,
    PassportInfo,
    ContactInfo,
    FamilyInfo,
    EducationInfo,
    WorkHistory,
    TravelHistory,
    MilitaryService,
    SecurityBackground,
}

impl FormType {
    pub const ALL: [FormType; 9] = [
        FormType::ApplicantInfo,
        FormType::PassportInfo,
        FormType::ContactInfo,
        FormType::FamilyInfo,
        FormType::EducationInfo,
        FormType::WorkHistory,
        FormType::TravelHistory,
        FormType::MilitaryService,
        FormType::SecurityBackground,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::ApplicantInfo => "APPLICANT_INFO",
            FormType::PassportInfo => "PASSPORT_INFO",
            FormType::ContactInfo => "CONTACT_INFO",
            FormType::FamilyInfo => "FAMILY_INFO",
            FormType::EducationInfo => "EDUCATION_INFO",
            FormType::WorkHistory => "WORK_HISTORY",
            FormType::TravelHistory => "TRAVEL_HISTORY",
            FormType::MilitaryService => "MILITARY_SERVICE",
            FormType::SecurityBackground => "SECURITY_BACKGROUND",
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase().replace('-', "_");
        FormType::ALL
            .into_iter()
            .find(|ft| ft.as_str() == normalized)
            .ok_or(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "form_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormStatus {
    Draft,
    Submitted,
    UnderReview,
    ChangesRequested,
    Approved,
    Rejected,
}

impl FormStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormStatus::Draft => "DRAFT",
            FormStatus::Submitted => "SUBMITTED",
            FormStatus::UnderReview => "UNDER_REVIEW",
            FormStatus::ChangesRequested => "CHANGES_REQUESTED",
            FormStatus::Approved => "APPROVED",
            FormStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "comment_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentType {
    General,
    AdminFeedback,
    ChangeRequest,
    System,
    EditRequest,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "edit_request_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EditRequestStatus {
    Pending,
    Approved,
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub form_type: FormType,
    pub status: FormStatus,
    pub form_data: serde_json::Value,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FieldComment {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub field_path: Option<String>,
    pub field_label: Option<String>,
    pub content: String,
    pub comment_type: CommentType,
    pub is_pinned: bool,
    pub is_resolved: bool,
    pub edit_request_status: Option<EditRequestStatus>,
    pub decision_reason: Option<String>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AdminInvitation {
    pub id: Uuid,
    pub code_hash: String,
    pub created_by: Option<Uuid>,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BasicApplicantRow {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub nationality: String,
    pub enc_passport_number: String,
    pub phone: String,
    pub updated_at: DateTime<Utc>,
}
