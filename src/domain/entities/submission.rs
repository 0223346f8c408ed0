use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;

const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Contact,
    Onboarding,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::Contact => "contact",
            SubmissionKind::Onboarding => "onboarding",
        }
    }
}

impl FromStr for SubmissionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact" => Ok(SubmissionKind::Contact),
            "onboarding" => Ok(SubmissionKind::Onboarding),
            other => Err(AppError::InvalidInput(format!("Invalid submission kind: {}", other))),
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    New,
    Contacted,
    Closed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::New => "new",
            SubmissionStatus::Contacted => "contacted",
            SubmissionStatus::Closed => "closed",
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(SubmissionStatus::New),
            "contacted" => Ok(SubmissionStatus::Contacted),
            "closed" => Ok(SubmissionStatus::Closed),
            other => Err(AppError::InvalidInput(format!("Invalid submission status: {}", other))),
        }
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub kind: String,
    pub status: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub details: Json<JsonValue>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub kind: SubmissionKind,
    pub status: SubmissionStatus,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub details: JsonValue,
    #[serde(skip_serializing)]
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = AppError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse()
            .map_err(|_| AppError::InternalError(format!("Corrupt submission kind '{}'", row.kind)))?;
        let status = row
            .status
            .parse()
            .map_err(|_| AppError::InternalError(format!("Corrupt submission status '{}'", row.status)))?;

        Ok(Submission {
            id: row.id,
            kind,
            status,
            name: row.name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            subject: row.subject,
            message: row.message,
            details: row.details.0,
            ip_address: row.ip_address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A validated submission ready to be written.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub kind: SubmissionKind,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub details: JsonValue,
    pub ip_address: Option<String>,
}

// ───── Input & Validation Requests ──────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(max = 30, message = "Phone number is too long"))]
    pub phone: Option<String>,

    #[validate(length(max = 120, message = "Company name is too long"))]
    pub company: Option<String>,

    #[validate(length(max = 150, message = "Subject is too long"))]
    pub subject: Option<String>,

    #[validate(length(min = 10, max = 5000, message = "Message must be between 10 and 5000 characters"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    #[validate(length(min = 2, max = 120, message = "Business name must be between 2 and 120 characters"))]
    pub business_name: String,

    #[validate(length(min = 2, max = 100, message = "Contact name must be between 2 and 100 characters"))]
    pub contact_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(max = 30, message = "Phone number is too long"))]
    pub phone: Option<String>,

    #[validate(length(min = 2, max = 60, message = "Business type must be between 2 and 60 characters"))]
    pub business_type: String,

    #[validate(range(min = 1, max = 10_000, message = "Locations must be between 1 and 10000"))]
    pub locations: Option<u32>,

    #[validate(range(max = 10_000_000, message = "Monthly customers is out of range"))]
    pub monthly_customers: Option<u64>,

    #[validate(length(max = 5000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ContactFormRequest {
    pub fn into_new_submission(self, ip_address: Option<String>) -> NewSubmission {
        NewSubmission {
            kind: SubmissionKind::Contact,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: non_blank(self.phone),
            company: non_blank(self.company),
            subject: non_blank(self.subject),
            message: Some(self.message.trim().to_string()),
            details: JsonValue::Object(Default::default()),
            ip_address,
        }
    }
}

impl OnboardingRequest {
    pub fn into_new_submission(self, ip_address: Option<String>) -> NewSubmission {
        let details = serde_json::json!({
            "businessType": self.business_type.trim(),
            "locations": self.locations,
            "monthlyCustomers": self.monthly_customers,
        });

        NewSubmission {
            kind: SubmissionKind::Onboarding,
            name: self.contact_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: non_blank(self.phone),
            company: Some(self.business_name.trim().to_string()),
            subject: None,
            message: non_blank(self.notes),
            details,
            ip_address,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubmissionStatusRequest {
    pub status: SubmissionStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmissionListQuery {
    pub kind: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub kind: Option<SubmissionKind>,
    pub status: Option<SubmissionStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl TryFrom<SubmissionListQuery> for SubmissionFilter {
    type Error = AppError;

    fn try_from(query: SubmissionListQuery) -> Result<Self, Self::Error> {
        Ok(SubmissionFilter {
            kind: query.kind.as_deref().map(str::parse::<SubmissionKind>).transpose()?,
            status: query.status.as_deref().map(str::parse::<SubmissionStatus>).transpose()?,
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: query.offset.unwrap_or(0).max(0),
        })
    }
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmissionCreatedResponse {
    pub success: bool,
    pub id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionListResponse {
    pub submissions: Vec<Submission>,
    pub pagination: super::Pagination,
}

#[derive(Debug, Default, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStats {
    pub total: i64,
    pub new: i64,
    pub contact: i64,
    pub onboarding: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onboarding_answers_land_in_details() {
        let request = OnboardingRequest {
            business_name: " Dubai Café ".into(),
            contact_name: "Amira".into(),
            email: "Amira@Example.com".into(),
            phone: Some("  ".into()),
            business_type: "restaurant".into(),
            locations: Some(3),
            monthly_customers: Some(1200),
            notes: None,
        };

        let new = request.into_new_submission(Some("10.0.0.9".into()));
        assert_eq!(new.kind, SubmissionKind::Onboarding);
        assert_eq!(new.company.as_deref(), Some("Dubai Café"));
        assert_eq!(new.email, "amira@example.com");
        assert_eq!(new.phone, None);
        assert_eq!(new.details["businessType"], "restaurant");
        assert_eq!(new.details["locations"], 3);
    }

    #[test]
    fn list_query_rejects_unknown_status() {
        let query = SubmissionListQuery { status: Some("spam".into()), ..Default::default() };
        assert!(SubmissionFilter::try_from(query).is_err());
    }

    #[test]
    fn list_query_clamps_paging() {
        let query = SubmissionListQuery { limit: Some(1000), offset: Some(-3), ..Default::default() };
        let filter = SubmissionFilter::try_from(query).unwrap();
        assert_eq!(filter.limit, 100);
        assert_eq!(filter.offset, 0);
    }
}
