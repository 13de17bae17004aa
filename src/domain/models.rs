use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user task with an optional due date. Owned by the backend; the client
/// only ever holds a cached copy keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_id: Option<String>,
    pub text: String,
    pub is_done: bool,
    pub due_at: Option<DateTime<Utc>>,
    /// When set, only the calendar date of `due_at` is meaningful.
    #[serde(default)]
    pub is_date_only: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewActionItem {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
}

/// Partial update for `PUT /actionitems/:id`. Outer `None` omits the field;
/// `Some(None)` serializes an explicit `null` (clears the due date).
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_date_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
}

impl ActionItemPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.due_at.is_none()
            && self.is_date_only.is_none()
            && self.is_done.is_none()
    }
}

/// A persisted AI condensation plus the action items approved with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub id: String,
    pub original_text: String,
    pub summary_text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorChallenge {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `/auth/login` either returns tokens directly or escalates to 2FA.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub two_factor: Option<TwoFactorChallenge>,
}

impl LoginResponse {
    pub fn into_tokens(self) -> Option<AuthTokens> {
        let access_token = self.access_token?;
        Some(AuthTokens {
            access_token,
            refresh_token: self.refresh_token,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTwoFactorRequest {
    pub user_id: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub phone_number: String,
}

/// `/auth/register` and `/auth/verify-phone` share this envelope: either an
/// `auth` payload, or a pending phone-verification challenge.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    #[serde(default)]
    pub auth: Option<AuthTokens>,
    #[serde(default)]
    pub phone_verification_required: bool,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPhoneRequest {
    pub user_id: String,
    pub code: String,
}

/// Body for `/auth/refresh`. Cookie mode sends an empty object; stored mode
/// sends the persisted refresh token.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RefreshRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Request for the chunked-summary endpoint. Field names are the backend's
/// own PascalCase contract.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerateTasksRequest {
    #[serde(rename = "Input")]
    pub input: String,
    #[serde(rename = "UseMapReduce")]
    pub use_map_reduce: bool,
    #[serde(rename = "Model", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// One AI-proposed task on the wire. `due_at` wins over `suggested_time`
/// when both are present.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTask {
    pub text: String,
    #[serde(default)]
    pub suggested_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_date_only: Option<bool>,
}

impl GeneratedTask {
    pub fn into_proposed(self) -> ProposedTask {
        ProposedTask {
            due_at: self.due_at.or(self.suggested_time),
            is_date_only: self.is_date_only.unwrap_or(false),
            text: self.text,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTasksResponse {
    pub summary: String,
    #[serde(default)]
    pub action_items: Vec<GeneratedTask>,
}

/// A generated task under review: editable, deletable, not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProposedTask {
    pub text: String,
    pub due_at: Option<DateTime<Utc>>,
    pub is_date_only: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryActionItem {
    pub text: String,
    pub due_at: Option<DateTime<Utc>>,
    pub is_date_only: bool,
}

/// Body for `POST /summaries`: the summary plus its approved items, persisted
/// transactionally by the backend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateSummaryRequest {
    pub original_text: String,
    pub summary_text: String,
    pub action_items: Vec<SummaryActionItem>,
}
