use crate::domain::constants::CLEAN_RECORD_LABEL;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Citizen,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Citizen => "citizen",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "citizen" => Ok(Role::Citizen),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// Authenticated identity held client-side.
///
/// A role is only carried together with a token; constructing a session
/// without a token always drops the role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    role: Option<Role>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: impl Into<String>, role: Role) -> Self {
        Self::from_parts(Some(token.into()), Some(role))
    }

    pub fn from_parts(token: Option<String>, role: Option<Role>) -> Self {
        match token {
            Some(t) if !t.is_empty() => Self {
                token: Some(t),
                role,
            },
            _ => Self::anonymous(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Screening decision as emitted by the backend. Both the long labels used by
/// the scoring worker and the short forms are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[serde(rename = "Under Review", alias = "UnderReview")]
    UnderReview,
    #[serde(
        rename = "Yellow: Manual Audit",
        alias = "Manual Audit",
        alias = "ManualAudit"
    )]
    ManualAudit,
    #[serde(rename = "Red: Blocked", alias = "Blocked")]
    Blocked,
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Under Investigation", alias = "UnderInvestigation")]
    UnderInvestigation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Warning,
    Safe,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Safe => "SAFE",
        }
    }
}

impl ApplicationStatus {
    pub fn severity(self) -> Severity {
        match self {
            ApplicationStatus::Blocked => Severity::Critical,
            ApplicationStatus::ManualAudit => Severity::Warning,
            ApplicationStatus::UnderReview
            | ApplicationStatus::Approved
            | ApplicationStatus::UnderInvestigation => Severity::Safe,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: i64,
    #[serde(rename = "user_id")]
    pub citizen_id: String,
    #[serde(rename = "pan_number", default)]
    pub pan: Option<String>,
    #[serde(
        rename = "target_bank_account",
        default,
        deserialize_with = "null_as_default"
    )]
    pub bank_account: String,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub fraud_score: f64,
    #[serde(default)]
    pub flag_reason: Option<String>,
    /// Year label (e.g. `2024-2025`) to declared income.
    #[serde(default, deserialize_with = "null_as_default")]
    pub yearly_incomes: BTreeMap<String, f64>,
    #[serde(default, alias = "calculated_pan_income")]
    pub average_income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ApplicationRecord {
    pub fn severity(&self) -> Severity {
        self.status.severity()
    }

    pub fn flag_label(&self) -> &str {
        match self.flag_reason.as_deref() {
            Some(r) if !r.is_empty() => r,
            _ => CLEAN_RECORD_LABEL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    #[serde(rename = "total_applications")]
    pub total: u64,
    #[serde(rename = "real_applications")]
    pub clean: u64,
    #[serde(rename = "fake_applications")]
    pub blocked: u64,
    #[serde(rename = "funds_saved")]
    pub capital_preserved: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreatCategory {
    pub category: String,
    pub count: u64,
}

/// One applied result of the live feed, tagged with the sequence number of the
/// fetch that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub sequence: u64,
    pub search: String,
    pub records: Vec<ApplicationRecord>,
    pub stats: Option<AggregateStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threats: Option<Vec<ThreatCategory>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ActionKind {
    #[serde(rename = "approve")]
    Approve,
    #[serde(rename = "force_approve")]
    #[value(name = "force-approve")]
    ForceApprove,
    #[serde(rename = "flag_rbi")]
    #[value(name = "flag", alias = "flag-for-investigation")]
    FlagForInvestigation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionCommand {
    pub target_id: i64,
    pub kind: ActionKind,
}

#[derive(Serialize)]
pub struct ActionRequest {
    pub action: ActionKind,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Home,
    Threats,
    Pipeline,
    Login,
    Signup,
    Apply,
    Analytics,
    Dashboard,
    Citizens,
    Status,
}

impl View {
    pub fn path(self) -> &'static str {
        match self {
            View::Home => "/",
            View::Threats => "/threats",
            View::Pipeline => "/pipeline",
            View::Login => "/login",
            View::Signup => "/signup",
            View::Apply => "/apply",
            View::Analytics => "/analytics",
            View::Dashboard => "/dashboard",
            View::Citizens => "/citizens",
            View::Status => "/status",
        }
    }

    /// Where a freshly logged-in account lands.
    pub fn landing_for(role: Role) -> View {
        match role {
            Role::Admin => View::Dashboard,
            Role::Citizen => View::Apply,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginGrant {
    pub access_token: String,
    pub role: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSubmission {
    pub pan_number: String,
    pub target_bank_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct MyApplicationEnvelope {
    #[serde(default)]
    pub data: Option<ApplicationRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct SessionReport {
    pub authenticated: bool,
    pub role: Option<Role>,
}

#[derive(Serialize)]
pub struct LoginReport {
    pub username: String,
    pub role: Role,
    pub landing: View,
}

#[derive(Serialize)]
pub struct AuthorizeReport {
    pub view: View,
    pub required_role: Option<Role>,
    pub decision: String,
    pub redirect: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub name: String,
    pub path: String,
}

#[derive(Serialize)]
pub struct ActionReport {
    pub target_id: i64,
    pub action: ActionKind,
    pub ack: ActionAck,
    pub record: Option<ApplicationRecord>,
}
