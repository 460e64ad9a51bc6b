//! Backend REST client.
//!
//! Every call except login/signup carries `Authorization: Bearer <token>` when
//! the client was built from an authenticated session.

use crate::domain::models::{
    ActionAck, ActionCommand, ActionRequest, AggregateStats, ApplicationRecord,
    ApplicationSubmission, LoginGrant, MyApplicationEnvelope, RegisteredUser, Session,
    SignupRequest, SubmissionReceipt, ThreatCategory,
};
use crate::services::dispatch::ActionSink;
use crate::services::feed::{FeedMode, FeedPage, FeedQuery, FeedSource};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Login or signup rejected by the backend; carries the user-facing detail.
    #[error("{0}")]
    AuthFailure(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP 401/403 on an authenticated call. Handled like any other failure.
    #[error("unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("backend returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_session(mut self, session: &Session) -> Self {
        self.token = session.token().map(str::to_string);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, rb: RequestBuilder) -> Result<T, ApiError> {
        let resp = checked(self.authed(rb).send().await?).await?;
        decode(resp).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginGrant, ApiError> {
        let resp = self
            .http
            .post(self.url("/api/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        if !resp.status().is_success() {
            let detail = error_detail(resp).await;
            return Err(ApiError::AuthFailure(
                detail.unwrap_or_else(|| "Login failed".to_string()),
            ));
        }
        decode(resp).await
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<(), ApiError> {
        let resp = self
            .http
            .post(self.url("/api/signup"))
            .json(request)
            .send()
            .await?;
        if !resp.status().is_success() {
            let detail = error_detail(resp).await;
            return Err(ApiError::AuthFailure(
                detail.unwrap_or_else(|| "Signup failed".to_string()),
            ));
        }
        Ok(())
    }

    pub async fn submit_application(
        &self,
        submission: &ApplicationSubmission,
    ) -> Result<SubmissionReceipt, ApiError> {
        self.send_json(self.http.post(self.url("/api/apply")).json(submission))
            .await
    }

    pub async fn my_application(&self) -> Result<Option<ApplicationRecord>, ApiError> {
        let envelope: MyApplicationEnvelope = self
            .send_json(self.http.get(self.url("/api/my-application")))
            .await?;
        Ok(envelope.data)
    }

    pub async fn list_applications(&self, search: &str) -> Result<Vec<ApplicationRecord>, ApiError> {
        let mut rb = self.http.get(self.url("/api/applications"));
        if !search.is_empty() {
            rb = rb.query(&[("user_id", search)]);
        }
        self.send_json(rb).await
    }

    pub async fn stats(&self) -> Result<AggregateStats, ApiError> {
        self.send_json(self.http.get(self.url("/api/stats"))).await
    }

    pub async fn threat_analytics(&self) -> Result<Vec<ThreatCategory>, ApiError> {
        self.send_json(self.http.get(self.url("/api/threat-analytics")))
            .await
    }

    pub async fn apply_action(&self, command: &ActionCommand) -> Result<ActionAck, ApiError> {
        let path = format!("/api/applications/{}/action", command.target_id);
        let rb = self.http.post(self.url(&path)).json(&ActionRequest {
            action: command.kind,
        });
        let resp = checked(self.authed(rb).send().await?).await?;
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(ActionAck::default());
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn list_users(&self) -> Result<Vec<RegisteredUser>, ApiError> {
        self.send_json(self.http.get(self.url("/api/users"))).await
    }
}

async fn checked(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Unauthorized {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        let detail = error_detail(resp)
            .await
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    Ok(resp)
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// FastAPI answers `{"detail": ...}`; the global handlers answer
/// `{"status":"error","message": ...}`.
async fn error_detail(resp: Response) -> Option<String> {
    let body = resp.text().await.ok()?;
    let value: serde_json::Value = serde_json::from_str(&body).ok()?;
    ["detail", "message"]
        .iter()
        .find_map(|k| value.get(*k).and_then(|v| v.as_str()).map(str::to_string))
}

#[async_trait]
impl FeedSource for ApiClient {
    async fn fetch(&self, query: &FeedQuery) -> Result<FeedPage, ApiError> {
        let records = self.list_applications(&query.search);
        let stats = self.stats();
        match query.mode {
            FeedMode::Applications => {
                let (records, stats) = tokio::try_join!(records, stats)?;
                Ok(FeedPage {
                    records,
                    stats: Some(stats),
                    threats: None,
                })
            }
            FeedMode::Analytics => {
                let (records, stats, threats) =
                    tokio::try_join!(records, stats, self.threat_analytics())?;
                Ok(FeedPage {
                    records,
                    stats: Some(stats),
                    threats: Some(threats),
                })
            }
        }
    }
}

#[async_trait]
impl ActionSink for ApiClient {
    async fn submit(&self, command: &ActionCommand) -> Result<ActionAck, ApiError> {
        self.apply_action(command).await
    }
}
