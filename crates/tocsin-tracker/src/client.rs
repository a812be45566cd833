// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Jira REST API (v2).
//!
//! Provides [`JiraClient`], which handles bearer authentication, request
//! timeouts, and mapping of HTTP statuses onto [`TrackerError`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tocsin_config::model::TrackerConfig;
use tocsin_core::types::{CreatedIssue, NewIssue};
use tocsin_core::{TocsinError, TrackerError};
use tracing::{debug, warn};

use crate::types::{CreateIssueResponse, ErrorCollection};

/// Thin typed wrapper over the Jira endpoints the bot uses.
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    config: TrackerConfig,
}

impl JiraClient {
    /// Builds a client from `[tracker]`. Requires `base_url` and `token`.
    pub fn new(config: &TrackerConfig) -> Result<Self, TocsinError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| TocsinError::Config("tracker.base_url is required for Jira".into()))?;
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TocsinError::Config("tracker.token is required for Jira".into()))?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|e| TocsinError::Config(format!("invalid tracker token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TocsinError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            config: config.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Human-facing URL of an issue.
    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.base_url)
    }

    fn api(&self, path: &str) -> String {
        format!("{}/rest/api/2/{path}", self.base_url)
    }

    /// Builds the create-issue body, including the configured custom fields.
    pub fn issue_payload(&self, issue: &NewIssue) -> Value {
        let cfg = &self.config;
        let mut fields = json!({
            "project": { "key": cfg.project_key },
            "summary": issue.summary,
            "description": issue.description,
            "issuetype": { "name": cfg.issue_type },
        });
        let Some(map) = fields.as_object_mut() else {
            unreachable!("json! object literal");
        };
        if let Some(level) = &issue.level {
            map.insert(cfg.level_field.clone(), json!({ "value": level }));
        }
        if let Some(service) = &issue.service {
            map.insert(cfg.service_field.clone(), json!({ "value": service }));
        }
        let influence = issue.influence.as_deref().unwrap_or(&cfg.default_influence);
        map.insert(cfg.influence_field.clone(), json!({ "value": influence }));
        if let Some(started) = issue.started_at {
            let stamp = format!("{}{}", started.format("%Y-%m-%dT%H:%M:00.000"), cfg.utc_offset);
            map.insert(cfg.start_time_field.clone(), Value::String(stamp));
        }
        json!({ "fields": fields })
    }

    pub async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, TrackerError> {
        let response = self
            .client
            .post(self.api("issue"))
            .json(&self.issue_payload(issue))
            .send()
            .await
            .map_err(transport_error)?;
        let created: CreateIssueResponse = decode(check(response).await?).await?;
        debug!(key = created.key.as_str(), "jira issue created");
        Ok(CreatedIssue {
            url: self.browse_url(&created.key),
            key: created.key,
        })
    }

    pub async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError> {
        let response = self
            .client
            .post(self.api(&format!("issue/{key}/comment")))
            .json(&json!({ "body": body }))
            .send()
            .await
            .map_err(transport_error)?;
        check(response).await.map(|_| ())
    }

    pub async fn transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError> {
        let response = self
            .client
            .post(self.api(&format!("issue/{key}/transitions")))
            .json(&json!({ "transition": { "id": transition_id } }))
            .send()
            .await
            .map_err(transport_error)?;
        check(response).await.map(|_| ())
    }

    /// Calls `GET /rest/api/2/myself` to confirm the token works.
    pub async fn whoami(&self) -> Result<(), TrackerError> {
        let response = self
            .client
            .get(self.api("myself"))
            .send()
            .await
            .map_err(transport_error)?;
        check(response).await.map(|_| ())
    }
}

fn transport_error(e: reqwest::Error) -> TrackerError {
    if e.is_timeout() {
        TrackerError::Timeout
    } else {
        TrackerError::Connection(e.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TrackerError> {
    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body).map_err(|e| TrackerError::Decode(e.to_string()))
}

/// Passes successful responses through and maps failures to typed errors.
async fn check(response: Response) -> Result<Response, TrackerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after_secs = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorCollection>(&body)
        .ok()
        .and_then(|e| e.summary())
        .unwrap_or_else(|| body.clone());
    warn!(status = %status, detail = %detail, "jira request failed");

    Err(match status {
        StatusCode::BAD_REQUEST => TrackerError::Validation(detail),
        StatusCode::UNAUTHORIZED => TrackerError::Authentication,
        StatusCode::FORBIDDEN => TrackerError::Permission(detail),
        StatusCode::NOT_FOUND => TrackerError::NotFound(detail),
        StatusCode::TOO_MANY_REQUESTS => TrackerError::RateLimited { retry_after_secs },
        other => TrackerError::Unexpected {
            status: other.as_u16(),
            body,
        },
    })
}
