// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jira adapter for the Tocsin incident bot.
//!
//! This crate implements [`TicketTracker`] on top of the Jira REST API. When
//! no tracker is configured, [`DisabledTracker`] stands in and refuses every
//! call with [`TrackerError::Disabled`], which the workflow treats like any
//! other tracker failure.

pub mod client;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use tocsin_config::TocsinConfig;
use tocsin_core::error::{TocsinError, TrackerError};
use tocsin_core::traits::{PluginAdapter, TicketTracker};
use tocsin_core::types::{AdapterType, CreatedIssue, HealthStatus, NewIssue};
use tracing::{debug, info};

use crate::client::JiraClient;

/// Jira tracker implementing [`TicketTracker`].
pub struct JiraTracker {
    client: JiraClient,
}

impl JiraTracker {
    pub fn new(config: &TocsinConfig) -> Result<Self, TocsinError> {
        let client = JiraClient::new(&config.tracker)?;
        info!(base_url = client.base_url(), "jira tracker configured");
        Ok(Self { client })
    }

    pub fn client(&self) -> &JiraClient {
        &self.client
    }
}

#[async_trait]
impl PluginAdapter for JiraTracker {
    fn name(&self) -> &str {
        "jira"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Tracker
    }

    async fn health_check(&self) -> Result<HealthStatus, TocsinError> {
        match self.client.whoami().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) if e.is_transient() => Ok(HealthStatus::Degraded(e.to_string())),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), TocsinError> {
        debug!("jira tracker shutting down");
        Ok(())
    }
}

#[async_trait]
impl TicketTracker for JiraTracker {
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, TrackerError> {
        self.client.create_issue(issue).await
    }


    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError> {
        self.client.add_comment(key, body).await
    }

    async fn transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError> {
        self.client.transition(key, transition_id).await
    }

}

/// Tracker used when `[tracker].base_url` is unset.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledTracker;

#[async_trait]
impl PluginAdapter for DisabledTracker {
    fn name(&self) -> &str {
        "disabled"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Tracker
    }

    async fn health_check(&self) -> Result<HealthStatus, TocsinError> {
        Ok(HealthStatus::Degraded("no tracker configured".into()))
    }

    async fn shutdown(&self) -> Result<(), TocsinError> {
        Ok(())
    }
}

#[async_trait]
impl TicketTracker for DisabledTracker {
    async fn create_issue(&self, _issue: &NewIssue) -> Result<CreatedIssue, TrackerError> {
        Err(TrackerError::Disabled)
    }


    async fn add_comment(&self, _key: &str, _body: &str) -> Result<(), TrackerError> {
        Err(TrackerError::Disabled)
    }

    async fn transition(&self, _key: &str, _transition_id: &str) -> Result<(), TrackerError> {
        Err(TrackerError::Disabled)
    }

}

/// Picks the Jira tracker when configured, otherwise [`DisabledTracker`].
pub fn build_tracker(config: &TocsinConfig) -> Result<Arc<dyn TicketTracker>, TocsinError> {
    if config.tracker.base_url.is_some() {
        Ok(Arc::new(JiraTracker::new(config)?))
    } else {
        info!("no tracker configured, alarms will use local ids");
        Ok(Arc::new(DisabledTracker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn jira_config(base_url: &str) -> TocsinConfig {
        let mut config = TocsinConfig::default();
        config.tracker.base_url = Some(base_url.to_string());
        config.tracker.token = Some("pat".into());
        config
    }

    #[test]
    fn build_tracker_falls_back_to_disabled() {
        let tracker = build_tracker(&TocsinConfig::default()).unwrap();
        assert_eq!(tracker.name(), "disabled");
        let tracker = build_tracker(&jira_config("https://jira.example.com")).unwrap();
        assert_eq!(tracker.name(), "jira");
        assert_eq!(tracker.adapter_type(), AdapterType::Tracker);
    }

    #[test]
    fn build_tracker_rejects_url_without_token() {
        let mut config = jira_config("https://jira.example.com");
        config.tracker.token = None;
        assert!(build_tracker(&config).is_err());
    }

    #[tokio::test]
    async fn disabled_tracker_refuses_everything() {
        let tracker = DisabledTracker;
        let issue = NewIssue {
            summary: "x".into(),
            description: "y".into(),
            level: None,
            service: None,
            influence: None,
            started_at: None,
        };
        assert_eq!(tracker.create_issue(&issue).await.unwrap_err(), TrackerError::Disabled);
        assert_eq!(
            tracker.transition("FA-1", "31").await.unwrap_err(),
            TrackerError::Disabled
        );
    }

    #[tokio::test]
    async fn health_check_reflects_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/myself"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "bot"})))
            .mount(&server)
            .await;
        let tracker = JiraTracker::new(&jira_config(&server.uri())).unwrap();
        assert_eq!(tracker.health_check().await.unwrap(), HealthStatus::Healthy);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/myself"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let tracker = JiraTracker::new(&jira_config(&server.uri())).unwrap();
        assert!(matches!(
            tracker.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
