// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock issue tracker for deterministic testing.
//!
//! Issues get sequential `FA-<n>` keys. A failure can be armed so that every
//! call returns it, which drives the local-id fallback path.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tocsin_core::traits::adapter::PluginAdapter;
use tocsin_core::traits::tracker::TicketTracker;
use tocsin_core::types::{AdapterType, CreatedIssue, HealthStatus, NewIssue};
use tocsin_core::{TocsinError, TrackerError};

#[derive(Default)]
struct Recorded {
    issues: Vec<NewIssue>,
    comments: Vec<(String, String)>,
    transitions: Vec<(String, String)>,
    failure: Option<TrackerError>,
    create_delay: Option<Duration>,
}

/// A mock tracker that records every call.
pub struct MockTracker {
    state: Mutex<Recorded>,
}

impl MockTracker {
    /// Create a tracker that accepts everything.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Recorded::default()),
        }
    }

    /// Create a tracker whose every call fails with `error`.
    pub fn failing(error: TrackerError) -> Self {
        Self {
            state: Mutex::new(Recorded {
                failure: Some(error),
                ..Recorded::default()
            }),
        }
    }

    /// Arm or clear the failure mode.
    pub async fn set_failure(&self, error: Option<TrackerError>) {
        self.state.lock().await.failure = error;
    }

    /// Make `create_issue` sleep for `delay` before answering.
    pub async fn set_create_delay(&self, delay: Duration) {
        self.state.lock().await.create_delay = Some(delay);
    }

    /// Issues successfully created so far.
    pub async fn created_issues(&self) -> Vec<NewIssue> {
        self.state.lock().await.issues.clone()
    }

    /// Comments added so far, as `(key, body)`.
    pub async fn comments(&self) -> Vec<(String, String)> {
        self.state.lock().await.comments.clone()
    }

    /// Transitions applied so far, as `(key, transition id)`.
    pub async fn transitions(&self) -> Vec<(String, String)> {
        self.state.lock().await.transitions.clone()
    }

    async fn check(&self) -> Result<(), TrackerError> {
        match &self.state.lock().await.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl Default for MockTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTracker {
    fn name(&self) -> &str {
        "mock-tracker"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Tracker
    }

    async fn health_check(&self) -> Result<HealthStatus, TocsinError> {
        Ok(match &self.state.lock().await.failure {
            Some(error) => HealthStatus::Unhealthy(error.to_string()),
            None => HealthStatus::Healthy,
        })
    }

    async fn shutdown(&self) -> Result<(), TocsinError> {
        Ok(())
    }
}

#[async_trait]
impl TicketTracker for MockTracker {
    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue, TrackerError> {
        let delay = self.state.lock().await.create_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check().await?;
        let mut state = self.state.lock().await;
        state.issues.push(issue.clone());
        let key = format!("FA-{}", state.issues.len());
        Ok(CreatedIssue {
            url: format!("https://jira.test/browse/{key}"),
            key,
        })
    }


    async fn add_comment(&self, key: &str, body: &str) -> Result<(), TrackerError> {
        self.check().await?;
        self.state
            .lock()
            .await
            .comments
            .push((key.to_string(), body.to_string()));
        Ok(())
    }

    async fn transition(&self, key: &str, transition_id: &str) -> Result<(), TrackerError> {
        self.check().await?;
        self.state
            .lock()
            .await
            .transitions
            .push((key.to_string(), transition_id.to_string()));
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(summary: &str) -> NewIssue {
        NewIssue {
            summary: summary.into(),
            description: "d".into(),
            level: None,
            service: None,
            influence: None,
            started_at: None,
        }
    }

    #[tokio::test]
    async fn keys_are_sequential() {
        let tracker = MockTracker::new();
        let first = tracker.create_issue(&issue("mail down")).await.unwrap();
        let second = tracker.create_issue(&issue("vpn down")).await.unwrap();
        assert_eq!(first.key, "FA-1");
        assert_eq!(second.key, "FA-2");
        assert_eq!(second.url, "https://jira.test/browse/FA-2");
        assert_eq!(tracker.created_issues().await[1].summary, "vpn down");
    }

    #[tokio::test]
    async fn failure_mode_applies_to_every_call() {
        let tracker = MockTracker::failing(TrackerError::Connection("refused".into()));
        assert!(matches!(
            tracker.create_issue(&issue("x")).await,
            Err(TrackerError::Connection(_))
        ));
        assert!(tracker.add_comment("FA-1", "hi").await.is_err());
        assert!(matches!(
            tracker.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));

        tracker.set_failure(None).await;
        assert!(tracker.create_issue(&issue("x")).await.is_ok());
        assert_eq!(tracker.created_issues().await.len(), 1);
    }
}
