// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Jira REST v2 request and response bodies.

use serde::Deserialize;

/// Response to `POST /rest/api/2/issue`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIssueResponse {
    pub key: String,
}

/// Jira's error envelope, returned with most 4xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCollection {
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub errors: std::collections::BTreeMap<String, String>,
}

impl ErrorCollection {
    /// Flattens the envelope into one human-readable line.
    pub fn summary(&self) -> Option<String> {
        let parts: Vec<String> = self
            .error_messages
            .iter()
            .cloned()
            .chain(self.errors.iter().map(|(field, msg)| format!("{field}: {msg}")))
            .collect();
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}
