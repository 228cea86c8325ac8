//! Structured search response types
//!
//! The wire shape is shared by the inference client, the command matcher,
//! and the HTTP API: camelCase field names, `type` tags on results.

use serde::{Deserialize, Serialize};

/// Classification of a single search result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// Link to a web page
    Web,
    /// An action the user can take
    Action,
    /// A direct answer to a question
    Answer,
}

/// A single result entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResultKind,
}

/// The structured outcome of one query
///
/// Replaced wholesale on every submission; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    /// Natural-language restatement of what was understood
    pub interpretation: String,
    /// Coarse intent: `search`, `action`, `question`, `command`, or
    /// `custom_command` when a user-defined command matched
    pub intent: String,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Set when a custom command short-circuited the inference path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_command_triggered: Option<bool>,
    /// URL to open when a custom command fired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_url: Option<String>,
}

impl AiResponse {
    /// Whether this response came from a custom command match
    #[must_use]
    pub fn is_custom_command(&self) -> bool {
        self.custom_command_triggered == Some(true)
    }
}
