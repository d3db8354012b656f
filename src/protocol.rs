//! Typed records for the tool's JSON protocol, with decode-or-degrade.
//!
//! Every tool response is a single JSON payload on stdout. Nothing in this
//! module raises on malformed input: list payloads degrade to an empty
//! sequence and run payloads degrade to a synthetic failure carrying a
//! truncated copy of the raw output for diagnosis. Decode outcomes are an
//! explicit two-arm variant so call sites must handle the malformed case.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Provenance tier of a snippet record. Assigned by the fetching operation,
/// never decoded from tool output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Local,
    #[default]
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetRecord {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(skip_deserializing, default)]
    pub origin: Origin,
}

impl SnippetRecord {
    /// Title shown in selectors; falls back to the slug for untitled records.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.slug
        } else {
            &self.title
        }
    }
}

/// Full snippet body from the `info` operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetDetail {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// Result of one `run` invocation. Ephemeral; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolConfigInfo {
    #[serde(default, rename = "snippetsDir")]
    pub snippets_dir: String,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    results: Vec<SnippetRecord>,
}

/// Outcome of decoding a payload; both arms must be handled.
pub(crate) enum Decoded<T> {
    Value(T),
    Malformed,
}

pub(crate) fn decode<T: DeserializeOwned>(raw: &str) -> Decoded<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Decoded::Value(value),
        Err(err) => {
            log::debug!("undecodable tool payload: {err}");
            Decoded::Malformed
        }
    }
}

/// Decodes a `{results: [...]}` payload, tagging every record with `origin`.
/// Malformed payloads yield an empty sequence rather than an error.
pub fn parse_list(raw: &str, origin: Origin) -> Vec<SnippetRecord> {
    match decode::<ListEnvelope>(raw) {
        Decoded::Value(envelope) => {
            let mut records = envelope.results;
            for record in &mut records {
                record.origin = origin;
            }
            records
        }
        Decoded::Malformed => Vec::new(),
    }
}

/// Decodes a `{success, output, error}` payload.
///
/// Snippets that spawn async work can leak extra lines after a complete
/// first-line payload, so a failed full decode retries on the first line when
/// the output looks like JSON. Anything still undecodable becomes a synthetic
/// failure quoting the first 200 characters; empty output becomes a synthetic
/// "failed to run" result naming `tool`.
pub fn parse_run(raw: &str, tool: &str) -> RunOutcome {
    if raw.is_empty() {
        return RunOutcome {
            success: false,
            output: String::new(),
            error: format!("Failed to run {tool}"),
        };
    }
    match decode::<RunOutcome>(raw) {
        Decoded::Value(outcome) => outcome,
        Decoded::Malformed => {
            if raw.starts_with('{') {
                if let Some(first_line) = raw.lines().next() {
                    if let Decoded::Value(outcome) = decode::<RunOutcome>(first_line) {
                        return outcome;
                    }
                }
            }
            RunOutcome {
                success: false,
                output: raw.to_string(),
                error: format!("Invalid response: {}", truncate(raw, 200)),
            }
        }
    }
}

/// Decodes a snippet detail payload; `None` for empty or malformed output.
pub fn parse_detail(raw: &str) -> Option<SnippetDetail> {
    if raw.is_empty() {
        return None;
    }
    match decode(raw) {
        Decoded::Value(detail) => Some(detail),
        Decoded::Malformed => None,
    }
}

/// Decodes the `config` payload; `None` for empty or malformed output.
pub fn parse_config(raw: &str) -> Option<ToolConfigInfo> {
    if raw.is_empty() {
        return None;
    }
    match decode(raw) {
        Decoded::Value(config) => Some(config),
        Decoded::Malformed => None,
    }
}

fn truncate(raw: &str, limit: usize) -> String {
    raw.chars().take(limit).collect()
}
