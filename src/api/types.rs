//! Wire types for the answer service contract

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question
    pub message: String,
    /// Session token correlating this exchange with stored history
    pub session_id: String,
    /// Active mode id at send time
    pub mode: String,
    /// Scoping module, serialized as `null` when absent
    pub module: Option<String>,
}

/// Successful `POST chat` payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// Answer text
    pub response: String,
    /// Server timestamp for the answer
    #[serde(default, deserialize_with = "lenient_timestamp_opt")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Echoed session token
    #[serde(default)]
    pub session_id: Option<String>,
    /// Documentation units the answer was drawn from
    #[serde(default)]
    pub sources: Option<Vec<Citation>>,
    /// Follow-up prompts offered as one-click questions
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    /// Opaque diagram spec
    #[serde(default)]
    pub visualization: Option<serde_json::Value>,
}

/// Source citation attached to an answer
///
/// The service sends either a bare tag or an object such as
/// `{"doc": "readme.md", "section": "Train API"}`; the payload is kept
/// verbatim and only interpreted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Citation(pub serde_json::Value);

impl Citation {
    /// Human-readable tag naming the originating documentation unit
    ///
    /// # Examples
    ///
    /// ```
    /// use docbot::api::Citation;
    ///
    /// let c = Citation(serde_json::json!({"doc": "readme.md", "section": "Train API"}));
    /// assert_eq!(c.label(), "readme.md § Train API");
    /// ```
    pub fn label(&self) -> String {
        match &self.0 {
            serde_json::Value::String(tag) => tag.clone(),
            serde_json::Value::Object(map) => {
                let doc = ["doc", "source", "title", "file"]
                    .iter()
                    .find_map(|k| map.get(*k).and_then(|v| v.as_str()));
                let section = map.get("section").and_then(|v| v.as_str());
                match (doc, section) {
                    (Some(doc), Some(section)) => format!("{} § {}", doc, section),
                    (Some(doc), None) => doc.to_string(),
                    (None, Some(section)) => section.to_string(),
                    (None, None) => self.0.to_string(),
                }
            }
            other => other.to_string(),
        }
    }
}

/// One stored message as returned by `GET chat/history/{token}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryMessage {
    /// `user`, `assistant` or `system`
    pub role: String,
    /// Message text
    pub content: String,
    /// When the server stored the message; required so reloads are stable
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Citations stored with assistant messages
    #[serde(default)]
    pub sources: Option<Vec<Citation>>,
    /// Stored diagram spec
    #[serde(default)]
    pub visualization: Option<serde_json::Value>,
}

/// `GET chat/history/{token}` payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryResponse {
    /// Session the history belongs to
    #[serde(default)]
    pub session_id: Option<String>,
    /// Messages in server order
    pub messages: Vec<HistoryMessage>,
}

/// A selectable query mode offered by the deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDescriptor {
    /// Stable id sent as `mode` on every request
    pub id: String,
    /// Display name
    #[serde(alias = "name")]
    pub label: String,
    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Whether a scoping module must be selected in this mode
    #[serde(default)]
    pub requires_module: bool,
}

impl ModeDescriptor {
    /// Convenience constructor
    pub fn new(id: &str, label: &str, description: &str, requires_module: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            description: Some(description.to_string()),
            requires_module,
        }
    }
}

/// `GET chat/modes` payload
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ModeCatalog {
    /// Available modes
    pub modes: Vec<ModeDescriptor>,
    /// Modules that may scope a module-requiring mode
    #[serde(default)]
    pub modules: Vec<String>,
}

/// `GET health` payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    /// `healthy` or `unhealthy`
    pub status: String,
    /// Service name
    #[serde(default)]
    pub service: Option<String>,
    /// Tenant the service is configured for
    #[serde(default)]
    pub client: Option<String>,
    /// Deployment environment
    #[serde(default)]
    pub environment: Option<String>,
}

impl HealthStatus {
    /// Whether the service reports itself healthy
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Parse RFC 3339, falling back to naive ISO-8601 interpreted as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn lenient_timestamp_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
    }
}
