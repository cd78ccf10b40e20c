use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A notification delivered by the external event source.
///
/// Transient: the pipeline inspects it inline and never stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Identifier of the application that emitted the notification
    /// (an Android package name such as `com.tencent.mm`).
    pub source_id: String,

    /// Text fragments in the order the source reported them. A `null`
    /// fragment arrives as an empty string and is skipped by extraction.
    #[serde(default, deserialize_with = "nullable_fragments")]
    pub text_fragments: Vec<String>,
}

fn nullable_fragments<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

impl RawEvent {
    pub fn new<S, I, F>(source_id: S, fragments: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self {
            source_id: source_id.into(),
            text_fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Message body extracted from one `label:body` fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub source_id: String,
    pub body: String,
}

/// What a [`RelayMessage`] carries to the display consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// The extracted payload body, relayed as soon as it is seen.
    Original,
    /// Raw body returned by the completion endpoint.
    Response,
    /// Diagnostic for a failed completion call.
    Error,
}

impl MessageKind {
    /// Label shown in front of the text when the message is rendered.
    pub fn label(&self) -> &'static str {
        match self {
            MessageKind::Original => "message",
            MessageKind::Response => "response",
            MessageKind::Error => "error",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One unit of output for the display consumer. Moved, never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl RelayMessage {
    pub fn original(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Original,
            text: text.into(),
        }
    }

    pub fn response(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Response,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for RelayMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.text)
    }
}
