//! The successful result of a command.

use std::time::Duration;

use http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};

/// Response details that are not part of the operation's output members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// HTTP status of the response, when one was received.
    pub status: Option<StatusCode>,
    /// Response headers.
    pub headers: HeaderMap,
    /// Service-assigned request id.
    pub request_id: Option<String>,
    /// Retries performed before this result was produced.
    pub retries: u32,
    /// Wall-clock time spent in the pipeline, when timed.
    pub total_time: Option<Duration>,
}

/// Output members of a command plus response [`Metadata`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    data: Map<String, Value>,
    metadata: Metadata,
}

impl Output {
    /// An output with no members.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An output built from the members of a JSON object.
    ///
    /// Non-object values produce an empty output.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(data) => Self {
                data,
                metadata: Metadata::default(),
            },
            _ => Self::default(),
        }
    }

    /// Builder-style member insertion.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Builder-style metadata replacement.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Look up an output member.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Set an output member.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Remove an output member.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// All output members.
    #[must_use]
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Response metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Mutable response metadata.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// The output members as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_build_output_from_json() {
        let output = Output::from_json(json!({"Count": 2, "Items": []}));
        assert_eq!(output.get("Count"), Some(&json!(2)));
        assert_eq!(output.to_json(), json!({"Count": 2, "Items": []}));
        assert_eq!(Output::from_json(json!("scalar")), Output::new());
    }

    #[test]
    fn test_should_carry_metadata_separately() {
        let mut output = Output::new().with("ETag", "abc");
        output.metadata_mut().status = Some(StatusCode::OK);
        output.metadata_mut().retries = 2;

        assert_eq!(output.data().len(), 1);
        assert_eq!(output.metadata().status, Some(StatusCode::OK));
        assert_eq!(output.metadata().retries, 2);
    }
}
