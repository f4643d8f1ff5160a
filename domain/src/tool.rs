//! Tool specification passed to tool-capable providers.

use serde::{Deserialize, Serialize};

/// Declarative description of a tool the model may call.
///
/// The executable handler lives in the application layer; the spec is what
/// gets serialized into the provider request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name, unique within an agent's tool set
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// JSON-schema description of the parameters
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_roundtrip() {
        let spec = ToolSpec::new(
            "search",
            "Search the web",
            json!({"type": "object", "properties": {"q": {"type": "string"}}}),
        );
        let text = serde_json::to_string(&spec).unwrap();
        let back: ToolSpec = serde_json::from_str(&text).unwrap();
        assert_eq!(spec, back);
    }
}
