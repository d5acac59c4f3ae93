//! Observation type discriminators and severity levels.

use crate::error::LangfuseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic kind of an observation, sent as the body's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationType {
    Span,
    Generation,
    Event,
    /// Agent workflows and reasoning
    Agent,
    /// Tool or function calls
    Tool,
    Chain,
    /// Lookups against vector stores or databases
    Retriever,
    Embedding,
    Evaluator,
    /// Safety filters and content moderation
    Guardrail,
}

impl ObservationType {
    pub const ALL: [ObservationType; 10] = [
        ObservationType::Span,
        ObservationType::Generation,
        ObservationType::Event,
        ObservationType::Agent,
        ObservationType::Tool,
        ObservationType::Chain,
        ObservationType::Retriever,
        ObservationType::Embedding,
        ObservationType::Evaluator,
        ObservationType::Guardrail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationType::Span => "span",
            ObservationType::Generation => "generation",
            ObservationType::Event => "event",
            ObservationType::Agent => "agent",
            ObservationType::Tool => "tool",
            ObservationType::Chain => "chain",
            ObservationType::Retriever => "retriever",
            ObservationType::Embedding => "embedding",
            ObservationType::Evaluator => "evaluator",
            ObservationType::Guardrail => "guardrail",
        }
    }

    /// Whether observations of this type travel as `span-create`/`span-update` events.
    pub fn is_span_based(&self) -> bool {
        !matches!(self, ObservationType::Generation | ObservationType::Event)
    }

    /// Validate an optional type name as given by a caller.
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, LangfuseError> {
        value.map(str::parse).transpose()
    }
}

impl fmt::Display for ObservationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObservationType {
    type Err = LangfuseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObservationType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = ObservationType::ALL.iter().map(|k| k.as_str()).collect();
                LangfuseError::ValidationError(format!(
                    "Invalid observation type: {}. Valid types are: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// Severity of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObservationLevel {
    Debug,
    #[default]
    Default,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_all_types() {
        for kind in ObservationType::ALL {
            assert_eq!(kind.as_str().parse::<ObservationType>().unwrap(), kind);
        }
    }

    #[test]
    fn test_invalid_type_names_value_and_lists_valid_ones() {
        let err = "bogus".parse::<ObservationType>().unwrap_err();

        match err {
            LangfuseError::ValidationError(msg) => {
                assert!(msg.starts_with("Invalid observation type: bogus."));
                assert!(msg.contains("span, generation, event, agent, tool"));
                assert!(msg.ends_with("guardrail"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(ObservationType::parse_optional(None).unwrap(), None);
        assert_eq!(
            ObservationType::parse_optional(Some("tool")).unwrap(),
            Some(ObservationType::Tool)
        );
        assert!(ObservationType::parse_optional(Some("Tool")).is_err());
    }

    #[test]
    fn test_span_based() {
        assert!(ObservationType::Span.is_span_based());
        assert!(ObservationType::Agent.is_span_based());
        assert!(ObservationType::Guardrail.is_span_based());
        assert!(!ObservationType::Generation.is_span_based());
        assert!(!ObservationType::Event.is_span_based());
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_value(ObservationType::Retriever).unwrap(), json!("retriever"));
        assert_eq!(serde_json::to_value(ObservationLevel::Warning).unwrap(), json!("WARNING"));
        assert_eq!(ObservationLevel::default(), ObservationLevel::Default);
    }
}
