use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The declared type of one action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Enum,
    Array,
    Object,
}

impl ParamType {
    /// Whether `value` already has the Rust-side shape this type expects,
    /// without attempting any coercion.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String | Self::Enum => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// One entry of an action's parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    /// Allowed values, required when `param_type == Enum`.
    #[serde(default)]
    pub values: Option<Vec<String>>,
    /// Affects logging/tracing only — never changes execution semantics.
    #[serde(default)]
    pub secret: bool,
    #[serde(default)]
    pub description: Option<String>,
}
