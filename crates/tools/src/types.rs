//! Wire types shared between the agent and the tools: calls, specs and results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// The function half of a tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// A tool call requested by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self { id: id.into(), call_type: function_type(), function: FunctionCall { name: name.into(), arguments } }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn arguments(&self) -> &Value {
        &self.function.arguments
    }
}

/// Parameter schema for a tool argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolParameter {
    String {
        description: Option<String>,
        #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
        allowed: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Array {
        items: Box<ToolParameter>,
        description: Option<String>,
    },
    Object {
        properties: Vec<(String, ToolParameter)>,
        description: Option<String>,
        required: Option<Vec<String>>,
    },
}

impl ToolParameter {
    pub fn new_string(description: impl Into<String>) -> Self {
        Self::String { description: Some(description.into()), allowed: None, default: None }
    }

    pub fn new_array(items: ToolParameter) -> Self {
        Self::Array { items: Box::new(items), description: None }
    }

    pub fn new_object(properties: Vec<(String, ToolParameter)>) -> Self {
        Self::Object { properties, description: None, required: None }
    }

    /// An object with no properties, for tools that take no arguments
    pub fn empty() -> Self {
        Self::new_object(Vec::new())
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        let description = Some(description.into());
        match self {
            Self::String { allowed, default, .. } => Self::String { description, allowed, default },
            Self::Array { items, .. } => Self::Array { items, description },
            Self::Object { properties, required, .. } => Self::Object { properties, description, required },
        }
    }

    /// Restrict a string parameter to a fixed set of values
    pub fn with_allowed(self, values: &[&str]) -> Self {
        match self {
            Self::String { description, default, .. } => Self::String {
                description,
                allowed: Some(values.iter().map(|v| v.to_string()).collect()),
                default,
            },
            other => other,
        }
    }

    pub fn with_default(self, value: impl Into<String>) -> Self {
        match self {
            Self::String { description, allowed, .. } => {
                Self::String { description, allowed, default: Some(value.into()) }
            }
            other => other,
        }
    }

    pub fn with_required(self, names: &[&str]) -> Self {
        match self {
            Self::Object { properties, description, .. } => Self::Object {
                properties,
                description,
                required: Some(names.iter().map(|n| n.to_string()).collect()),
            },
            other => other,
        }
    }

    /// Render as a JSON Schema fragment, the shape agents expect for function parameters
    pub fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        match self {
            Self::String { description, allowed, default } => {
                schema.insert("type".into(), json!("string"));
                if let Some(allowed) = allowed {
                    schema.insert("enum".into(), json!(allowed));
                }
                if let Some(default) = default {
                    schema.insert("default".into(), json!(default));
                }
                insert_description(&mut schema, description);
            }
            Self::Array { items, description } => {
                schema.insert("type".into(), json!("array"));
                schema.insert("items".into(), items.to_json_schema());
                insert_description(&mut schema, description);
            }
            Self::Object { properties, description, required } => {
                schema.insert("type".into(), json!("object"));
                let props: Map<String, Value> =
                    properties.iter().map(|(name, param)| (name.clone(), param.to_json_schema())).collect();
                schema.insert("properties".into(), Value::Object(props));
                if let Some(required) = required {
                    schema.insert("required".into(), json!(required));
                }
                insert_description(&mut schema, description);
            }
        }
        Value::Object(schema)
    }
}

fn insert_description(schema: &mut Map<String, Value>, description: &Option<String>) {
    if let Some(description) = description {
        schema.insert("description".into(), json!(description));
    }
}

/// Specification of a tool offered to the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub spec_type: String,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: Option<String>,
    pub parameters: ToolParameter,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: ToolParameter) -> Self {
        Self {
            spec_type: function_type(),
            function: FunctionSpec { name: name.into(), description: Some(description.into()), parameters },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn description(&self) -> Option<&str> {
        self.function.description.as_deref()
    }

    pub fn parameters(&self) -> &ToolParameter {
        &self.function.parameters
    }

    /// The OpenAI-style function declaration
    pub fn to_function_json(&self) -> Value {
        json!({
            "type": self.spec_type,
            "function": {
                "name": self.function.name,
                "description": self.function.description,
                "parameters": self.function.parameters.to_json_schema(),
            }
        })
    }
}

/// Outcome of one tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { tool_call_id: tool_call_id.into(), content: content.into(), error: None }
    }

    pub fn error(tool_call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self { tool_call_id: tool_call_id.into(), content: String::new(), error: Some(error.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The content on success, the error message otherwise
    pub fn text(&self) -> &str {
        self.error.as_deref().unwrap_or(&self.content)
    }
}
