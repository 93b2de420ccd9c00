//! Typed in-memory form of an FCM model.
//!
//! Models are read-only once parsed; the generator only ever borrows them.
use serde::Serialize;
use std::collections::BTreeMap;

/// Identity fields declared at the top of a model file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub model_id: String,
    pub version: String,
    pub layer: String,
    pub domain: String,
}

/// Closed set of parameter kinds; choices carry their allowed values in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "constraints")]
pub enum ParamKind {
    String,
    Choice(Vec<String>),
    Boolean,
    Number,
}

impl ParamKind {
    /// Resolve a declared type token, if it names a known scalar kind.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => Some(ParamKind::String),
            "boolean" | "bool" => Some(ParamKind::Boolean),
            "number" | "int" | "integer" | "float" => Some(ParamKind::Number),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(flatten)]
    pub kind: ParamKind,
    pub required: bool,
}

impl Parameter {
    /// Allowed values, present only for choice parameters.
    pub fn constraints(&self) -> Option<&[String]> {
        match &self.kind {
            ParamKind::Choice(values) => Some(values),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Interface values are either a single scalar or a bracketed/itemized list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InterfaceValue {
    Text(String),
    List(Vec<String>),
}

impl InterfaceValue {
    /// Flatten to individual tokens; scalar text is split on commas.
    pub fn items(&self) -> Vec<&str> {
        match self {
            InterfaceValue::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .collect(),
            InterfaceValue::List(items) => items.iter().map(String::as_str).collect(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            InterfaceValue::Text(text) => Some(text.as_str()),
            InterfaceValue::List(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Model {
    pub metadata: Metadata,
    pub capability: String,
    pub parameters: Vec<Parameter>,
    pub outputs: Vec<Output>,
    pub interface: BTreeMap<String, InterfaceValue>,
    pub dependencies: Vec<String>,
    pub patterns: Vec<String>,
}

impl Model {
    pub fn interface_text(&self, key: &str) -> Option<&str> {
        self.interface
            .get(key)
            .and_then(InterfaceValue::as_text)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}
