//! Line-oriented FCM model parser.
//!
//! Parsing is an explicit state machine: every line is classified into a typed
//! [`Line`] and fed through a single transition function keyed on the active
//! [`Section`]. Nothing is schema-validated beyond what the grammar needs;
//! [`ParseMode`] decides whether malformed text degrades or is rejected.
use crate::error::{BridgeError, ParseError};
use crate::model::{InterfaceValue, Model};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

mod items;

use items::{parse_output, parse_parameter};

/// How the parser treats text it cannot interpret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Malformed items degrade to defaults and unknown lines are ignored.
    #[default]
    Permissive,
    /// Malformed items and stray lines are hard errors.
    Strict,
}

/// Parser states. `Metadata` and `Capability` are entered by their key lines;
/// the rest by section headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    None,
    Metadata,
    Capability,
    Parameters,
    Outputs,
    Interface,
    Dependencies,
    Patterns,
}

impl Section {
    fn from_header(key: &str) -> Option<Self> {
        match key {
            "Parameters" => Some(Section::Parameters),
            "Outputs" => Some(Section::Outputs),
            "Interface" => Some(Section::Interface),
            "Dependencies" => Some(Section::Dependencies),
            "Patterns" => Some(Section::Patterns),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataKey {
    Model,
    Version,
    Layer,
    Domain,
}

impl MetadataKey {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "Model" => Some(MetadataKey::Model),
            "Version" => Some(MetadataKey::Version),
            "Layer" => Some(MetadataKey::Layer),
            "Domain" => Some(MetadataKey::Domain),
            _ => None,
        }
    }
}

/// A classified source line. Borrowed slices point into the model text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Skip,
    Metadata(MetadataKey, &'a str),
    Capability(&'a str),
    Header(Section),
    Item(&'a str),
    KeyValue {
        key: &'a str,
        value: &'a str,
        text: &'a str,
        indented: bool,
    },
    Text { text: &'a str, indented: bool },
}

fn key_value_regex() -> &'static Regex {
    static KEY_VALUE: OnceLock<Regex> = OnceLock::new();
    KEY_VALUE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_.-]*)\s*:\s*(.*)$").expect("regex for key/value lines")
    })
}

fn classify(raw: &str) -> Line<'_> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Skip;
    }
    if trimmed == "-" {
        return Line::Item("");
    }
    if let Some(item) = trimmed.strip_prefix("- ") {
        return Line::Item(item.trim());
    }
    let indented = raw.starts_with(char::is_whitespace);
    let Some(caps) = key_value_regex().captures(trimmed) else {
        return Line::Text {
            text: trimmed,
            indented,
        };
    };
    let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let value = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
    if value.is_empty() {
        if let Some(section) = Section::from_header(key) {
            return Line::Header(section);
        }
    }
    if !indented {
        if key == "Capability" {
            return Line::Capability(value);
        }
        if let Some(meta) = MetadataKey::from_key(key) {
            return Line::Metadata(meta, value);
        }
    }
    Line::KeyValue {
        key,
        value,
        text: trimmed,
        indented,
    }
}

struct ParseState {
    mode: ParseMode,
    section: Section,
    /// Interface key currently collecting `- item` lines.
    interface_list: Option<String>,
    model: Model,
}

impl ParseState {
    fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            section: Section::None,
            interface_list: None,
            model: Model::default(),
        }
    }

    /// Apply one classified line and move to the next state.
    fn step(&mut self, line_no: usize, line: Line<'_>) -> Result<(), ParseError> {
        let next = match (self.section, line) {
            (state, Line::Skip) => state,
            (_, Line::Metadata(key, value)) => {
                self.set_metadata(key, value);
                Section::Metadata
            }
            (_, Line::Capability(value)) => {
                self.model.capability = value.to_string();
                Section::Capability
            }
            (_, Line::Header(section)) => section,
            (Section::Capability, Line::Text { text, indented: true })
            | (
                Section::Capability,
                Line::KeyValue {
                    text,
                    indented: true,
                    ..
                },
            ) => {
                self.continue_capability(text);
                Section::Capability
            }
            // An unindented stray line closes the capability.
            (Section::Capability, other @ (Line::Text { .. } | Line::KeyValue { .. })) => {
                self.unexpected(line_no, Section::Capability, other)?;
                Section::None
            }
            (Section::Parameters, Line::Item(text)) => {
                if let Some(param) = parse_parameter(text, line_no, self.mode)? {
                    self.model.parameters.push(param);
                }
                Section::Parameters
            }
            (Section::Outputs, Line::Item(text)) => {
                if let Some(output) = parse_output(text, line_no, self.mode)? {
                    self.model.outputs.push(output);
                }
                Section::Outputs
            }
            (Section::Dependencies, Line::Item(text)) => {
                self.model.dependencies.push(text.to_string());
                Section::Dependencies
            }
            (Section::Patterns, Line::Item(text)) => {
                self.model.patterns.push(text.to_string());
                Section::Patterns
            }
            (Section::Interface, Line::KeyValue { key, value, .. }) => {
                self.set_interface(key, value);
                Section::Interface
            }
            (Section::Interface, Line::Item(text)) => {
                self.push_interface_item(line_no, text)?;
                Section::Interface
            }
            (state, other) => {
                self.unexpected(line_no, state, other)?;
                state
            }
        };
        if next != Section::Interface || matches!(line, Line::Header(_)) {
            self.interface_list = None;
        }
        self.section = next;
        Ok(())
    }

    fn set_metadata(&mut self, key: MetadataKey, value: &str) {
        let slot = match key {
            MetadataKey::Model => &mut self.model.metadata.model_id,
            MetadataKey::Version => &mut self.model.metadata.version,
            MetadataKey::Layer => &mut self.model.metadata.layer,
            MetadataKey::Domain => &mut self.model.metadata.domain,
        };
        *slot = value.to_string();
    }

    fn continue_capability(&mut self, text: &str) {
        if !self.model.capability.is_empty() {
            self.model.capability.push(' ');
        }
        self.model.capability.push_str(text);
    }

    fn set_interface(&mut self, key: &str, value: &str) {
        let parsed = if value.is_empty() {
            self.interface_list = Some(key.to_string());
            InterfaceValue::List(Vec::new())
        } else {
            self.interface_list = None;
            parse_interface_value(value)
        };
        self.model.interface.insert(key.to_string(), parsed);
    }

    fn push_interface_item(&mut self, line_no: usize, text: &str) -> Result<(), ParseError> {
        let Some(key) = self.interface_list.as_deref() else {
            return self.reject(line_no, format!("list item {text:?} has no interface key"));
        };
        if let Some(InterfaceValue::List(items)) = self.model.interface.get_mut(key) {
            items.push(text.to_string());
        }
        Ok(())
    }

    fn unexpected(&self, line_no: usize, state: Section, line: Line<'_>) -> Result<(), ParseError> {
        let message = match line {
            Line::Item(text) => format!("list item {text:?} outside a list section"),
            Line::KeyValue { key, .. } => format!("unrecognized key {key:?}"),
            Line::Text { text, .. } => format!("unrecognized line {text:?}"),
            _ => format!("unexpected line in {state:?} section"),
        };
        self.reject(line_no, message)
    }

    /// Strict mode fails; permissive mode drops the line.
    fn reject(&self, line_no: usize, message: String) -> Result<(), ParseError> {
        match self.mode {
            ParseMode::Strict => Err(ParseError::new(line_no, message)),
            ParseMode::Permissive => {
                tracing::debug!(line = line_no, "ignoring model line: {message}");
                Ok(())
            }
        }
    }
}

fn parse_interface_value(value: &str) -> InterfaceValue {
    let bracketed = value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'));
    match bracketed {
        Some(inner) => InterfaceValue::List(
            inner
                .split(',')
                .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\''))
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        None => InterfaceValue::Text(value.to_string()),
    }
}

/// Parse model text. Missing sections produce empty defaults.
pub fn parse_model(text: &str, mode: ParseMode) -> Result<Model, ParseError> {
    let mut state = ParseState::new(mode);
    for (idx, raw) in text.lines().enumerate() {
        state.step(idx + 1, classify(raw))?;
    }
    Ok(state.model)
}

/// Read and parse a model file, mapping I/O failures to typed errors.
pub fn parse_model_file(path: &Path, mode: ParseMode) -> Result<Model, BridgeError> {
    let text = read_model_text(path)?;
    parse_model(&text, mode).map_err(|source| BridgeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_model_text(path: &Path) -> Result<String, BridgeError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            BridgeError::ModelNotFound(path.to_path_buf())
        } else {
            BridgeError::ModelUnreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}
