//! Grammar for individual `Parameters` and `Outputs` list items.
//!
//! Parameter items look like `name: type (constraints) (optional)`; output
//! items are `name` or `name: description`.
use super::ParseMode;
use crate::error::ParseError;
use crate::model::{Output, ParamKind, Parameter};

const OPTIONAL_MARKER: &str = "(optional)";

/// Parse a parameter item. `Ok(None)` means the item was dropped (permissive
/// mode only).
pub(super) fn parse_parameter(
    text: &str,
    line_no: usize,
    mode: ParseMode,
) -> Result<Option<Parameter>, ParseError> {
    let required = !text.contains(OPTIONAL_MARKER);
    let cleaned = text.replace(OPTIONAL_MARKER, "");
    let cleaned = cleaned.trim();

    let Some((name, type_text)) = cleaned.split_once(':') else {
        return Ok(check_name(cleaned, line_no, mode)?.map(|name| Parameter {
            name,
            kind: ParamKind::String,
            required,
        }));
    };
    let Some(name) = check_name(name.trim(), line_no, mode)? else {
        return Ok(None);
    };
    let kind = parse_kind(type_text.trim(), line_no, mode)?;
    Ok(Some(Parameter {
        name,
        kind,
        required,
    }))
}

pub(super) fn parse_output(
    text: &str,
    line_no: usize,
    mode: ParseMode,
) -> Result<Option<Output>, ParseError> {
    let (name, description) = match text.split_once(':') {
        Some((name, description)) => {
            let description = description.trim();
            let description = (!description.is_empty()).then(|| description.to_string());
            (name.trim(), description)
        }
        None => (text.trim(), None),
    };
    Ok(check_name(name, line_no, mode)?.map(|name| Output { name, description }))
}

fn check_name(name: &str, line_no: usize, mode: ParseMode) -> Result<Option<String>, ParseError> {
    let problem = if name.is_empty() {
        Some("empty name")
    } else if name.contains(char::is_whitespace) {
        Some("name contains whitespace")
    } else {
        None
    };
    match (problem, mode) {
        (None, _) => Ok(Some(name.to_string())),
        (Some(problem), ParseMode::Strict) => {
            Err(ParseError::new(line_no, format!("{problem}: {name:?}")))
        }
        (Some(_), ParseMode::Permissive) if name.is_empty() => {
            tracing::debug!(line = line_no, "dropping item with empty name");
            Ok(None)
        }
        (Some(_), ParseMode::Permissive) => Ok(Some(name.to_string())),
    }
}

fn parse_kind(type_text: &str, line_no: usize, mode: ParseMode) -> Result<ParamKind, ParseError> {
    if type_text.contains('|') {
        let values = choice_values(type_text);
        if !values.is_empty() {
            return Ok(ParamKind::Choice(values));
        }
        return degrade(line_no, mode, format!("choice {type_text:?} has no values"));
    }
    let Some(token) = type_text.split_whitespace().next() else {
        return degrade(line_no, mode, "missing parameter type".to_string());
    };
    match ParamKind::from_token(token) {
        Some(kind) => Ok(kind),
        None => degrade(line_no, mode, format!("unknown parameter type {token:?}")),
    }
}

/// Pipe-separated values. A parenthesised group holding the pipes wins so that
/// `choice (a|b)` and `a|b` read the same; otherwise trailing `(...)` notes
/// such as `a|b (default a)` are cut off.
fn choice_values(type_text: &str) -> Vec<String> {
    let grouped = type_text
        .find('(')
        .and_then(|open| {
            let close = open + type_text[open..].find(')')?;
            Some(&type_text[open + 1..close])
        })
        .filter(|group| group.contains('|'));
    let inner = match grouped {
        Some(group) => group,
        None => {
            let head = type_text.split('(').next().unwrap_or_default();
            head.trim().trim_start_matches("choice").trim()
        }
    };
    inner
        .split('|')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn degrade(line_no: usize, mode: ParseMode, message: String) -> Result<ParamKind, ParseError> {
    match mode {
        ParseMode::Strict => Err(ParseError::new(line_no, message)),
        ParseMode::Permissive => {
            tracing::debug!(line = line_no, "{message}; treating as string");
            Ok(ParamKind::String)
        }
    }
}
