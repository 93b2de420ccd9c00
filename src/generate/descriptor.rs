//! `action.yml` rendering.
//!
//! The body is serialized with `serde_yaml` from typed structs so key order and
//! quoting are deterministic; inputs and outputs keep model order.
use super::identity::{humanize, ActionIdentity};
use crate::model::{Model, ParamKind, Parameter};
use crate::project::DOCKERFILE_FILE;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Provenance line prefixes. The validator requires both in every descriptor.
pub const PROVENANCE_SOURCE_PREFIX: &str = "# Generated from ";
pub const PROVENANCE_LOCK_PREFIX: &str = "# DO NOT EDIT";

#[derive(Serialize)]
struct ActionDescriptor<'a> {
    name: &'a str,
    description: &'a str,
    inputs: Mapping,
    outputs: Mapping,
    runs: Runs,
}

#[derive(Serialize)]
struct InputSpec {
    description: String,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<String>,
}

#[derive(Serialize)]
struct OutputSpec {
    description: String,
}

#[derive(Serialize)]
struct Runs {
    using: &'static str,
    image: &'static str,
}

pub fn provenance_header(model: &Model, identity: &ActionIdentity, source_rel: &str) -> String {
    let model_id = if model.metadata.model_id.trim().is_empty() {
        identity.slug.as_str()
    } else {
        model.metadata.model_id.trim()
    };
    let model_line = match model.metadata.version.trim() {
        "" => format!("# Model: {model_id}"),
        version => format!("# Model: {model_id} v{version}"),
    };
    format!(
        "{PROVENANCE_SOURCE_PREFIX}{source_rel}\n{model_line}\n{PROVENANCE_LOCK_PREFIX} - regenerate with `fcm-bridge generate` instead\n"
    )
}

pub fn render_descriptor(model: &Model, identity: &ActionIdentity, source_rel: &str) -> Result<String> {
    let mut inputs = Mapping::new();
    for param in &model.parameters {
        let spec = InputSpec {
            description: input_description(param),
            required: param.required,
            default: (!param.required).then(String::new),
        };
        let value = serde_yaml::to_value(spec).context("serialize input spec")?;
        inputs.insert(Value::String(param.name.clone()), value);
    }

    let mut outputs = Mapping::new();
    for output in &model.outputs {
        let spec = OutputSpec {
            description: output
                .description
                .clone()
                .unwrap_or_else(|| humanize(&output.name)),
        };
        let value = serde_yaml::to_value(spec).context("serialize output spec")?;
        outputs.insert(Value::String(output.name.clone()), value);
    }

    let descriptor = ActionDescriptor {
        name: &identity.title,
        description: model.capability.trim(),
        inputs,
        outputs,
        runs: Runs {
            using: "docker",
            image: DOCKERFILE_FILE,
        },
    };
    let body = serde_yaml::to_string(&descriptor).context("serialize action descriptor")?;
    Ok(format!(
        "{}\n{body}",
        provenance_header(model, identity, source_rel)
    ))
}

fn input_description(param: &Parameter) -> String {
    let base = humanize(&param.name);
    if let Some(values) = param.constraints() {
        return format!("{base}. Allowed values: {}", values.join(", "));
    }
    match param.kind {
        ParamKind::Boolean => format!("{base} (true or false)"),
        ParamKind::Number => format!("{base} (number)"),
        ParamKind::String | ParamKind::Choice(_) => base,
    }
}
