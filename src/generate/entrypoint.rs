//! Placeholder entrypoint rendering.
//!
//! The stub only reports what it is and hands off to an implementation
//! command named after the slug; behavior is maintained outside the bundle.
use super::identity::ActionIdentity;
use crate::model::Model;

pub fn render_entrypoint(model: &Model, identity: &ActionIdentity, source_rel: &str) -> String {
    let model_text = format!(
        "Model: {} {}",
        model.metadata.model_id.trim(),
        model.metadata.version.trim()
    );
    let slug = identity.slug.as_str();
    format!(
        "#!/usr/bin/env bash\n\
         # Generated from {source_rel} - DO NOT EDIT\n\
         set -euo pipefail\n\
         \n\
         echo {title}\n\
         echo {model_line}\n\
         echo \"Arguments: $*\"\n\
         \n\
         if command -v {slug} >/dev/null 2>&1; then\n\
         \x20   exec {slug} \"$@\"\n\
         fi\n\
         \n\
         echo {notice} >&2\n\
         exit 0\n",
        title = shell_words::quote(&format!("Action: {}", identity.title)),
        model_line = shell_words::quote(model_text.trim_end()),
        notice = shell_words::quote(&format!(
            "{slug}: no implementation installed; provide the {slug} package to run this action"
        )),
    )
}
