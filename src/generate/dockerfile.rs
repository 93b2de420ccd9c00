//! Container build descriptor rendering.
use crate::model::Model;
use crate::project::ENTRYPOINT_FILE;

/// Requirement tokens that translate into system packages, in install order.
const SYSTEM_PACKAGES: &[(&str, &str)] = &[
    ("git", "git"),
    ("curl", "curl"),
    ("jq", "jq"),
    ("make", "make"),
];

/// Package manager family inferred from the base image name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PackageManager {
    Apt,
    Apk,
}

impl PackageManager {
    fn for_image(image: &str) -> Self {
        if image.to_ascii_lowercase().contains("alpine") {
            PackageManager::Apk
        } else {
            PackageManager::Apt
        }
    }

    fn install_step(self, packages: &[&str]) -> String {
        let list = packages.join(" ");
        match self {
            PackageManager::Apt => format!(
                "RUN apt-get update \\\n    && apt-get install -y --no-install-recommends {list} \\\n    && rm -rf /var/lib/apt/lists/*\n"
            ),
            PackageManager::Apk => format!("RUN apk add --no-cache {list}\n"),
        }
    }
}

/// Recognized system packages requested by `interface.requirements`.
pub fn required_packages(model: &Model) -> Vec<&'static str> {
    let Some(requirements) = model.interface.get("requirements") else {
        return Vec::new();
    };
    let requested: Vec<String> = requirements
        .items()
        .into_iter()
        .map(|item| item.trim().to_ascii_lowercase())
        .collect();
    for item in &requested {
        if !SYSTEM_PACKAGES.iter().any(|(token, _)| token == item) {
            tracing::debug!(requirement = %item, "no install step for requirement");
        }
    }
    SYSTEM_PACKAGES
        .iter()
        .filter(|(token, _)| requested.iter().any(|item| item == token))
        .map(|(_, package)| *package)
        .collect()
}

pub fn render_dockerfile(model: &Model, default_image: &str, source_rel: &str) -> String {
    let image = model.interface_text("image").unwrap_or(default_image);
    let mut out = format!("# Generated from {source_rel} - DO NOT EDIT\nFROM {image}\n\n");
    let packages = required_packages(model);
    if !packages.is_empty() {
        out.push_str(&PackageManager::for_image(image).install_step(&packages));
        out.push('\n');
    }
    out.push_str(&format!(
        "COPY {ENTRYPOINT_FILE} /{ENTRYPOINT_FILE}\nRUN chmod +x /{ENTRYPOINT_FILE}\n\nENTRYPOINT [\"/{ENTRYPOINT_FILE}\"]\n"
    ));
    out
}
