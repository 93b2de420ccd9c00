//! Action identity: slug, display title, and domain bucket.
use crate::model::Model;
use std::path::Path;

/// Slug tokens that classify an action when its model declares no domain.
/// Evaluated in order; the first token hit wins.
const DOMAIN_TABLE: &[(&str, &str)] = &[
    ("changelog", "release"),
    ("release", "release"),
    ("version", "version"),
    ("semver", "version"),
    ("git", "git"),
    ("branch", "git"),
    ("commit", "git"),
    ("tag", "git"),
    ("merge", "git"),
    ("docker", "container"),
    ("container", "container"),
    ("image", "container"),
    ("test", "test"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionIdentity {
    pub slug: String,
    pub title: String,
    pub domain: String,
}

/// Where the domain bucket came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainSource {
    Declared,
    Classified,
    Default,
}

pub fn resolve_identity(model: &Model, source_file: &Path, default_domain: &str) -> ActionIdentity {
    let slug = action_slug(&model.metadata.model_id)
        .or_else(|| {
            source_file
                .file_stem()
                .and_then(|stem| action_slug(&stem.to_string_lossy()))
        })
        .unwrap_or_else(|| "action".to_string());
    let (domain, source) = resolve_domain(&model.metadata.domain, &slug, default_domain);
    tracing::debug!(slug = %slug, domain = %domain, ?source, "resolved action identity");
    ActionIdentity {
        title: title_case(&slug),
        slug,
        domain,
    }
}

/// Last dot-segment of the model id, lowercased, `_` → `-`, restricted to a
/// shell- and path-safe alphabet.
pub fn action_slug(model_id: &str) -> Option<String> {
    let last = model_id.trim().rsplit('.').next().unwrap_or_default();
    let slug = sanitize_segment(&last.replace('_', "-"));
    (!slug.is_empty()).then_some(slug)
}

/// Declared domain first; slug classification only when none is declared.
pub fn resolve_domain(declared: &str, slug: &str, default_domain: &str) -> (String, DomainSource) {
    let declared = sanitize_segment(declared);
    if !declared.is_empty() {
        return (declared, DomainSource::Declared);
    }
    let tokens: Vec<&str> = slug.split('-').collect();
    for (needle, domain) in DOMAIN_TABLE {
        if tokens.contains(needle) {
            return ((*domain).to_string(), DomainSource::Classified);
        }
    }
    (default_domain.to_string(), DomainSource::Default)
}

pub fn title_case(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Commit_message` → `Commit message`.
pub fn humanize(name: &str) -> String {
    let spaced = name.replace(['_', '-'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn sanitize_segment(raw: &str) -> String {
    let mapped: String = raw
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    mapped
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
