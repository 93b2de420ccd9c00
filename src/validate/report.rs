//! Validation report model and text rendering.
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

/// Overall outcome; `valid` is the conjunction of every check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub checks: Vec<CheckResult>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            valid: true,
            checks: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationReport {
    pub(super) fn record(&mut self, check: CheckResult, errors: Vec<String>, warnings: Vec<String>) {
        self.valid &= check.passed;
        self.checks.push(check);
        self.errors.extend(errors);
        self.warnings.extend(warnings);
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|check| check.passed).count()
    }

    #[cfg(test)]
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|check| check.name == name)
    }

    /// Checks, then errors, then warnings, then counts.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let title = "FCM Bridge Validation Report";
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{}", "=".repeat(title.len()));
        let _ = writeln!(
            out,
            "Status: {}",
            if self.valid { "PASSED" } else { "FAILED" }
        );
        out.push('\n');

        out.push_str("Checks:\n");
        for check in &self.checks {
            let mark = if check.passed { '✓' } else { '✗' };
            let _ = writeln!(out, "  {mark} {}: {}", check.name, check.message);
        }

        if !self.errors.is_empty() {
            out.push_str("\nErrors:\n");
            for error in &self.errors {
                let _ = writeln!(out, "  - {error}");
            }
        }
        if !self.warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for warning in &self.warnings {
                let _ = writeln!(out, "  - {warning}");
            }
        }

        let _ = writeln!(
            out,
            "\nSummary: {}/{} checks passed, {} errors, {} warnings",
            self.passed_count(),
            self.checks.len(),
            self.errors.len(),
            self.warnings.len()
        );
        out
    }
}
