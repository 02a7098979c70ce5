use std::collections::HashSet;

use glob::Pattern;

/// Lookup tables for the traversal filters, built once from `SnapConfig`.
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    ignored_dirs: HashSet<String>,
    allowed_extensions: HashSet<String>,
    denied_files: HashSet<String>,
    exclusions: Vec<Pattern>,
}

impl FilterRules {
    pub fn new<I, S>(ignored_dirs: I, allowed_extensions: I, denied_files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FilterRules {
            ignored_dirs: ignored_dirs
                .into_iter()
                .map(|s| s.as_ref().to_string())
                .collect(),
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|s| normalize_extension(s.as_ref()))
                .collect(),
            denied_files: denied_files
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
            exclusions: Vec::new(),
        }
    }

    /// Invalid glob patterns are dropped with a warning.
    pub fn with_exclusions<S: AsRef<str>>(mut self, patterns: &[S]) -> Self {
        for raw in patterns {
            match Pattern::new(raw.as_ref()) {
                Ok(pat) => self.exclusions.push(pat),
                Err(e) => log::warn!("Ignoring invalid exclusion pattern {:?}: {}", raw.as_ref(), e),
            }
        }
        self
    }
}

fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

// -----------------------------------------------------------------------------
// Predicates
// -----------------------------------------------------------------------------

pub fn should_ignore_dir(name: &str, rules: &FilterRules) -> bool {
    rules.ignored_dirs.contains(name) || name.starts_with('.')
}

/// `ext` carries its leading dot (`.py`). An empty extension is never allowed.
pub fn is_allowed_extension(ext: &str, rules: &FilterRules) -> bool {
    !ext.is_empty() && rules.allowed_extensions.contains(&ext.to_lowercase())
}

pub fn is_denied_file(name: &str, rules: &FilterRules) -> bool {
    rules.denied_files.contains(&name.to_lowercase())
}

pub fn matches_exclusion(rel_path: &str, rules: &FilterRules) -> bool {
    rules.exclusions.iter().any(|pat| pat.matches(rel_path))
}
