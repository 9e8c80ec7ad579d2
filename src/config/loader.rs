// Configuration loader

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment switch that makes typedef convention violations fatal
pub const STRICT_TYPEDEFS_ENV: &str = "EXTRACT_ANNOTATIONS_STRICT_TYPEDEFS";

/// Configuration for an extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Write `value` first and the remaining attributes alphabetically
    pub sort_attributes: bool,

    /// Also export class-retained annotations
    pub include_class_retention: bool,

    /// Fail instead of warning when a typedef breaks the conventions
    pub strict_typedefs: bool,

    /// Fail when a generated document does not re-parse
    pub assertions: bool,

    /// Patterns skipped when scanning merge directories
    pub exclude: Vec<String>,

    /// All build variants of the project
    pub variants: Vec<String>,

    /// Variant this run processes
    pub variant: Option<String>,

    /// Which nested declarations the extraction pass descends into
    pub traversal: TraversalRules,
}

/// Nested declarations visited by the extraction pass.
///
/// Annotations inside method bodies, field initializers and anonymous
/// classes are not part of any public signature, so all are off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalRules {
    /// Classes declared inside method bodies
    pub method_bodies: bool,

    /// Classes declared inside field initializers
    pub initializers: bool,

    /// Anonymous classes
    pub anonymous_classes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sort_attributes: false,
            include_class_retention: false,
            strict_typedefs: false,
            assertions: false,
            exclude: vec![
                "**/build/**".to_string(),
                "**/.gradle/**".to_string(),
                "**/.idea/**".to_string(),
            ],
            variants: vec![],
            variant: None,
            traversal: TraversalRules::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".extractannotations.yml",
            ".extractannotations.yaml",
            ".extractannotations.toml",
            "extractannotations.yml",
            "extractannotations.yaml",
            "extractannotations.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Whether a merge input path matches one of the exclusion patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|pattern| glob_match(pattern, &path_str))
    }

    /// Strict typedef checks, from the config or the environment
    pub fn strict_typedefs_enabled(&self) -> bool {
        self.strict_typedefs
            || std::env::var(STRICT_TYPEDEFS_ENV)
                .map(|value| is_truthy(&value))
                .unwrap_or(false)
    }

    /// Variants this run covers; all of them when no variant is selected
    pub fn included_variants(&self) -> Vec<String> {
        match &self.variant {
            Some(variant) => vec![variant.clone()],
            None => self.variants.clone(),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

/// Simple glob matching for patterns like "*.jar" or "**/build/**"
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern.starts_with('*') && !pattern.contains('/') {
        return text.ends_with(&pattern[1..]);
    }

    if pattern.ends_with('*') && !pattern.contains('/') {
        return text.starts_with(&pattern[..pattern.len() - 1]);
    }

    if pattern.contains("**") {
        // "**/build/**" must match a whole directory name
        if pattern.starts_with("**/") && pattern.ends_with("/**") {
            let dir_name = pattern.replace("**/", "").replace("/**", "");
            let dir_pattern = format!("/{}/", dir_name.trim_matches('/'));
            let rooted = format!("/{}", text);
            return rooted.contains(&dir_pattern);
        }

        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if prefix.is_empty() && suffix.is_empty() {
                return true;
            }
            if prefix.is_empty() {
                return glob_match(suffix, text) || text.ends_with(suffix);
            }
            if suffix.is_empty() {
                return text.starts_with(prefix) || text.contains(&format!("{}/", prefix));
            }
            return (text.starts_with(prefix) || text.contains(&format!("/{}/", prefix)))
                && (text.ends_with(suffix) || glob_match(suffix, text));
        }
    }

    text == pattern
}
