// API signature listing parser
//
// Format (modelled on ProGuard's member listings):
// ```
// package android.app
// android.app.Activity
//     int RESULT_OK
//     void onCreate(android.os.Bundle)
//     Activity()
// ```
// Unindented lines name classes, indented lines are members of the class
// above them. `#` starts a comment line.

use super::ApiDatabase;
use crate::error::{ExtractError, Result};
use crate::item::signature::{compact_parameter_list, normalize_parameter_list, package_of_class, simple_name};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct ApiClass {
    /// (name, type) in declaration order
    fields: Vec<(String, String)>,
    /// (name, compacted parameter list)
    methods: HashSet<(String, String)>,
}

/// In-memory API surface loaded from a signature listing
#[derive(Debug, Clone, Default)]
pub struct ApiSurface {
    packages: HashSet<String>,
    classes: HashMap<String, ApiClass>,
}

impl ApiSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an API listing file
    pub fn parse(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse_content(&content).map_err(|(line, message)| ExtractError::ApiParse {
            path: path.to_path_buf(),
            line,
            message,
        })
    }

    /// Parse listing content; errors carry the 1-based line number
    pub fn parse_content(content: &str) -> std::result::Result<Self, (usize, String)> {
        let mut surface = ApiSurface::default();
        let mut current_class: Option<String> = None;

        for (number, line) in content.lines().enumerate() {
            let line = line.trim_end();
            let trimmed = line.trim_start();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                let class_name = current_class
                    .as_ref()
                    .ok_or_else(|| (number + 1, format!("member outside of a class: {}", trimmed)))?;
                surface
                    .add_member(class_name, trimmed)
                    .map_err(|message| (number + 1, message))?;
            } else if let Some(package) = trimmed.strip_prefix("package ") {
                surface.add_package(package.trim());
            } else {
                surface.add_class(trimmed);
                current_class = Some(trimmed.to_string());
            }
        }

        debug!(
            "Parsed API surface: {} packages, {} classes",
            surface.packages.len(),
            surface.classes.len()
        );
        Ok(surface)
    }

    pub fn add_package(&mut self, name: &str) {
        self.packages.insert(name.to_string());
    }

    pub fn add_class(&mut self, fqn: &str) {
        self.packages.insert(package_of_class(fqn));
        self.classes.entry(fqn.to_string()).or_default();
    }

    pub fn add_field(&mut self, class: &str, type_name: &str, name: &str) {
        self.add_class(class);
        if let Some(entry) = self.classes.get_mut(class) {
            entry.fields.push((name.to_string(), type_name.to_string()));
        }
    }

    /// `params` may use any spacing; it is normalized before storing
    pub fn add_method(&mut self, class: &str, name: &str, params: &str) {
        self.add_class(class);
        let params = compact_parameter_list(&normalize_parameter_list(params));
        if let Some(entry) = self.classes.get_mut(class) {
            entry.methods.insert((name.to_string(), params));
        }
    }

    fn add_member(&mut self, class: &str, line: &str) -> std::result::Result<(), String> {
        if let Some(open) = line.find('(') {
            let close = line
                .rfind(')')
                .filter(|&close| close > open)
                .ok_or_else(|| format!("unbalanced parentheses: {}", line))?;
            let head = &line[..open];
            let params = &line[open + 1..close];
            let tokens: Vec<&str> = head.split_whitespace().collect();
            let name = match tokens.last() {
                None => return Err(format!("missing method name: {}", line)),
                Some(&"<init>") => simple_name(class),
                Some(&last) if tokens.len() == 1 => simple_name(last),
                Some(&last) => last,
            };
            let name = name.to_string();
            self.add_method(class, &name, params);
        } else {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                return Err(format!("field without type: {}", line));
            }
            let name = tokens[tokens.len() - 1];
            let type_name = tokens[tokens.len() - 2];
            self.add_field(class, type_name, name);
        }
        Ok(())
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

impl ApiDatabase for ApiSurface {
    fn has_package(&self, name: &str) -> bool {
        self.packages.contains(name)
    }

    fn has_class(&self, fqn: &str) -> bool {
        self.classes.contains_key(fqn)
    }

    fn has_field(&self, class: &str, name: &str) -> bool {
        self.classes
            .get(class)
            .map(|c| c.fields.iter().any(|(n, _)| n == name))
            .unwrap_or(false)
    }

    fn has_method(&self, class: &str, name: &str, params: &str) -> bool {
        let params = compact_parameter_list(&normalize_parameter_list(params));
        self.classes
            .get(class)
            .map(|c| c.methods.contains(&(name.to_string(), params)))
            .unwrap_or(false)
    }

    fn int_constants(&self, class: &str) -> Vec<String> {
        self.classes
            .get(class)
            .map(|c| {
                c.fields
                    .iter()
                    .filter(|(_, type_name)| type_name == "int")
                    .map(|(name, _)| format!("{}.{}", class, name))
                    .collect()
            })
            .unwrap_or_default()
    }
}
