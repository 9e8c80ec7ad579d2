use super::eval::evaluate;
use super::names::{self, Retention};
use crate::api::ApiDatabase;
use crate::decl::{AnnotationOccurrence, ClassDecl, Expr, TypeResolver};
use crate::item::AnnotationData;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOptions {
    /// Also export class-retained annotations
    pub include_class_retention: bool,
}

/// Memoization tables for one run
#[derive(Debug, Default)]
pub struct FilterCache {
    known_magic: HashSet<String>,
    known_irrelevant: HashSet<String>,
    retention: HashMap<String, Retention>,
    reported_imports: HashSet<String>,
}

/// Decides which annotations are exported and under which canonical name.
#[derive(Debug, Default)]
pub struct AnnotationFilter {
    options: FilterOptions,
    cache: FilterCache,
}

impl AnnotationFilter {
    pub fn new(options: FilterOptions) -> Self {
        Self {
            options,
            cache: FilterCache::default(),
        }
    }

    /// Record a typedef annotation type found during extraction
    pub fn register_magic(&mut self, fqn: &str) {
        self.cache.known_irrelevant.remove(fqn);
        self.cache.known_magic.insert(fqn.to_string());
    }

    /// Whether `name` restricts values to named constants or a range.
    ///
    /// Besides the direct markers, an annotation type whose own declaration
    /// carries exactly one marker counts. Only one level is followed.
    pub fn is_magic_constant(&mut self, name: &str, types: &dyn TypeResolver) -> bool {
        if self.cache.known_magic.contains(name) || names::is_magic_marker(name) {
            return true;
        }
        if self.cache.known_irrelevant.contains(name) {
            return false;
        }

        let magic = types
            .annotation_type(name)
            .map(|decl| {
                decl.annotations
                    .iter()
                    .filter(|a| names::is_magic_marker(&a.name))
                    .count()
                    == 1
            })
            .unwrap_or(false);

        trace!("Resolved {} as magic constant: {}", name, magic);
        if magic {
            self.cache.known_magic.insert(name.to_string());
        } else {
            self.cache.known_irrelevant.insert(name.to_string());
        }
        magic
    }

    /// Retention of an annotation type. `canonical` is checked against the
    /// fixed table, `declared` is the name its declaration is resolved by.
    pub fn retention(&mut self, canonical: &str, declared: &str, types: &dyn TypeResolver) -> Retention {
        if let Some(retention) = names::known_retention(canonical) {
            return retention;
        }
        if let Some(retention) = self.cache.retention.get(declared) {
            return *retention;
        }
        let retention = types
            .annotation_type(declared)
            .map(declared_retention)
            .unwrap_or(Retention::Class);
        self.cache.retention.insert(declared.to_string(), retention);
        retention
    }

    fn is_exported_retention(&mut self, canonical: &str, declared: &str, types: &dyn TypeResolver) -> bool {
        self.options.include_class_retention
            || self.retention(canonical, declared, types) == Retention::Source
    }

    /// Canonical name of a relevant annotation, `None` if it is not exported
    pub fn canonical_name(&mut self, name: &str, types: &dyn TypeResolver) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        if let Some(nullability) = names::canonical_nullability(name) {
            return Some(nullability.to_string());
        }
        if names::is_keep(name) {
            return Some(names::KEEP.to_string());
        }
        if name == names::RETENTION {
            return Some(name.to_string());
        }
        if name.starts_with(names::GENERIC_PREFIX) {
            return None;
        }
        if names::is_magic_marker(name) {
            return Some(names::to_canonical(name));
        }
        if name.starts_with(names::SUPPORT_PREFIX) {
            return Some(names::to_canonical(name));
        }
        if name.starts_with(names::CANONICAL_PREFIX) {
            return Some(name.to_string());
        }
        if let Some(simple) = name.strip_prefix(names::PLATFORM_PREFIX) {
            if names::is_platform_tool_only(name) {
                return None;
            }
            let canonical = names::to_canonical(name);
            if simple.ends_with(names::RESOURCE_TYPE_SUFFIX)
                || self.is_exported_retention(&canonical, name, types)
            {
                return Some(canonical);
            }
            return None;
        }
        if self.is_magic_constant(name, types) {
            return Some(name.to_string());
        }
        if self.is_exported_retention(name, name, types) {
            return Some(name.to_string());
        }
        None
    }

    pub fn is_relevant(&mut self, name: &str, types: &dyn TypeResolver) -> bool {
        self.canonical_name(name, types).is_some()
    }

    /// Normalize one annotation occurrence found on a declaration
    pub fn normalize(
        &mut self,
        occurrence: &AnnotationOccurrence,
        types: &dyn TypeResolver,
        api: Option<&dyn ApiDatabase>,
    ) -> Option<AnnotationData> {
        let name = self.canonical_name(&occurrence.name, types)?;
        if name == names::MAGIC_CONSTANT {
            return Some(convert_magic_constant(occurrence, api));
        }
        // A project typedef is written as the marker it wraps: the typedef
        // class itself may be stripped from the compiled output.
        if let Some(marker) = self.typedef_marker(&name, types) {
            trace!("Inlining typedef {} as {}", name, marker.name);
            return self.normalize(&marker, types, api);
        }

        let mut data = AnnotationData::new(name);
        for attribute in &occurrence.attributes {
            match evaluate(&attribute.value) {
                Some(value) => data.attributes.push((attribute.name.clone(), value)),
                None => {
                    debug!(
                        "Dropping unresolvable attribute {} of @{}",
                        attribute.name, occurrence.name
                    );
                    data.dropped += 1;
                }
            }
        }
        Some(data)
    }

    /// The marker carried by the declaration of a typedef annotation type
    fn typedef_marker(&self, name: &str, types: &dyn TypeResolver) -> Option<AnnotationOccurrence> {
        if names::is_magic_marker(name) || !self.cache.known_magic.contains(name) {
            return None;
        }
        types
            .annotation_type(name)?
            .annotations
            .iter()
            .find(|a| names::is_magic_marker(&a.name))
            .cloned()
    }

    /// Normalize an annotation read from an imported database
    pub fn normalize_import(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
        types: &dyn TypeResolver,
    ) -> Option<AnnotationData> {
        match self.canonical_name(name, types) {
            Some(canonical) if canonical == names::MAGIC_CONSTANT => {
                let data = convert_imported_magic_constant(attributes);
                if data.is_empty_after_drop() {
                    debug!("Dropping imported @{} with no usable values", name);
                    return None;
                }
                Some(data)
            }
            Some(canonical) => {
                let mut data = AnnotationData::new(canonical);
                data.attributes = attributes.to_vec();
                Some(data)
            }
            None => {
                if self.cache.reported_imports.insert(name.to_string()) {
                    debug!("{}", crate::error::ExtractError::UnsupportedAnnotationImport {
                        name: name.to_string(),
                    });
                }
                None
            }
        }
    }
}

/// Retention declared on an annotation type via `@Retention`; CLASS if absent
fn declared_retention(decl: &ClassDecl) -> Retention {
    decl.annotations
        .iter()
        .find(|a| a.name == names::RETENTION)
        .and_then(|a| a.attribute("value"))
        .and_then(evaluate)
        .and_then(|policy| Retention::from_policy(&policy))
        .unwrap_or(Retention::Class)
}

/// Rewrite IntelliJ's `@MagicConstant` into the equivalent typedef
fn convert_magic_constant(
    occurrence: &AnnotationOccurrence,
    api: Option<&dyn ApiDatabase>,
) -> AnnotationData {
    let mut data = AnnotationData::new(names::INT_DEF);
    let mut flag = false;

    for attribute in &occurrence.attributes {
        let value = match attribute.name.as_str() {
            "intValues" => evaluate(&attribute.value),
            "stringValues" => {
                data.name = names::STRING_DEF.to_string();
                evaluate(&attribute.value)
            }
            "flags" => {
                flag = true;
                evaluate(&attribute.value)
            }
            "valuesFromClass" | "flagsFromClass" => {
                flag |= attribute.name == "flagsFromClass";
                class_constants(&attribute.value, api)
            }
            _ => None,
        };
        match value {
            Some(value) => data.attributes.push(("value".to_string(), value)),
            None => data.dropped += 1,
        }
    }

    if flag && !data.attributes.is_empty() {
        data.attributes.push(("flag".to_string(), "true".to_string()));
    }
    data
}

/// Same rewrite for an imported `@MagicConstant` whose values are already
/// rendered. Class-based sources cannot be expanded without an API database.
fn convert_imported_magic_constant(attributes: &[(String, String)]) -> AnnotationData {
    let mut data = AnnotationData::new(names::INT_DEF);
    let mut flag = false;

    for (name, value) in attributes {
        match name.as_str() {
            "intValues" => {}
            "stringValues" => data.name = names::STRING_DEF.to_string(),
            "flags" => flag = true,
            _ => {
                data.dropped += 1;
                continue;
            }
        }
        data.attributes.push(("value".to_string(), value.clone()));
    }

    if flag {
        data.attributes.push(("flag".to_string(), "true".to_string()));
    }
    data
}

/// Expand `X.class` into `{X.A, X.B, ...}` using the API database
fn class_constants(expr: &Expr, api: Option<&dyn ApiDatabase>) -> Option<String> {
    let class = match expr {
        Expr::Class(class) => class,
        _ => return None,
    };
    let constants = api?.int_constants(class);
    if constants.is_empty() {
        return None;
    }
    Some(format!("{{{}}}", constants.join(", ")))
}
