//! Items: declarations that carry annotations worth exporting.

mod index;
pub mod signature;

pub use index::ItemIndex;

use crate::api::ApiDatabase;
use crate::decl::{ClassKind, DeclarationRef};
use signature::{compact_parameter_list, escape_xml};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A normalized annotation.
///
/// Equality and hashing only look at the name: an item carries at most one
/// annotation of a given name.
#[derive(Debug, Clone)]
pub struct AnnotationData {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Attributes that could not be evaluated and were dropped
    pub dropped: usize,
}

impl AnnotationData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            dropped: 0,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every declared attribute failed to evaluate; such annotations are not written
    pub fn is_empty_after_drop(&self) -> bool {
        self.attributes.is_empty() && self.dropped > 0
    }

    /// Carries an `apis` attribute: kept even when no longer in the current API
    pub fn is_historic(&self) -> bool {
        self.attribute("apis").is_some()
    }
}

impl PartialEq for AnnotationData {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for AnnotationData {}

impl Hash for AnnotationData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Method or constructor identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    /// Absent for constructors
    pub return_type: Option<String>,
    /// Formatted parameter list, e.g. `Map<String,Integer>, int`
    pub parameters: String,
    pub constructor: bool,
}

impl MethodSig {
    pub fn method(
        name: impl Into<String>,
        return_type: impl Into<String>,
        parameters: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            return_type: Some(return_type.into()),
            parameters: parameters.into(),
            constructor: false,
        }
    }

    pub fn constructor(name: impl Into<String>, parameters: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: None,
            parameters: parameters.into(),
            constructor: true,
        }
    }

    fn render(&self, container: &str) -> String {
        match &self.return_type {
            Some(ret) if !self.constructor => {
                format!("{} {} {}({})", container, ret, self.name, self.parameters)
            }
            _ => format!("{} {}({})", container, self.name, self.parameters),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Package,
    Class,
    Field {
        name: String,
        type_name: Option<String>,
    },
    Method(MethodSig),
    Parameter {
        method: MethodSig,
        index: usize,
    },
}

impl ItemKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ItemKind::Package => "package",
            ItemKind::Class => "class",
            ItemKind::Field { .. } => "field",
            ItemKind::Method(sig) if sig.constructor => "constructor",
            ItemKind::Method(_) => "method",
            ItemKind::Parameter { .. } => "parameter",
        }
    }
}

/// One annotated declaration
#[derive(Debug, Clone)]
pub struct Item {
    /// Containing class FQN, or the package name for package items
    pub container: String,
    pub container_kind: ClassKind,
    pub kind: ItemKind,
    pub annotations: Vec<AnnotationData>,
    pub origin: Option<DeclarationRef>,
}

impl Item {
    pub fn new(container: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            container: container.into(),
            container_kind: ClassKind::Class,
            kind,
            annotations: Vec::new(),
            origin: None,
        }
    }

    pub fn package(name: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Package)
    }

    pub fn class(fqn: impl Into<String>, kind: ClassKind) -> Self {
        Self::new(fqn, ItemKind::Class).with_container_kind(kind)
    }

    pub fn field(class: impl Into<String>, name: impl Into<String>, type_name: Option<String>) -> Self {
        Self::new(
            class,
            ItemKind::Field {
                name: name.into(),
                type_name,
            },
        )
    }

    pub fn method(class: impl Into<String>, sig: MethodSig) -> Self {
        Self::new(class, ItemKind::Method(sig))
    }

    pub fn parameter(class: impl Into<String>, method: MethodSig, index: usize) -> Self {
        Self::new(class, ItemKind::Parameter { method, index })
    }

    pub fn with_container_kind(mut self, kind: ClassKind) -> Self {
        self.container_kind = kind;
        self
    }

    pub fn with_origin(mut self, origin: DeclarationRef) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationData) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Signature before XML escaping
    pub fn raw_signature(&self) -> String {
        match &self.kind {
            ItemKind::Package | ItemKind::Class => self.container.clone(),
            ItemKind::Field { name, .. } => format!("{} {}", self.container, name),
            ItemKind::Method(sig) => sig.render(&self.container),
            ItemKind::Parameter { method, index } => {
                format!("{} {}", method.render(&self.container), index)
            }
        }
    }

    /// Canonical (escaped) signature used for identity and as the `name` attribute
    pub fn signature(&self) -> String {
        escape_xml(&self.raw_signature())
    }

    /// Key for ordering items the way consumers of the database expect
    pub fn sort_signature(&self) -> String {
        self.signature().replace('&', ".")
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == name)
    }

    pub fn annotation(&self, name: &str) -> Option<&AnnotationData> {
        self.annotations.iter().find(|a| a.name == name)
    }

    /// Whether any annotation would survive serialization
    pub fn has_writable_annotations(&self) -> bool {
        self.annotations.iter().any(|a| !a.is_empty_after_drop())
    }

    pub fn is_historic(&self) -> bool {
        self.annotations.iter().any(AnnotationData::is_historic)
    }

    /// Check this item against an API-surface database
    pub fn is_known_to(&self, api: &dyn ApiDatabase) -> bool {
        match &self.kind {
            ItemKind::Package => api.has_package(&self.container),
            ItemKind::Class => api.has_class(&self.container),
            ItemKind::Field { name, .. } => api.has_field(&self.container, name),
            ItemKind::Method(sig) | ItemKind::Parameter { method: sig, .. } => api.has_method(
                &self.container,
                &sig.name,
                &compact_parameter_list(&sig.parameters),
            ),
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.signature() == other.signature()
    }
}

impl Eq for Item {}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Item {
    /// Sort signatures compared ignoring ASCII case, so an escaped generic
    /// class (`Outer.lt;T.gt;`) lands right before the nested `Outer.Inner`
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.sort_signature(), other.sort_signature());
        a.to_ascii_lowercase()
            .cmp(&b.to_ascii_lowercase())
            .then_with(|| a.cmp(&b))
            .then_with(|| self.signature().cmp(&other.signature()))
    }
}
