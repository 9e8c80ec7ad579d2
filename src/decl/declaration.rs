use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Kind of a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

impl ClassKind {
    /// Keyword used for this kind in ProGuard keep rules
    pub fn keep_keyword(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            // ProGuard treats annotation types as interfaces
            ClassKind::Interface | ClassKind::Annotation => "interface",
            ClassKind::Enum => "enum",
        }
    }
}

/// Visibility modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// An attribute expression as delivered by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    /// Raw literal text, e.g. `5`, `"foo"`, `true`, `-1L`
    Literal(String),
    /// Reference to a constant field
    Reference(ConstantRef),
    /// Class literal, e.g. `android.view.View.class`
    Class(String),
    Array(Vec<Expr>),
    /// Expression the front end could not resolve
    Unresolved(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantRef {
    /// Fully qualified containing class; absent when unresolved
    #[serde(default)]
    pub qualifier: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeExpr {
    pub name: String,
    pub value: Expr,
}

/// One annotation occurrence on a declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationOccurrence {
    /// Resolved fully qualified annotation type name
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeExpr>,
}

impl AnnotationOccurrence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Expr) -> Self {
        self.attributes.push(AttributeExpr {
            name: name.into(),
            value,
        });
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Expr> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub annotations: Vec<AnnotationOccurrence>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub visibility: Visibility,
    pub annotations: Vec<AnnotationOccurrence>,
    /// Anonymous classes created in the initializer
    pub initializer_classes: Vec<ClassDecl>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodDecl {
    pub name: String,
    /// Absent for constructors
    pub return_type: Option<String>,
    pub constructor: bool,
    pub visibility: Visibility,
    pub parameters: Vec<ParameterDecl>,
    pub annotations: Vec<AnnotationOccurrence>,
    /// Local and anonymous classes declared in the body
    pub body_classes: Vec<ClassDecl>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDecl {
    /// Simple name
    pub name: String,
    pub kind: ClassKind,
    pub visibility: Visibility,
    /// Raw doc comment, if any
    pub doc: Option<String>,
    pub anonymous: bool,
    pub annotations: Vec<AnnotationOccurrence>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    /// Member classes
    pub classes: Vec<ClassDecl>,
}

impl ClassDecl {
    /// Whether the doc comment carries `@hide`
    pub fn is_doc_hidden(&self) -> bool {
        self.doc
            .as_deref()
            .map(|doc| doc.contains("@hide"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilationUnit {
    pub path: Option<PathBuf>,
    pub package: Option<String>,
    /// Package annotations (package-info)
    pub annotations: Vec<AnnotationOccurrence>,
    pub classes: Vec<ClassDecl>,
}

impl CompilationUnit {
    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }

    pub fn display_path(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }
}

/// Reference back to the declaration an item was built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationRef {
    pub file: Option<PathBuf>,
    pub name: String,
}

impl std::fmt::Display for DeclarationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{} ({})", self.name, file.display()),
            None => write!(f, "{}", self.name),
        }
    }
}
