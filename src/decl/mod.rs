//! Declaration tree produced by the source-analysis front end.
//!
//! The tree is consumed as JSON; nothing in this crate parses Java or Kotlin
//! sources itself.

mod declaration;

pub use declaration::{
    AnnotationOccurrence, AttributeExpr, ClassDecl, ClassKind, CompilationUnit, ConstantRef,
    DeclarationRef, Expr, FieldDecl, MethodDecl, ParameterDecl, Visibility,
};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Input to the extraction pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclarationTree {
    /// Units whose declarations are extracted
    pub units: Vec<CompilationUnit>,
    /// Units only consulted to resolve annotation type declarations
    pub classpath: Vec<CompilationUnit>,
}

impl DeclarationTree {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let tree = Self::from_json(&contents)?;
        debug!(
            "Loaded declaration tree {}: {} units, {} classpath units",
            path.display(),
            tree.units.len(),
            tree.classpath.len()
        );
        Ok(tree)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Looks up annotation type declarations by fully qualified name
pub trait TypeResolver {
    fn annotation_type(&self, fqn: &str) -> Option<&ClassDecl>;
}

/// Resolver that never finds anything; used for imported annotations
pub struct NoTypes;

impl TypeResolver for NoTypes {
    fn annotation_type(&self, _fqn: &str) -> Option<&ClassDecl> {
        None
    }
}

/// Index of every annotation type declared in a tree
pub struct AnnotationTypes<'a> {
    by_fqn: HashMap<String, &'a ClassDecl>,
}

impl<'a> AnnotationTypes<'a> {
    pub fn new(tree: &'a DeclarationTree) -> Self {
        let mut by_fqn = HashMap::new();
        for unit in tree.units.iter().chain(tree.classpath.iter()) {
            for class in &unit.classes {
                Self::collect(unit.package_name(), class, &mut by_fqn);
            }
        }
        Self { by_fqn }
    }

    fn collect(prefix: &str, class: &'a ClassDecl, by_fqn: &mut HashMap<String, &'a ClassDecl>) {
        if class.anonymous || class.name.is_empty() {
            return;
        }
        let fqn = qualify(prefix, &class.name);
        for nested in &class.classes {
            Self::collect(&fqn, nested, by_fqn);
        }
        if class.kind == ClassKind::Annotation {
            by_fqn.insert(fqn, class);
        }
    }

    pub fn len(&self) -> usize {
        self.by_fqn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fqn.is_empty()
    }
}

impl TypeResolver for AnnotationTypes<'_> {
    fn annotation_type(&self, fqn: &str) -> Option<&ClassDecl> {
        self.by_fqn.get(fqn).copied()
    }
}

/// Join a package or outer class name with a simple name
pub fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}
