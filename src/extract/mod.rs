//! Extraction pass: walks a declaration tree once and builds items for the
//! declarations that carry relevant annotations.

mod tracker;

pub use tracker::Tracker;

use crate::annotations::names;
use crate::annotations::{AnnotationFilter, FilterOptions, Retention};
use crate::api::ApiDatabase;
use crate::config::{Config, TraversalRules};
use crate::decl::{
    qualify, AnnotationOccurrence, AnnotationTypes, ClassDecl, ClassKind, CompilationUnit,
    DeclarationRef, DeclarationTree, MethodDecl, TypeResolver,
};
use crate::error::{ExtractError, Result};
use crate::item::signature::{format_parameter_list, format_type, internal_name, simple_name};
use crate::item::{AnnotationData, Item, ItemIndex, MethodSig};
use crate::stats::Stats;
use tracing::{debug, info, warn};

/// Method whose return nullability is never recorded
const FIND_VIEW_BY_ID: &str = "findViewById";

/// Mutable state shared by the extraction and merge passes of one run
#[derive(Debug, Default)]
pub struct Session {
    pub index: ItemIndex,
    pub tracker: Tracker,
    pub stats: Stats,
    pub filter: AnnotationFilter,
}

impl Session {
    pub fn new(options: FilterOptions) -> Self {
        Self {
            filter: AnnotationFilter::new(options),
            ..Default::default()
        }
    }

    /// Session configured from the run configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(FilterOptions {
            include_class_retention: config.include_class_retention,
        })
    }

    /// Route an item into the index, or into the keep list if keep-marked.
    ///
    /// Returns whether the item was accepted.
    pub fn add(&mut self, package: &str, item: Item, api: Option<&dyn ApiDatabase>) -> bool {
        if item.has_annotation(names::KEEP) {
            if self.tracker.divert(&mut self.index, item) {
                self.stats.kept += 1;
            }
            return true;
        }
        self.index.add_item(package, item, api, &mut self.stats)
    }
}

/// Builds items from a declaration tree into a [`Session`]
pub struct Extractor<'a> {
    session: &'a mut Session,
    api: Option<&'a dyn ApiDatabase>,
    rules: TraversalRules,
    strict_typedefs: bool,
}

impl<'a> Extractor<'a> {
    pub fn new(session: &'a mut Session, config: &Config, api: Option<&'a dyn ApiDatabase>) -> Self {
        Self {
            session,
            api,
            rules: config.traversal,
            strict_typedefs: config.strict_typedefs_enabled(),
        }
    }

    /// Walk every compilation unit of the tree.
    ///
    /// Only typedef convention violations in strict mode are returned as
    /// errors; declarations that cannot form an item are skipped.
    pub fn extract(&mut self, tree: &DeclarationTree) -> Result<()> {
        let types = AnnotationTypes::new(tree);
        debug!("Resolved {} annotation type declarations", types.len());

        for unit in &tree.units {
            self.visit_unit(unit, &types)?;
        }

        info!(
            "Extracted {} annotations on {} items",
            self.session.stats.total_extracted(),
            self.session.index.len()
        );
        Ok(())
    }

    fn visit_unit(&mut self, unit: &CompilationUnit, types: &dyn TypeResolver) -> Result<()> {
        let package = unit.package_name();
        if !package.is_empty() && !unit.annotations.is_empty() {
            let item = Item::package(package).with_origin(origin(unit, package));
            self.record(package, item, &unit.annotations, types);
        }
        for class in &unit.classes {
            self.visit_class(unit, &[], class, types)?;
        }
        Ok(())
    }

    /// `outer` holds the simple names of the enclosing classes
    fn visit_class(
        &mut self,
        unit: &CompilationUnit,
        outer: &[&str],
        class: &ClassDecl,
        types: &dyn TypeResolver,
    ) -> Result<()> {
        if class.anonymous && !self.rules.anonymous_classes {
            return Ok(());
        }
        if class.name.is_empty() {
            debug!("Skipping unnamed class in {}", unit.display_path());
            return Ok(());
        }

        let package = unit.package_name();
        let mut nesting: Vec<&str> = outer.to_vec();
        nesting.push(&class.name);
        let fqn = qualify(package, &nesting.join("."));

        if class.kind == ClassKind::Annotation {
            self.inspect_typedef(package, &nesting, &fqn, class, types)?;
        } else {
            let item = Item::class(&fqn, class.kind).with_origin(origin(unit, &fqn));
            self.record(package, item, &class.annotations, types);

            for field in &class.fields {
                if field.name.is_empty() {
                    continue;
                }
                let item = Item::field(&fqn, &field.name, field.type_name.as_deref().map(format_type))
                    .with_container_kind(class.kind)
                    .with_origin(origin(unit, &format!("{}.{}", fqn, field.name)));
                self.record(package, item, &field.annotations, types);

                if self.rules.initializers {
                    for local in &field.initializer_classes {
                        self.visit_class(unit, &nesting, local, types)?;
                    }
                }
            }

            for method in &class.methods {
                self.visit_method(unit, &fqn, class.kind, method, types);
                if self.rules.method_bodies {
                    for local in &method.body_classes {
                        self.visit_class(unit, &nesting, local, types)?;
                    }
                }
            }
        }

        for inner in &class.classes {
            self.visit_class(unit, &nesting, inner, types)?;
        }
        Ok(())
    }

    fn visit_method(
        &mut self,
        unit: &CompilationUnit,
        class_fqn: &str,
        class_kind: ClassKind,
        method: &MethodDecl,
        types: &dyn TypeResolver,
    ) {
        let name = if method.constructor && method.name.is_empty() {
            simple_name(class_fqn)
        } else {
            method.name.as_str()
        };
        if name.is_empty() {
            return;
        }

        let parameters = format_parameter_list(method.parameters.iter().map(|p| p.type_name.as_str()));
        let sig = if method.constructor {
            MethodSig::constructor(name, parameters)
        } else {
            let return_type = method.return_type.as_deref().unwrap_or("void");
            MethodSig::method(name, format_type(return_type), parameters)
        };
        let package = unit.package_name();
        let origin_name = format!("{}.{}", class_fqn, name);

        let mut annotations = self.normalize_all(&method.annotations, types);
        if name == FIND_VIEW_BY_ID {
            // Nullness here would flag nearly every caller
            annotations.retain(|a| a.name != names::NULLABLE && a.name != names::NON_NULL);
        }
        if !annotations.is_empty() {
            let mut item = Item::method(class_fqn, sig.clone())
                .with_container_kind(class_kind)
                .with_origin(origin(unit, &origin_name));
            item.annotations = annotations;
            self.add(package, item);
        }

        for (index, parameter) in method.parameters.iter().enumerate() {
            let item = Item::parameter(class_fqn, sig.clone(), index)
                .with_container_kind(class_kind)
                .with_origin(origin(unit, &origin_name));
            self.record(package, item, &parameter.annotations, types);
        }
    }

    /// Annotation types marked as typedefs are not items themselves; they
    /// feed the magic-constant cache and the hidden typedef list.
    fn inspect_typedef(
        &mut self,
        package: &str,
        nesting: &[&str],
        fqn: &str,
        class: &ClassDecl,
        types: &dyn TypeResolver,
    ) -> Result<()> {
        if !class.annotations.iter().any(|a| names::is_typedef_marker(&a.name)) {
            return Ok(());
        }
        self.session.filter.register_magic(fqn);

        let public = class.visibility.is_public();
        if !public {
            self.session.tracker.add_hidden_typedef(internal_name(package, nesting));
        }

        if self.session.filter.retention(fqn, fqn, types) != Retention::Source {
            self.typedef_violation(format!(
                "{} should be annotated @Retention(RetentionPolicy.SOURCE)",
                fqn
            ))?;
        }
        if public && !class.is_doc_hidden() {
            self.typedef_violation(format!(
                "{} should be marked @hide or made package private",
                fqn
            ))?;
        }
        Ok(())
    }

    fn typedef_violation(&self, message: String) -> Result<()> {
        if self.strict_typedefs {
            return Err(ExtractError::TypedefConvention(message));
        }
        warn!("Typedef convention: {}", message);
        Ok(())
    }

    fn normalize_all(
        &mut self,
        occurrences: &[AnnotationOccurrence],
        types: &dyn TypeResolver,
    ) -> Vec<AnnotationData> {
        let mut annotations: Vec<AnnotationData> = Vec::new();
        for occurrence in occurrences {
            if let Some(data) = self.session.filter.normalize(occurrence, types, self.api) {
                if !annotations.contains(&data) {
                    annotations.push(data);
                }
            }
        }
        annotations
    }

    fn record(
        &mut self,
        package: &str,
        mut item: Item,
        occurrences: &[AnnotationOccurrence],
        types: &dyn TypeResolver,
    ) {
        if occurrences.is_empty() {
            return;
        }
        item.annotations = self.normalize_all(occurrences, types);
        if !item.annotations.is_empty() {
            self.add(package, item);
        }
    }

    fn add(&mut self, package: &str, item: Item) {
        self.session.stats.record_extracted(&item);
        self.session.add(package, item, self.api);
    }
}

fn origin(unit: &CompilationUnit, name: &str) -> DeclarationRef {
    DeclarationRef {
        file: unit.path.clone(),
        name: name.to_string(),
    }
}
