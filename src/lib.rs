//! extractannotations - external annotation databases for Android (Kotlin/Java)
//!
//! Builds the `annotations.xml` database that tooling applies to compiled
//! code without touching it, plus the ProGuard keep rules and the hidden
//! typedef manifest that go with it.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! 1. **Extraction** - Walk a declaration tree and collect relevant annotations
//! 2. **Merge** - Fold in databases exported by other modules or platform archives
//! 3. **Export** - Write the per-package archive, keep rules and typedef manifest
//!
//! All three passes share one [`Session`], which owns the item index, the
//! keep/typedef tracker, the statistics and the annotation filter caches.

pub mod annotations;
pub mod api;
pub mod config;
pub mod decl;
pub mod error;
pub mod export;
pub mod extract;
pub mod item;
pub mod merge;
pub mod stats;

pub use api::{ApiDatabase, ApiSurface};
pub use config::Config;
pub use decl::DeclarationTree;
pub use error::{ExtractError, Result};
pub use export::{write_keep_rules, write_typedef_manifest, AnnotationsWriter, Validation};
pub use extract::{Extractor, Session, Tracker};
pub use item::{AnnotationData, Item, ItemIndex, ItemKind, MethodSig};
pub use merge::{Merger, MergeSummary};
pub use stats::{Stats, TerminalReport};
