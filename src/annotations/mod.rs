// Relevance filtering and name normalization for annotations
//
// Legacy support and platform names are rewritten into the canonical
// `androidx.annotation` namespace, nullability markers from the historical
// namespaces collapse into one pair, and typedef ("magic constant")
// annotations are detected directly or through one level of indirection.

mod eval;
mod filter;
pub mod names;

pub use eval::evaluate;
pub use filter::{AnnotationFilter, FilterCache, FilterOptions};
pub use names::Retention;
