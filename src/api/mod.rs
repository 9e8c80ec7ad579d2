// API-surface database
//
// An optional authority listing which packages, classes, fields and methods
// make up a public surface. Items it does not know about are dropped.

mod surface;

pub use surface::ApiSurface;

/// Lookup interface for an API-surface database.
///
/// `params` passed to [`ApiDatabase::has_method`] uses the formatted parameter
/// list with top-level separators compacted, e.g. `int,int` or
/// `Map<String,Integer>,int`.
pub trait ApiDatabase {
    fn has_package(&self, name: &str) -> bool;
    fn has_class(&self, fqn: &str) -> bool;
    fn has_field(&self, class: &str, name: &str) -> bool;
    fn has_method(&self, class: &str, name: &str, params: &str) -> bool;
    /// Fully qualified `int` constants declared by a class, in declaration order
    fn int_constants(&self, class: &str) -> Vec<String>;
}
