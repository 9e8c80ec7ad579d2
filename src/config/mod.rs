mod loader;

pub use loader::{glob_match, Config, TraversalRules, STRICT_TYPEDEFS_ENV};
