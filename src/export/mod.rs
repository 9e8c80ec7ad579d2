// Output stage: the annotation database archive, the keep-rule file and the
// hidden typedef manifest.

mod keep;
mod typedefs;
mod writer;

pub use keep::{keep_rule, write_keep_rules};
pub use typedefs::write_typedef_manifest;
pub use writer::{validate_document, AnnotationsWriter, ExportSummary, RenderedDocument, Validation};
