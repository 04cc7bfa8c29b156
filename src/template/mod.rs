pub mod comments;
pub mod emit;
pub mod flatten;
pub mod naming;
pub mod synthesize;

pub use comments::reattach_comments;
pub use flatten::{flatten, unflatten, FlatPath, FlatValue};
pub use naming::derive_variable_names;
pub use synthesize::{synthesize, synthesize_document, SynthesizedTemplate, TypedDefault};
