pub mod context;
pub mod file;
pub mod options;

pub use context::build_context;
pub use file::{read_text_file, render_str, write_output};
pub use options::{merge, DefaultsSource, Options};
