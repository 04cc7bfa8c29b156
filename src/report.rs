//! Console output shared by the library and the CLI.

use std::fmt::Display;
use std::path::Path;

use console::{style, StyledObject};

pub fn warn(message: impl Display) {
    eprintln!(
        "{} {}",
        style("warning:").yellow().bold(),
        style(message).yellow()
    );
}

pub fn failure(message: impl Display) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), message);
}

pub fn step(message: impl Display) {
    println!("{} {}", style("==>").cyan().bold(), message);
}

pub fn success(message: impl Display) {
    println!("{} {}", style("\u{2713}").green().bold(), message);
}

/// A path styled for inclusion in a message.
pub fn path(path: &Path) -> StyledObject<String> {
    style(path.display().to_string()).cyan()
}
