use std::path::PathBuf;

use console::style;
use miette::Result;

use mcresolver::check::check_registry;

pub fn run(path: Option<String>) -> Result<()> {
    let registry = match path {
        Some(path) => PathBuf::from(path),
        None => super::base_config()?
            .registry
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    println!(
        "{} {}",
        style("Checking configurators in").bold(),
        style(registry.display()).cyan()
    );

    let result = check_registry(&registry)?;

    for unit in &result.units {
        println!(
            "  {} {} [{}]",
            unit.path.file_name().unwrap_or_default().to_string_lossy(),
            style(&unit.package_id).green(),
            unit.versions.join(", ")
        );
    }

    if !result.warnings.is_empty() {
        println!("\n{}", style("Warnings:").yellow().bold());
        for w in &result.warnings {
            println!("  {} {}", style("⚠").yellow(), w);
        }
    }

    if !result.errors.is_empty() {
        println!("\n{}", style("Errors:").red().bold());
        for e in &result.errors {
            println!("  {} {}", style("✗").red(), e);
        }
        println!(
            "\n{} Registry has {} error(s)",
            style("✗").red().bold(),
            result.errors.len()
        );
        std::process::exit(1);
    } else {
        println!("\n{} Registry is valid!", style("✓").green().bold());
    }

    Ok(())
}
