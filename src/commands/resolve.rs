use std::path::{Path, PathBuf};

use console::style;
use miette::Result;

use mcresolver::config::Manifest;
use mcresolver::{report, ResolutionPlan, Resolver};

pub fn run(
    requirements: String,
    location: String,
    latest: bool,
    registry: Option<String>,
    no_configure: bool,
    dry_run: bool,
) -> Result<()> {
    let mut config = super::base_config()?;
    config.latest |= latest;
    config.no_configure |= no_configure;
    if let Some(registry) = registry {
        config.registry = Some(PathBuf::from(registry));
    }

    let manifest = Manifest::load(Path::new(&requirements))?;
    let resolver = Resolver::new(config)?;

    report::step(format!(
        "Resolving {} plugin(s) from {}",
        manifest.entries.len(),
        report::path(Path::new(&requirements))
    ));
    let plan = resolver.plan(&manifest);
    print_plan(&plan);

    if dry_run {
        println!(
            "\n{} Dry run \u{2013} nothing downloaded.",
            style("\u{2139}").blue().bold()
        );
        return Ok(());
    }

    let output = Path::new(&location);
    let result = resolver.execute(&plan, output)?;

    println!();
    report::success(format!(
        "{} downloaded, {} configured into {}",
        result.downloaded.len(),
        result.configured.len(),
        report::path(&output.join("plugins"))
    ));
    let failed = plan.failures.len() + result.failures.len();
    if failed > 0 {
        report::warn(format!("{failed} plugin(s) had problems; see above"));
    }
    Ok(())
}

fn print_plan(plan: &ResolutionPlan) {
    for warning in &plan.warnings {
        report::warn(warning);
    }
    for package in &plan.packages {
        let note = if package.fell_back_to_latest {
            style(format!(" (requested {})", package.requested)).yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} {} {}{note}",
            style(package.catalog).dim(),
            package.name,
            style(&package.handle.version).green()
        );
    }
    for (name, error) in &plan.failures {
        report::failure(format!("{name}: {error}"));
    }
}
