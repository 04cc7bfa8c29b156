use std::path::Path;

use console::style;
use miette::Result;

use mcresolver::{plan_templates, report, write_templates};

pub fn run(config: String, plugin: String, output: String, dry_run: bool) -> Result<()> {
    let config_file = Path::new(&config);
    let output_dir = Path::new(&output);
    let artifacts = plan_templates(config_file, &plugin)?;

    if dry_run {
        for (path, content) in [
            (artifacts.template_path(output_dir), &artifacts.template),
            (artifacts.defaults_path(output_dir), &artifacts.defaults),
        ] {
            println!("{} {}", style("create").green(), report::path(&path));
            println!("  {}", style("──────").dim());
            for line in content.lines() {
                println!("  {line}");
            }
            println!("  {}", style("──────").dim());
        }
        println!(
            "\n{} Dry run \u{2013} no files written.",
            style("\u{2139}").blue().bold()
        );
        return Ok(());
    }

    let (template, defaults) = write_templates(&artifacts, output_dir)?;
    report::success(format!(
        "Generated {} variable(s) from {}",
        artifacts.variable_count,
        report::path(config_file)
    ));
    println!("  template: {}", report::path(&template));
    println!("  defaults: {}", report::path(&defaults));
    Ok(())
}
