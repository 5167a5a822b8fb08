//! `psplit strip`: run the stripper over a single file for one package.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::cli::{AppContext, StripArgs};
use crate::infra::config::load_config;
use crate::infra::io::{read_file_smart, write_output};
use crate::strip::pipeline::Stripper;

pub fn run(args: StripArgs, ctx: &AppContext) -> Result<()> {
    let root = dunce::canonicalize(&args.root)
        .with_context(|| format!("Failed to resolve project root: {}", args.root.display()))?;
    let config = load_config(&root)?;
    let keys = config.package_keys();

    if !keys.iter().any(|k| k.eq_ignore_ascii_case(&args.package)) {
        anyhow::bail!(
            "Unknown package '{}' (declared: {})",
            args.package,
            keys.join(", ")
        );
    }

    let content = read_file_smart(&args.file)
        .with_context(|| format!("Failed to read file: {}", args.file.display()))?;
    let text = content
        .as_str()
        .with_context(|| format!("{} is not valid UTF-8", args.file.display()))?;

    let outcome = Stripper::new(keys, &args.package, &config.pseudo_package).strip(text);

    if outcome.unresolved > 0 && !ctx.quiet {
        let note = format!("{} marker(s) left in place", outcome.unresolved);
        if ctx.no_color {
            eprintln!("! {note}");
        } else {
            eprintln!("{} {note}", "!".yellow());
        }
    }

    match args.output {
        Some(path) if ctx.dry_run => {
            if !ctx.quiet {
                println!(
                    "DRY RUN: Would write {} bytes to {}",
                    outcome.text.len(),
                    path.display()
                );
            }
        }
        Some(path) => {
            write_output(&path, outcome.text.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            if !ctx.quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
        None => print!("{}", outcome.text),
    }

    Ok(())
}
