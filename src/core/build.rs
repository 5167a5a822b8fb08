//! Package build driver: one output tree per declared package.
//!
//! Flow:
//! - Compile every package's path rules first (bad config leaves the old
//!   build dir alone)
//! - Remove and recreate the build dir
//! - Per package, sequentially: walk the source tree with foreign-package
//!   paths pruned, recreate directories, then copy or strip files in
//!   parallel (fail-fast within the package)
//! - Discard the pseudo-package's output tree

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use owo_colors::OwoColorize;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::cli::{AppContext, BuildArgs};
use crate::core::membership::PackageLayout;
use crate::infra::config::{Config, PackageDeclaration, load_config};
use crate::infra::io::{copy_file, read_file_smart, remove_dir_if_exists, write_output};
use crate::infra::walk::{FileWalker, WalkEntry};
use crate::strip::pipeline::Stripper;

/// Filesystem operation named in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    Created,
    Copied,
    Read,
    Removed,
    Written,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            FsOp::Created => "created",
            FsOp::Copied => "copied",
            FsOp::Read => "read",
            FsOp::Removed => "removed",
            FsOp::Written => "written",
        };
        f.write_str(verb)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{} could not be {op}", .path.display())]
    Filesystem {
        op: FsOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),

    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("invalid package key: {0}")]
    Regex(#[from] regex::Error),
}

impl BuildError {
    fn fs(op: FsOp, path: &Path, source: io::Error) -> Self {
        BuildError::Filesystem {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What happened to one package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageReport {
    pub key: String,
    pub output_name: String,
    pub output_dir: PathBuf,
    pub dirs_created: usize,
    pub files_copied: usize,
    pub files_stripped: usize,
    /// Markers left in place across all stripped files
    pub unresolved: usize,
    /// Output removed after the build (pseudo-package)
    pub discarded: bool,
    pub error: Option<String>,
}

impl PackageReport {
    fn new(decl: &PackageDeclaration, output_dir: PathBuf) -> Self {
        Self {
            key: decl.key.clone(),
            output_name: decl.output_name.clone(),
            output_dir,
            ..Self::default()
        }
    }
}

/// One user-facing output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Info(String),
    Error(String),
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLine::Info(text) => f.write_str(text),
            ReportLine::Error(text) => write!(f, "Error: {text}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub build_dir: PathBuf,
    pub dry_run: bool,
    pub packages: Vec<PackageReport>,
}

impl BuildReport {
    /// Packages whose build stopped on an error
    pub fn failed(&self) -> impl Iterator<Item = &PackageReport> {
        self.packages.iter().filter(|p| p.error.is_some())
    }

    pub fn summary_lines(&self) -> Vec<ReportLine> {
        let mut lines = Vec::with_capacity(self.packages.len() + 1);

        if self.dry_run {
            lines.push(ReportLine::Info(format!(
                "DRY RUN: Would recreate {}",
                self.build_dir.display()
            )));
        } else {
            lines.push(ReportLine::Info("Build directory created".to_string()));
        }

        for package in &self.packages {
            let line = match (&package.error, self.dry_run) {
                (Some(err), _) => ReportLine::Error(err.clone()),
                (None, false) => ReportLine::Info(format!("Built package: {}", package.output_name)),
                (None, true) => ReportLine::Info(format!(
                    "Would build package: {} ({} dirs, {} copied, {} stripped, {} unresolved)",
                    package.output_name,
                    package.dirs_created,
                    package.files_copied,
                    package.files_stripped,
                    package.unresolved
                )),
            };
            lines.push(line);
        }

        lines
    }

    /// Plain-text rendering of `summary_lines`
    pub fn render(&self) -> String {
        self.summary_lines().iter().join("\n")
    }
}

/// Everything needed to build one package, compiled before touching disk.
struct PackagePlan<'a> {
    decl: &'a PackageDeclaration,
    layout: PackageLayout,
    walker: FileWalker,
    stripper: Stripper,
    discard: bool,
}

#[derive(Debug, Clone, Copy)]
enum FileOutcome {
    Copied,
    Stripped { unresolved: usize },
    Skipped,
}

fn plan_packages(config: &Config) -> Result<Vec<PackagePlan<'_>>, BuildError> {
    let keys = config.package_keys();
    let excluded = config.excluded_paths();

    config
        .packages
        .iter()
        .map(|decl| plan_package(config, decl, &keys, &excluded))
        .collect()
}

fn plan_package<'a>(
    config: &Config,
    decl: &'a PackageDeclaration,
    keys: &[String],
    excluded: &[String],
) -> Result<PackagePlan<'a>, BuildError> {
    let layout = PackageLayout::new(keys, &decl.key)?;
    let membership = layout.clone();
    let walker = FileWalker::new(&config.exclude_globs)?
        .with_exclude_paths(excluded)
        .with_gitignore(config.respect_gitignore)
        .with_entry_filter(move |rel| membership.belongs(rel));

    Ok(PackagePlan {
        decl,
        layout,
        walker,
        stripper: Stripper::new(keys.iter().cloned(), &decl.key, &config.pseudo_package),
        discard: decl.key.eq_ignore_ascii_case(&config.pseudo_package),
    })
}

/// Build every declared package from the tree at `root`.
///
/// Errors returned here are setup failures (config, build dir). A failure
/// inside one package is recorded in its report and the next package runs.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn build(config: &Config, root: &Path, ctx: &AppContext) -> Result<BuildReport, BuildError> {
    let plans = plan_packages(config)?;
    let build_dir = root.join(&config.build_dir);

    if !ctx.dry_run {
        remove_dir_if_exists(&build_dir).map_err(|e| BuildError::fs(FsOp::Removed, &build_dir, e))?;
        fs::create_dir_all(&build_dir).map_err(|e| BuildError::fs(FsOp::Created, &build_dir, e))?;
    }
    info!(build_dir = %build_dir.display(), "build directory ready");

    let progress = if ctx.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    };

    let mut report = BuildReport {
        build_dir: build_dir.clone(),
        dry_run: ctx.dry_run,
        packages: Vec::with_capacity(plans.len()),
    };

    for plan in &plans {
        let output_dir = build_dir.join(&plan.decl.output_name);
        let mut package = PackageReport::new(plan.decl, output_dir.clone());

        progress.set_message(format!("Building {}", plan.decl.output_name));

        if let Err(err) = build_package(config, root, plan, &mut package, ctx.dry_run, &progress) {
            warn!(package = %plan.decl.key, error = %err, "package build failed");
            package.error = Some(err.to_string());
        } else if plan.discard {
            if !ctx.dry_run
                && let Err(e) = remove_dir_if_exists(&output_dir)
            {
                package.error = Some(BuildError::fs(FsOp::Removed, &output_dir, e).to_string());
            }
            package.discarded = true;
            debug!(package = %plan.decl.key, "pseudo-package output discarded");
        }

        report.packages.push(package);
    }

    progress.finish_and_clear();
    Ok(report)
}

#[instrument(skip_all, fields(package = %plan.decl.key))]
fn build_package(
    config: &Config,
    root: &Path,
    plan: &PackagePlan<'_>,
    report: &mut PackageReport,
    dry_run: bool,
    progress: &ProgressBar,
) -> Result<(), BuildError> {
    let package_dir = &report.output_dir;
    if !dry_run {
        fs::create_dir_all(package_dir).map_err(|e| BuildError::fs(FsOp::Created, package_dir, e))?;
    }

    let (dirs, files): (Vec<WalkEntry>, Vec<WalkEntry>) =
        plan.walker.walk_entries(root)?.into_iter().partition(|e| e.is_dir);
    debug!(dirs = dirs.len(), files = files.len(), "walked source tree");

    // Sorted order puts parents first
    for dir in &dirs {
        let Some(rel) = plan.layout.output_path(&dir.relative) else {
            continue;
        };
        let target = package_dir.join(rel);
        if !dry_run {
            fs::create_dir_all(&target).map_err(|e| BuildError::fs(FsOp::Created, &target, e))?;
        }
        report.dirs_created += 1;
    }

    progress.set_length(files.len() as u64);
    progress.set_position(0);

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|file| {
            let outcome = process_file(config, plan, file, package_dir, dry_run);
            progress.inc(1);
            outcome
        })
        .collect::<Result<_, _>>()?;

    for outcome in outcomes {
        match outcome {
            FileOutcome::Copied => report.files_copied += 1,
            FileOutcome::Stripped { unresolved } => {
                report.files_stripped += 1;
                report.unresolved += unresolved;
            }
            FileOutcome::Skipped => {}
        }
    }

    info!(
        copied = report.files_copied,
        stripped = report.files_stripped,
        unresolved = report.unresolved,
        "package built"
    );
    Ok(())
}

fn process_file(
    config: &Config,
    plan: &PackagePlan<'_>,
    file: &WalkEntry,
    package_dir: &Path,
    dry_run: bool,
) -> Result<FileOutcome, BuildError> {
    let Some(rel) = plan.layout.output_path(&file.relative) else {
        warn!(path = %file.relative.display(), "file name is only a package marker, skipped");
        return Ok(FileOutcome::Skipped);
    };
    let target = package_dir.join(rel);

    if !config.is_source_file(&file.relative) {
        copy_verbatim(&file.path, &target, dry_run)?;
        return Ok(FileOutcome::Copied);
    }

    let content = read_file_smart(&file.path).map_err(|e| BuildError::fs(FsOp::Read, &file.path, e))?;
    let Some(text) = content.as_str() else {
        warn!(path = %file.relative.display(), "source is not valid UTF-8, copied verbatim");
        copy_verbatim(&file.path, &target, dry_run)?;
        return Ok(FileOutcome::Copied);
    };

    let outcome = plan.stripper.strip(text);
    if outcome.unresolved > 0 {
        debug!(
            path = %file.relative.display(),
            unresolved = outcome.unresolved,
            "markers left in place"
        );
    }

    if !dry_run {
        write_output(&target, outcome.text.as_bytes())
            .map_err(|e| BuildError::fs(FsOp::Written, &target, e))?;
    }

    Ok(FileOutcome::Stripped {
        unresolved: outcome.unresolved,
    })
}

fn copy_verbatim(from: &Path, to: &Path, dry_run: bool) -> Result<(), BuildError> {
    if !dry_run {
        copy_file(from, to).map_err(|e| BuildError::fs(FsOp::Copied, to, e))?;
    }
    Ok(())
}

/// `psplit build`
pub fn run(args: BuildArgs, ctx: &AppContext) -> Result<()> {
    let root = dunce::canonicalize(&args.root)
        .with_context(|| format!("Failed to resolve project root: {}", args.root.display()))?;
    let config = load_config(&root)?;

    let report = build(&config, &root, ctx)?;

    for line in report.summary_lines() {
        match &line {
            ReportLine::Error(_) if ctx.no_color => println!("{line}"),
            ReportLine::Error(_) => println!("{}", line.red()),
            ReportLine::Info(_) if ctx.quiet => {}
            ReportLine::Info(_) if ctx.no_color => println!("{line}"),
            ReportLine::Info(_) if ctx.dry_run => println!("{}", line.yellow()),
            ReportLine::Info(_) => println!("{}", line.green()),
        }
    }

    let failed = report.failed().count();
    if failed > 0 {
        anyhow::bail!("{failed} package(s) failed to build");
    }
    Ok(())
}
