//! Filepath: src/infra/walk.rs
//! Source-tree walker for package builds.
//! - Exact root-relative exclude paths (`vendor`, `.git`, the build dir)
//! - Extra exclude globs (early prune of whole subtrees)
//! - Optional caller predicate, also pruning subtrees
//! - Optional .gitignore support (off by default: the tree is the input)
//! - Deterministic ordering for stable builds and tests
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};

/// Predicate over root-relative paths; `false` prunes the entry and,
/// for directories, everything below it.
pub type EntryFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// One file or directory found under the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry
{
    /// Path as found on disk
    pub path: PathBuf,

    /// Path relative to the walk root
    pub relative: PathBuf,

    pub is_dir: bool,
}

/// Walker with exact-path excludes, glob excludes and a caller filter.
/// All three are applied while descending, so excluded directories are
/// never entered.
pub struct FileWalker
{
    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// Root-relative paths with `/` separators
    exclude_paths: Vec<String>,

    /// Caller-provided membership predicate
    entry_filter: Option<EntryFilter>,

    /// Honour .gitignore / .ignore / git exclude files; default false
    respect_gitignore: bool,
}

impl FileWalker
{
    /// Build a walker with additional ignore globs (e.g. "node_modules/**",
    /// "**/*.map"). Patterns match on root-relative paths.
    pub fn new(additional_ignores: &[String]) -> Result<Self, globset::Error>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            ignore_patterns: builder.build()?,
            exclude_paths: Vec::new(),
            entry_filter: None,
            respect_gitignore: false,
        })
    }

    /// Skip entries whose root-relative path equals one of `paths`.
    pub fn with_exclude_paths(
        mut self,
        paths: &[String],
    ) -> Self
    {
        self.exclude_paths = paths
            .iter()
            .map(|p| {
                p.replace('\\', "/")
                    .trim_start_matches("./")
                    .trim_end_matches('/')
                    .to_string()
            })
            .collect();
        self
    }

    /// Skip entries rejected by `filter`.
    pub fn with_entry_filter<F>(
        mut self,
        filter: F,
    ) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.entry_filter = Some(Arc::new(filter));
        self
    }

    /// (Optional) Respect ignore files while walking.
    pub fn with_gitignore(
        mut self,
        respect: bool,
    ) -> Self
    {
        self.respect_gitignore = respect;
        self
    }

    /// Internal: construct a configured WalkBuilder for `root`.
    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // Dotfiles ship too (.htaccess); ignore files only on request
        b.standard_filters(false);
        if self.respect_gitignore
        {
            b.ignore(true);
            b.git_ignore(true);
            b.git_global(true);
            b.git_exclude(true);
            b.require_git(false);
        }

        let root = root.to_path_buf();
        let extra = self
            .ignore_patterns
            .clone();
        let excluded = self
            .exclude_paths
            .clone();
        let filter = self
            .entry_filter
            .clone();

        b.filter_entry(move |ent: &DirEntry| {
            let Ok(rel) = ent
                .path()
                .strip_prefix(&root)
            else
            {
                return true;
            };

            // The root itself
            if rel
                .as_os_str()
                .is_empty()
            {
                return true;
            }

            let rel_str = rel
                .to_string_lossy()
                .replace('\\', "/");
            if excluded
                .iter()
                .any(|p| *p == rel_str)
            {
                return false;
            }
            if extra.is_match(rel)
            {
                return false;
            }

            filter
                .as_ref()
                .is_none_or(|f| f(rel))
        });

        b
    }

    /// Traverse `root` and return every file and directory below it
    /// (not the root itself), sorted by relative path.
    /// The first traversal error aborts the walk.
    pub fn walk_entries<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> Result<Vec<WalkEntry>, ignore::Error>
    {
        let root_path = root.as_ref();
        let mut out = Vec::new();

        for result in self
            .build_walk(root_path)
            .build()
        {
            let entry = result?;
            if entry.depth() == 0
            {
                continue;
            }

            let is_dir = entry
                .file_type()
                .is_some_and(|ft| ft.is_dir());
            let relative = entry
                .path()
                .strip_prefix(root_path)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| {
                    entry
                        .path()
                        .to_path_buf()
                });

            out.push(WalkEntry { path: entry.into_path(), relative, is_dir });
        }

        // Deterministic order (parents before children)
        out.sort_by(|a, b| {
            a.relative
                .cmp(&b.relative)
        });

        Ok(out)
    }
}
