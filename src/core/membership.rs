//! Which source paths belong to a package, and where they land in its
//! output tree.

use std::path::{Component, Path, PathBuf};

use regex::Regex;

use crate::strip::marker::guard_infix;

/// Path rules for one build target.
#[derive(Debug, Clone)]
pub struct PackageLayout {
    foreign_infixes: Vec<String>,
    rename: Regex,
}

impl PackageLayout {
    /// `packages` are all declared keys; `current` is the build target.
    pub fn new(packages: &[String], current: &str) -> Result<Self, regex::Error> {
        let foreign_infixes = packages
            .iter()
            .filter(|p| !p.eq_ignore_ascii_case(current))
            .map(|p| guard_infix(p))
            .collect();
        let rename = Regex::new(&format!("(?i){}", regex::escape(&guard_infix(current))))?;

        Ok(Self {
            foreign_infixes,
            rename,
        })
    }

    /// False when the path carries another package's infix anywhere.
    pub fn belongs(&self, relative: &Path) -> bool {
        let text = relative.to_string_lossy();
        !self
            .foreign_infixes
            .iter()
            .any(|infix| text.contains(infix.as_str()))
    }

    /// Output location of `relative` with the target's infix removed from
    /// every component. A directory named after the bare infix folds into its
    /// parent; `None` when nothing of the final component is left.
    pub fn output_path(&self, relative: &Path) -> Option<PathBuf> {
        let mut out = PathBuf::new();
        let mut last_empty = false;

        for component in relative.components() {
            match component {
                Component::Normal(name) => {
                    let renamed = self.rename.replace_all(&name.to_string_lossy(), "").into_owned();
                    last_empty = renamed.is_empty();
                    if !last_empty {
                        out.push(renamed);
                    }
                }
                Component::CurDir => {}
                other => {
                    last_empty = false;
                    out.push(other.as_os_str());
                }
            }
        }

        (!last_empty && !out.as_os_str().is_empty()).then_some(out)
    }
}
