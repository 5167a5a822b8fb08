use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};

/// Config file names looked up in the project root, first match wins
pub const CONFIG_FILES: [&str; 4] = [
    "packsplit.toml",
    "packsplit.yaml",
    "packsplit.json",
    ".packsplit.toml",
];

/// One distribution package: its marker key and output directory name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDeclaration
{
    /// Key used in guards and marker infixes (`pro` → `__isPro`)
    pub key: String,

    /// Directory name under the build dir
    pub output_name: String,
}

impl PackageDeclaration
{
    pub fn new(
        key: &str,
        output_name: &str,
    ) -> Self
    {
        Self { key: key.to_string(), output_name: output_name.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Packages in build order
    pub packages: Vec<PackageDeclaration>,

    /// Always-true guard key; its output directory is discarded
    pub pseudo_package: String,

    /// Output root, relative to the project root
    pub build_dir: PathBuf,

    /// Root-relative paths skipped during traversal (exact match)
    pub exclude: Vec<String>,

    /// Extra glob patterns skipped during traversal
    pub exclude_globs: Vec<String>,

    /// Extensions of files run through the stripper
    pub source_extensions: Vec<String>,

    /// Honour .gitignore files while walking
    pub respect_gitignore: bool,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            packages: vec![
                PackageDeclaration::new("source", "source"),
                PackageDeclaration::new("free", "free"),
                PackageDeclaration::new("pro", "pro"),
            ],
            pseudo_package: "source".to_string(),
            build_dir: PathBuf::from("build"),
            exclude: vec![
                ".git".to_string(),
                "vendor".to_string(),
                "source-generator".to_string(),
                ".DS_Store".to_string(),
                ".gitignore".to_string(),
                "circle.yml".to_string(),
                "composer.json".to_string(),
                "composer.lock".to_string(),
            ],
            exclude_globs: Vec::new(),
            source_extensions: vec!["php".to_string()],
            respect_gitignore: false,
        }
    }
}

impl Config
{
    /// Declared package keys in build order
    pub fn package_keys(&self) -> Vec<String>
    {
        self.packages
            .iter()
            .map(|p| p.key.clone())
            .collect()
    }

    /// Whether `path` should go through the stripper
    pub fn is_source_file(
        &self,
        path: &Path,
    ) -> bool
    {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.source_extensions
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }

    /// The whole exclude list, with the build dir always part of it
    pub fn excluded_paths(&self) -> Vec<String>
    {
        let mut paths = self.exclude.clone();
        let build_dir = self
            .build_dir
            .to_string_lossy()
            .replace('\\', "/");
        if !paths.contains(&build_dir)
        {
            paths.push(build_dir);
        }
        paths
    }
}

/// Load configuration for a project rooted at `root`:
/// defaults, then the first config file found, then `PACKSPLIT__*` env vars.
pub fn load_config(root: &Path) -> Result<Config>
{
    // Missing keys fall back to `Config::default()` through `#[serde(default)]`
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    for name in &CONFIG_FILES
    {
        let path = root.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    // Add environment variables with PACKSPLIT__ prefix
    builder = builder.add_source(
        config::Environment::with_prefix("PACKSPLIT")
            .prefix_separator("__")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    if parsed.packages.is_empty()
    {
        anyhow::bail!("No packages declared in configuration");
    }

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("DRY RUN: Would write {}:\n{}", config_path.display(), toml_string);
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn defaults_without_config_file() -> Result<()>
    {
        let tmp = TempDir::new()?;
        let config = load_config(tmp.path())?;

        assert_eq!(config.package_keys(), vec!["source", "free", "pro"]);
        assert_eq!(config.pseudo_package, "source");
        assert!(config.excluded_paths().contains(&"build".to_string()));
        Ok(())
    }

    #[test]
    fn config_file_overrides_packages_in_order() -> Result<()>
    {
        let tmp = TempDir::new()?;
        std::fs::write(
            tmp.path().join("packsplit.toml"),
            r#"
build_dir = "dist"

[[packages]]
key = "premium"
output_name = "plugin-premium"

[[packages]]
key = "free"
output_name = "plugin"
"#,
        )?;

        let config = load_config(tmp.path())?;
        assert_eq!(config.package_keys(), vec!["premium", "free"]);
        assert_eq!(config.packages[0].output_name, "plugin-premium");
        assert_eq!(config.build_dir, PathBuf::from("dist"));
        assert!(config.excluded_paths().contains(&"dist".to_string()));
        // untouched keys keep their defaults
        assert_eq!(config.source_extensions, vec!["php"]);
        Ok(())
    }

    #[test]
    fn source_extension_match_ignores_case()
    {
        let config = Config::default();
        assert!(config.is_source_file(Path::new("a/b.PHP")));
        assert!(!config.is_source_file(Path::new("a/b.js")));
        assert!(!config.is_source_file(Path::new("Makefile")));
    }

    #[test]
    fn default_config_round_trips_through_toml() -> Result<()>
    {
        let text = toml::to_string_pretty(&Config::default())?;
        let back: Config = toml::from_str(&text)?;
        assert_eq!(back.packages, Config::default().packages);
        Ok(())
    }
}
