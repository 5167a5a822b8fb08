//! Shared test utilities for integration tests
//!
//! Provides a small marker-annotated plugin tree used by the
//! build and CLI tests.

#![allow(dead_code)]

use std::path::Path;

use assert_fs::prelude::*;

/// Main plugin class: a guarded block, a guarded property and a
/// guarded method, each with doc comments.
pub const PLUGIN_PHP: &str = r#"<?php
/**
 * Plugin bootstrap.
 */
class Plugin {

    /**
     * Licence key.
     */
    private $license__isPro;

    public function boot() {
        if ( __is( 'pro' ) ) {
            $this->bootPro__isPro();
        }
        shared();
    }

    /**
     * Pro bootstrap.
     */
    public function bootPro__isPro() {
        return true;
    }
}
"#;

/// Template mixing inline HTML and a guarded block
pub const TEMPLATE_PHP: &str = r#"<div class="box">
<?php if ( __is( 'pro' ) ) { ?>
  <span>Upgrade complete</span>
<?php } ?>
</div>
"#;

/// Create the plugin fixture:
/// - `plugin.php`, `templates/box.php` (guarded code)
/// - `widget__isPro.php`, `admin__isPro/settings.php` (pro-only paths)
/// - `dev__isSource.php` (pseudo-package path)
/// - assets and excluded entries (`vendor/`, `composer.json`)
pub fn make_plugin_fixture() -> assert_fs::TempDir
{
    // Initialize the temporary project root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("plugin.php")
        .write_str(PLUGIN_PHP)
        .expect("write plugin");
    tmp.child("templates/box.php")
        .write_str(TEMPLATE_PHP)
        .expect("write template");

    // Package-only paths
    tmp.child("widget__isPro.php")
        .write_str("<?php\nfunction widget() {\n    return 'pro';\n}\n")
        .expect("write widget");
    tmp.child("admin__isPro/settings.php")
        .write_str("<?php\nsettings();\n")
        .expect("write settings");
    tmp.child("dev__isSource.php")
        .write_str("<?php\ndebug_tools();\n")
        .expect("write dev");

    // Plain assets are copied as-is
    tmp.child("assets/logo.svg")
        .write_str("<svg/>")
        .expect("write logo");
    tmp.child("readme.txt")
        .write_str("=== Plugin ===\n")
        .expect("write readme");

    // Excluded by default
    tmp.child("vendor/autoload.php")
        .write_str("<?php\n")
        .expect("write vendor");
    tmp.child("composer.json")
        .write_str("{}")
        .expect("write composer");

    tmp
}

/// Read a UTF-8 file below `root`
pub fn read(
    root: &Path,
    rel: &str,
) -> String
{
    std::fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("read {rel}: {e}"))
}
