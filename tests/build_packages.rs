//! End-to-end package builds over the plugin fixture, driven through
//! the library API.

use packsplit::cli::AppContext;
use packsplit::core::build;
use packsplit::infra::config::{Config, PackageDeclaration};

mod util;
use util::{make_plugin_fixture, read};

fn quiet() -> AppContext
{
    AppContext { quiet: true, no_color: true, dry_run: false }
}

#[test]
fn free_package_drops_pro_code_and_paths()
{
    let tmp = make_plugin_fixture();
    let report = build(&Config::default(), tmp.path(), &quiet()).expect("build");
    assert_eq!(report.failed().count(), 0);

    let free = tmp.path().join("build/free");
    let plugin = read(&free, "plugin.php");

    // Guarded block, property and method are gone with their docs
    assert!(plugin.contains("shared();"));
    assert!(plugin.contains("public function boot()"));
    assert!(!plugin.contains("__is"));
    assert!(!plugin.contains("license"));
    assert!(!plugin.contains("Licence key"));
    assert!(!plugin.contains("bootPro"));
    assert!(!plugin.contains("Pro bootstrap"));
    assert!(!plugin.contains("private"));

    let template = read(&free, "templates/box.php");
    assert!(!template.contains("Upgrade complete"));
    assert!(template.contains("</div>"));

    // Pro-only and source-only paths never reach the free tree
    assert!(!free.join("widget.php").exists());
    assert!(!free.join("widget__isPro.php").exists());
    assert!(!free.join("admin").exists());
    assert!(!free.join("admin__isPro").exists());
    assert!(!free.join("dev.php").exists());
    assert!(!free.join("dev__isSource.php").exists());
}

#[test]
fn pro_package_unwraps_guards_and_renames_paths()
{
    let tmp = make_plugin_fixture();
    build(&Config::default(), tmp.path(), &quiet()).expect("build");

    let pro = tmp.path().join("build/pro");
    let plugin = read(&pro, "plugin.php");

    assert!(plugin.contains("private $license;"));
    assert!(plugin.contains("$this->bootPro();"));
    assert!(plugin.contains("public function bootPro()"));
    assert!(plugin.contains("Licence key"));
    assert!(!plugin.contains("__is"));
    assert!(!plugin.contains("if ("));

    let template = read(&pro, "templates/box.php");
    assert!(template.contains("<span>Upgrade complete</span>"));
    assert!(!template.contains("__is"));

    assert_eq!(
        read(&pro, "widget.php"),
        "<?php\nfunction widget() {\n    return 'pro';\n}\n"
    );
    assert_eq!(read(&pro, "admin/settings.php"), "<?php\nsettings();\n");
    assert!(!pro.join("dev.php").exists());
}

#[test]
fn pseudo_package_output_is_discarded()
{
    let tmp = make_plugin_fixture();
    let report = build(&Config::default(), tmp.path(), &quiet()).expect("build");

    assert!(!tmp.path().join("build/source").exists());
    assert!(tmp.path().join("build/free").is_dir());
    assert!(tmp.path().join("build/pro").is_dir());

    let source = &report.packages[0];
    assert_eq!(source.key, "source");
    assert!(source.discarded);
    assert!(source.error.is_none());
}

#[test]
fn excluded_entries_and_assets()
{
    let tmp = make_plugin_fixture();
    build(&Config::default(), tmp.path(), &quiet()).expect("build");

    for package in ["free", "pro"]
    {
        let out = tmp.path().join("build").join(package);
        assert!(!out.join("vendor").exists(), "{package}: vendor copied");
        assert!(!out.join("composer.json").exists(), "{package}: composer.json copied");
        assert!(!out.join("build").exists(), "{package}: build dir recursed");
        assert_eq!(read(&out, "assets/logo.svg"), "<svg/>");
        assert_eq!(read(&out, "readme.txt"), "=== Plugin ===\n");
    }
}

#[test]
fn custom_packages_and_output_names()
{
    let tmp = make_plugin_fixture();
    let config = Config {
        packages: vec![
            PackageDeclaration::new("source", "source"),
            PackageDeclaration::new("free", "my-plugin"),
            PackageDeclaration::new("pro", "my-plugin-pro"),
        ],
        build_dir: "dist".into(),
        ..Config::default()
    };

    let report = build(&config, tmp.path(), &quiet()).expect("build");

    assert!(tmp.path().join("dist/my-plugin/plugin.php").exists());
    assert!(tmp.path().join("dist/my-plugin-pro/widget.php").exists());
    assert!(!tmp.path().join("build").exists());
    assert_eq!(report.packages[2].output_name, "my-plugin-pro");
}

#[test]
fn stripped_and_copied_counts_are_reported()
{
    let tmp = make_plugin_fixture();
    let report = build(&Config::default(), tmp.path(), &quiet()).expect("build");

    // plugin.php, templates/box.php
    let free = &report.packages[1];
    assert_eq!(free.files_stripped, 2);
    assert_eq!(free.files_copied, 2);

    // + widget.php, admin/settings.php
    let pro = &report.packages[2];
    assert_eq!(pro.files_stripped, 4);
    assert_eq!(pro.files_copied, 2);
}

#[cfg(unix)]
#[test]
fn failing_package_is_reported_and_the_next_one_builds()
{
    let tmp = make_plugin_fixture();
    std::os::unix::fs::symlink(
        tmp.path().join("missing.php"),
        tmp.path().join("x__isFree.php"),
    )
    .expect("symlink");

    let report = build(&Config::default(), tmp.path(), &quiet()).expect("build");

    let free = &report.packages[1];
    assert_eq!(free.key, "free");
    let error = free.error.as_deref().expect("free package error");
    assert!(error.contains("x__isFree.php could not be read"), "{error}");

    let pro = &report.packages[2];
    assert!(pro.error.is_none());
    assert!(tmp.path().join("build/pro/plugin.php").exists());
    assert_eq!(report.failed().count(), 1);
}
