//! Tests for error reporting, suggestions and exit codes.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn strata(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.current_dir(root)
        .env("XDG_CONFIG_HOME", root.join(".no-global-config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn app(root: &Path, name: &str) {
    fs::create_dir_all(root.join(name).join("controllers")).unwrap();
    fs::write(root.join(name).join("__init__.py"), "").unwrap();
    fs::write(root.join(name).join("controllers/__init__.py"), "").unwrap();
}

#[test]
fn invalid_app_name_explains_identifier_rules() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["start-app", "my-app"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("valid Python identifier"));
}

#[test]
fn unknown_template_lists_where_to_look() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["start-app", "blog", "--template", "nope"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("template 'nope' not found"))
        .stderr(predicate::str::contains("strata list-templates"));
}

#[test]
fn unknown_layer_lists_valid_layers() {
    let temp = TempDir::new().unwrap();
    app(temp.path(), "shop");
    strata(temp.path())
        .args(["manage-file", "shop", "--layer", "widgets", "--suffix", "cart"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown layer 'widgets'"))
        .stderr(predicate::str::contains("Valid layers:"))
        .stderr(predicate::str::contains("controllers"));
}

#[test]
fn existing_file_suggests_force() {
    let temp = TempDir::new().unwrap();
    app(temp.path(), "shop");
    strata(temp.path())
        .args(["manage-file", "shop", "-l", "controllers", "-s", "cart"])
        .assert()
        .success();
    strata(temp.path())
        .args(["manage-file", "shop", "-l", "controllers", "-s", "cart"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("file already exists"))
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn missing_settings_list_is_not_found() {
    let temp = TempDir::new().unwrap();
    app(temp.path(), "shop");
    let settings = temp.path().join("config/settings/apps_middlewares.py");
    fs::create_dir_all(settings.parent().unwrap()).unwrap();
    fs::write(&settings, "THIRD_PARTY_PACKAGES = []\n").unwrap();

    strata(temp.path())
        .args(["manage-project-app", "shop"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("list 'PROJECT_APPS' not found"));
}

#[test]
fn malformed_project_config_is_a_configuration_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("strata.toml"), "[layers\nvalid = ").unwrap();

    strata(temp.path())
        .arg("list-templates")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Suggestions:"))
        .stderr(predicate::str::contains("strata.toml"));
}

#[test]
fn missing_project_root_is_rejected() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["-C", "does-not-exist", "clean-pycache"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn verbose_hint_disappears_with_verbose_flag() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["start-app", "my-app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--verbose"));

    strata(temp.path())
        .args(["-v", "start-app", "my-app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Use -v / --verbose").not());
}

#[test]
fn usage_errors_exit_with_two() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["manage-file", "shop", "--layer", "controllers"])
        .assert()
        .code(2);
}

#[test]
fn app_active_in_another_list_is_a_conflict() {
    let temp = TempDir::new().unwrap();
    app(temp.path(), "silk");
    let settings = temp.path().join("config/settings/apps_middlewares.py");
    fs::create_dir_all(settings.parent().unwrap()).unwrap();
    fs::write(&settings, "PROJECT_APPS = []\n\nDEV_APPS = ['silk']\n").unwrap();

    strata(temp.path())
        .args(["manage-project-app", "silk"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already registered in DEV_APPS"));
    assert_eq!(
        fs::read_to_string(&settings).unwrap(),
        "PROJECT_APPS = []\n\nDEV_APPS = ['silk']\n"
    );
}
