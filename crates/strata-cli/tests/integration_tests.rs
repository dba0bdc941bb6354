//! Integration tests for the `strata` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SETTINGS_FILE: &str = "config/settings/apps_middlewares.py";
const SETTINGS: &str = "\
THIRD_PARTY_PACKAGES = [
    'rest_framework',
]

PROJECT_APPS = [
    'accounts',
]

DEV_APPS = []
";

/// A project with one app (`shop`) and the default settings file.
fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "shop/__init__.py", "");
    write(temp.path(), "shop/controllers/__init__.py", "");
    write(temp.path(), "shop/serializers/__init__.py", "");
    write(temp.path(), SETTINGS_FILE, SETTINGS);
    temp
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("cannot read {rel}: {e}"))
}

/// The binary, run inside `root` with no user or environment configuration.
fn strata(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    cmd.current_dir(root)
        .env("XDG_CONFIG_HOME", root.join(".no-global-config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

// ── basics ────────────────────────────────────────────────────────────────────

#[test]
fn help_lists_commands() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start-app"))
        .stdout(predicate::str::contains("manage-file"))
        .stdout(predicate::str::contains("manage-project-app"));
}

#[test]
fn version_flag() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn completions_for_bash() {
    let temp = TempDir::new().unwrap();
    strata(temp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("strata"));
}

// ── start-app ─────────────────────────────────────────────────────────────────

#[test]
fn start_app_from_builtin_template() {
    let temp = project();
    strata(temp.path())
        .args(["start-app", "blog_post", "--add-to-settings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("App 'blog_post' created"));

    let apps = read(temp.path(), "blog_post/apps.py");
    assert!(apps.contains("class BlogPostConfig(AppConfig)"));
    assert!(apps.contains("name = \"blog_post\""));
    assert!(temp.path().join("blog_post/controllers/__init__.py").is_file());
    assert!(read(temp.path(), SETTINGS_FILE).contains("    'blog_post',\n"));
}

#[test]
fn start_app_from_project_template_directory() {
    let temp = project();
    write(
        temp.path(),
        "static/api/{{app_name}}_views.py",
        "import {{app_name}}.models\n",
    );
    write(temp.path(), "static/api/__pycache__/x.pyc", "\0");

    strata(temp.path())
        .args(["start-app", "blog", "--template", "api"])
        .assert()
        .success();

    assert_eq!(read(temp.path(), "blog/blog_views.py"), "import blog.models\n");
    assert!(!temp.path().join("blog/__pycache__").exists());
    // settings untouched without --add-to-settings
    assert_eq!(read(temp.path(), SETTINGS_FILE), SETTINGS);
}

#[test]
fn start_app_refuses_existing_directory() {
    let temp = project();
    strata(temp.path())
        .args(["start-app", "shop"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));
    assert!(!temp.path().join("shop/apps.py").exists());
}

#[test]
fn start_app_force_replaces_without_prompt_when_not_a_tty() {
    let temp = project();
    strata(temp.path())
        .args(["start-app", "shop", "--force"])
        .assert()
        .success();
    assert!(temp.path().join("shop/apps.py").is_file());

    // no staging or backup directories are left behind
    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".strata-"))
        .collect();
    assert!(leftovers.is_empty(), "leftovers: {leftovers:?}");
}

#[test]
fn start_app_dry_run_writes_nothing() {
    let temp = project();
    strata(temp.path())
        .args(["start-app", "blog", "--dry-run", "--add-to-settings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains("would create"));
    assert!(!temp.path().join("blog").exists());
    assert_eq!(read(temp.path(), SETTINGS_FILE), SETTINGS);
}

#[test]
fn start_app_unknown_template_is_not_found() {
    let temp = project();
    strata(temp.path())
        .args(["start-app", "blog", "--template", "nope"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("list-templates"));
}

#[test]
fn start_app_invalid_name() {
    let temp = project();
    strata(temp.path())
        .args(["start-app", "my-app"])
        .assert()
        .code(2);
    assert!(!temp.path().join("my-app").exists());
}

// ── manage-file ───────────────────────────────────────────────────────────────

#[test]
fn manage_file_creates_scoped_file() {
    let temp = project();
    strata(temp.path())
        .args([
            "manage-file",
            "shop",
            "--layer",
            "controllers",
            "--suffix",
            "review",
            "--scope",
            "reviews",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("shop/controllers/reviews/review.py"));

    assert_eq!(
        read(temp.path(), "shop/controllers/__init__.py"),
        "from .reviews import *\n"
    );
    assert_eq!(
        read(temp.path(), "shop/controllers/reviews/__init__.py"),
        "from .review import *\n"
    );
    assert!(read(temp.path(), "shop/controllers/reviews/review.py").contains("class ReviewViewSet"));
}

#[test]
fn manage_file_disable_then_enable() {
    let temp = project();
    let base = ["manage-file", "shop", "--layer", "serializers", "--suffix", "user"];
    strata(temp.path()).args(base).assert().success();
    let original = read(temp.path(), "shop/serializers/__init__.py");

    strata(temp.path())
        .args(base)
        .arg("--disable")
        .assert()
        .success();
    assert_eq!(
        read(temp.path(), "shop/serializers/__init__.py"),
        "# from .user import *\n"
    );

    strata(temp.path()).args(base).arg("--enable").assert().success();
    assert_eq!(read(temp.path(), "shop/serializers/__init__.py"), original);
}

#[test]
fn manage_file_conflicting_flags() {
    let temp = project();
    strata(temp.path())
        .args([
            "manage-file",
            "shop",
            "--layer",
            "serializers",
            "--suffix",
            "user",
            "--enable",
            "--disable",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("conflicting flags"));
}

#[test]
fn manage_file_cleanup_removes_empty_scope() {
    let temp = project();
    strata(temp.path())
        .args([
            "manage-file", "shop", "--layer", "controllers", "--suffix", "review", "--scope",
            "reviews",
        ])
        .assert()
        .success();

    strata(temp.path())
        .args([
            "manage-file", "shop", "--layer", "controllers", "--suffix", "review", "--scope",
            "reviews", "--cleanup",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 file(s) and 1 empty scope(s)"));

    assert!(!temp.path().join("shop/controllers/reviews").exists());
    assert_eq!(read(temp.path(), "shop/controllers/__init__.py"), "");
}

#[test]
fn manage_file_unknown_layer() {
    let temp = project();
    strata(temp.path())
        .args(["manage-file", "shop", "--layer", "widgets", "--suffix", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("widgets"));
}

#[test]
fn manage_file_json_output() {
    let temp = project();
    let assert = strata(temp.path())
        .args([
            "--output-format",
            "json",
            "manage-file",
            "shop",
            "--layer",
            "serializers",
            "--suffix",
            "user",
            "--dry-run",
        ])
        .assert()
        .success();

    let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(report["path"], "shop/serializers/user.py");
    assert_eq!(report["dry_run"], true);
    assert!(!temp.path().join("shop/serializers/user.py").exists());
}

// ── manage-project-app ────────────────────────────────────────────────────────

#[test]
fn manage_project_app_round_trip() {
    let temp = project();
    strata(temp.path())
        .args(["manage-project-app", "shop"])
        .assert()
        .success();
    assert!(read(temp.path(), SETTINGS_FILE).contains("    'shop',\n"));

    strata(temp.path())
        .args(["manage-project-app", "shop", "--soft-remove"])
        .assert()
        .success();
    assert!(read(temp.path(), SETTINGS_FILE).contains("# 'shop',"));

    strata(temp.path())
        .args(["manage-project-app", "shop", "--restore"])
        .assert()
        .success();
    strata(temp.path())
        .args(["manage-project-app", "shop", "--remove"])
        .assert()
        .success();
    assert_eq!(read(temp.path(), SETTINGS_FILE), SETTINGS);
}

#[test]
fn manage_project_app_missing_folder_needs_force() {
    let temp = project();
    strata(temp.path())
        .args(["manage-project-app", "billing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));

    strata(temp.path())
        .args(["manage-project-app", "billing", "--force"])
        .assert()
        .success();
    assert!(read(temp.path(), SETTINGS_FILE).contains("'billing',"));
}

#[test]
fn manage_project_app_dev_list_with_comment() {
    let temp = project();
    strata(temp.path())
        .args([
            "manage-project-app",
            "django_extensions",
            "--type",
            "dev",
            "--comment",
            "shell_plus",
        ])
        .assert()
        .success();
    let settings = read(temp.path(), SETTINGS_FILE);
    assert!(settings.contains("'django_extensions',  # shell_plus"));
}

#[test]
fn manage_project_app_missing_entry_is_not_found() {
    let temp = project();
    strata(temp.path())
        .args(["manage-project-app", "ghost", "--type", "third-party", "--remove"])
        .assert()
        .code(3);
}

#[test]
fn settings_file_from_project_config() {
    let temp = project();
    write(temp.path(), "settings.py", "PROJECT_APPS = []\n");
    write(temp.path(), "strata.toml", "[project]\nsettings_file = \"settings.py\"\n");

    strata(temp.path())
        .args(["manage-project-app", "shop"])
        .assert()
        .success();
    assert_eq!(read(temp.path(), "settings.py"), "PROJECT_APPS = ['shop']\n");
    assert_eq!(read(temp.path(), SETTINGS_FILE), SETTINGS);
}

// ── list-templates / clean-pycache / config ──────────────────────────────────

#[test]
fn list_templates_shows_builtin_and_directory_templates() {
    let temp = project();
    write(
        temp.path(),
        "static/api/template.toml",
        "[template]\ndescription = \"REST app\"\n",
    );
    strata(temp.path())
        .args(["list-templates", "--format", "list"])
        .assert()
        .success()
        .stdout(predicate::str::diff("api\ndefault\n"));
}

#[test]
fn clean_pycache_removes_cache_directories() {
    let temp = project();
    write(temp.path(), "shop/__pycache__/models.cpython-312.pyc", "abcd");
    write(temp.path(), "__pycache__/manage.cpython-312.pyc", "ab");

    strata(temp.path())
        .args(["clean-pycache", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would remove 2 __pycache__ directories"));
    assert!(temp.path().join("shop/__pycache__").exists());

    strata(temp.path()).arg("clean-pycache").assert().success();
    assert!(!temp.path().join("shop/__pycache__").exists());
    assert!(!temp.path().join("__pycache__").exists());
    assert!(temp.path().join("shop/__init__.py").exists());
}

#[test]
fn config_get_reads_environment_override() {
    let temp = project();
    strata(temp.path())
        .args(["config", "get", "layers.file_prefix"])
        .env("STRATA__LAYERS__FILE_PREFIX", "_")
        .assert()
        .success()
        .stdout(predicate::str::diff("_\n"));
}

#[test]
fn project_root_flag() {
    let temp = project();
    let elsewhere = TempDir::new().unwrap();
    strata(elsewhere.path())
        .args(["-C"])
        .arg(temp.path())
        .args(["manage-file", "shop", "--layer", "serializers", "--suffix", "user"])
        .assert()
        .success();
    assert!(temp.path().join("shop/serializers/user.py").is_file());
}
