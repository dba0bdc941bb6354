//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use strata_core::domain::SettingsCategory;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "strata",
    bin_name = "strata",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Layered app scaffolding for Django REST Framework projects",
    long_about = "Strata creates apps from templates, adds layer files with their \
                  __init__.py imports, and edits the app lists of your settings file.",
    after_help = "EXAMPLES:\n\
        \x20 strata start-app blog --add-to-settings\n\
        \x20 strata manage-file blog --layer controllers --suffix post --scope posts\n\
        \x20 strata manage-project-app rest_framework --type third-party\n\
        \x20 strata completions bash > /usr/share/bash-completion/completions/strata",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new app from a template.
    #[command(
        name = "start-app",
        about = "Create a new app from a template",
        after_help = "EXAMPLES:\n\
            \x20 strata start-app blog\n\
            \x20 strata start-app blog --template api --add-to-settings\n\
            \x20 strata start-app blog --template-path ./my-template --dir apps"
    )]
    StartApp(StartAppArgs),

    /// Create, enable, disable or clean up layer files.
    #[command(
        name = "manage-file",
        visible_alias = "mf",
        about = "Manage layer files and their imports",
        after_help = "EXAMPLES:\n\
            \x20 strata manage-file shop --layer controllers --suffix review --scope reviews\n\
            \x20 strata manage-file shop --layer serializers --suffix user --disable\n\
            \x20 strata manage-file shop --layer controllers --scope reviews --cleanup"
    )]
    ManageFile(ManageFileArgs),

    /// Add or remove entries of the settings app lists.
    #[command(
        name = "manage-project-app",
        visible_alias = "mpa",
        about = "Manage entries of the settings app lists",
        after_help = "EXAMPLES:\n\
            \x20 strata manage-project-app shop\n\
            \x20 strata manage-project-app django_filters --type third-party --comment \"filtering\"\n\
            \x20 strata manage-project-app debug_toolbar --type dev --soft-remove"
    )]
    ManageProjectApp(ManageProjectAppArgs),

    /// List available app templates.
    #[command(
        name = "list-templates",
        visible_alias = "ls",
        about = "List available app templates"
    )]
    ListTemplates(ListTemplatesArgs),

    /// Remove every `__pycache__` directory below the project root.
    #[command(name = "clean-pycache", about = "Remove __pycache__ directories")]
    CleanPycache(CleanPycacheArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 strata completions bash > ~/.local/share/bash-completion/completions/strata\n\
            \x20 strata completions zsh  > ~/.zfunc/_strata\n\
            \x20 strata completions fish > ~/.config/fish/completions/strata.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the resolved configuration.
    #[command(
        about = "Configuration inspection",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 strata config show\n\
            \x20 strata config get project.settings_file\n\
            \x20 strata config path"
    )]
    Config(ConfigCommands),
}

// ── start-app ─────────────────────────────────────────────────────────────────

/// Arguments for `strata start-app`.
#[derive(Debug, Args)]
pub struct StartAppArgs {
    /// App name; must be a valid Python identifier.
    #[arg(value_name = "NAME", help = "App name")]
    pub name: String,

    /// Named template (built-in or under the templates directory).
    #[arg(
        short = 't',
        long = "template",
        value_name = "NAME",
        help = "Template name (default from [templates] default)"
    )]
    pub template: Option<String>,

    /// Load the template from this directory instead of by name.
    #[arg(
        long = "template-path",
        value_name = "DIR",
        conflicts_with = "template",
        help = "Template directory"
    )]
    pub template_path: Option<PathBuf>,

    /// Parent directory of the new app, relative to the project root.
    #[arg(
        short = 'd',
        long = "dir",
        value_name = "DIR",
        help = "Parent directory for the app (default: project root)"
    )]
    pub dir: Option<PathBuf>,

    /// Replace an existing app directory (destructive).
    #[arg(long = "force", help = "Replace an existing app directory")]
    pub force: bool,

    /// Register the app in the project apps list.
    #[arg(long = "add-to-settings", help = "Add the app to PROJECT_APPS")]
    pub add_to_settings: bool,

    /// Preview without writing.
    #[arg(long = "dry-run", help = "Show what would be created")]
    pub dry_run: bool,

    /// Skip the confirmation prompt when replacing.
    #[arg(short = 'y', long = "yes", help = "Do not ask before replacing")]
    pub yes: bool,
}

// ── manage-file ───────────────────────────────────────────────────────────────

/// Arguments for `strata manage-file`.
#[derive(Debug, Args)]
pub struct ManageFileArgs {
    /// App package name.
    #[arg(value_name = "APP")]
    pub app: String,

    /// Layer directory inside the app, e.g. `controllers`.
    #[arg(short = 'l', long = "layer", value_name = "LAYER")]
    pub layer: String,

    /// File suffix; the module is `<prefix><suffix>.py`.
    #[arg(
        short = 's',
        long = "suffix",
        value_name = "SUFFIX",
        required_unless_present = "cleanup"
    )]
    pub suffix: Option<String>,

    /// Nested scope inside the layer, e.g. `user/profile`.
    #[arg(long = "scope", value_name = "PATH")]
    pub scope: Option<String>,

    /// Docstring header for a new file.
    #[arg(long = "description", value_name = "TEXT")]
    pub description: Option<String>,

    /// Overwrite an existing file.
    #[arg(long = "force")]
    pub force: bool,

    /// Uncomment the file's import.
    #[arg(long = "enable")]
    pub enable: bool,

    /// Comment out the file's import.
    #[arg(long = "disable")]
    pub disable: bool,

    /// Delete files and prune empty scopes.
    #[arg(long = "cleanup")]
    pub cleanup: bool,

    /// Preview without writing.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

// ── manage-project-app ────────────────────────────────────────────────────────

/// Arguments for `strata manage-project-app`.
#[derive(Debug, Args)]
pub struct ManageProjectAppArgs {
    /// App label or package name.
    #[arg(value_name = "APP")]
    pub app: String,

    /// Which list to edit.
    #[arg(
        short = 't',
        long = "type",
        value_enum,
        default_value = "project",
        help = "List to edit"
    )]
    pub kind: AppListKind,

    /// Trailing comment for an added entry.
    #[arg(long = "comment", value_name = "TEXT")]
    pub comment: Option<String>,

    /// Delete the entry.
    #[arg(long = "remove")]
    pub remove: bool,

    /// Comment the entry out.
    #[arg(long = "soft-remove")]
    pub soft_remove: bool,

    /// Uncomment a soft-removed entry.
    #[arg(long = "restore")]
    pub restore: bool,

    /// Register a project app even if its folder is missing.
    #[arg(long = "force")]
    pub force: bool,

    /// Preview without writing.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// The settings list a `manage-project-app` edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppListKind {
    Project,
    #[value(alias = "third_party")]
    ThirdParty,
    Dev,
}

impl From<AppListKind> for SettingsCategory {
    fn from(kind: AppListKind) -> Self {
        match kind {
            AppListKind::Project => SettingsCategory::Project,
            AppListKind::ThirdParty => SettingsCategory::ThirdParty,
            AppListKind::Dev => SettingsCategory::Dev,
        }
    }
}

// ── list-templates ────────────────────────────────────────────────────────────

/// Arguments for `strata list-templates`.
#[derive(Debug, Args)]
pub struct ListTemplatesArgs {
    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list-templates` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
}

// ── clean-pycache ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CleanPycacheArgs {
    /// Report what would be removed.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `strata completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `strata config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the fully resolved configuration as TOML.
    Show,
    /// Print the configuration files that are consulted, in order.
    Path,
    /// Print the value of one configuration key.
    Get {
        /// Dotted key path, e.g. `project.settings_file`.
        key: String,
    },
}

// ── tests ─────────────────────────────────────────────────────────────────────
