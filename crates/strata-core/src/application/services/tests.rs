//! Failure-path tests with mocked ports. Happy paths run against the
//! in-memory filesystem in `tests/`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::*;
use crate::{
    application::{
        ApplicationError,
        ports::{DirEntry, TemplateRenderer, output::MockFilesystem, output::MockTemplateStore},
    },
    domain::{
        AppTemplate, DomainError, LayerCatalog, ProjectStructure, RenderContext, SettingsCategory,
        SettingsOp, TemplateContent, TemplateSource,
    },
    error::{StrataError, StrataResult},
};

struct DirectRenderer;

impl TemplateRenderer for DirectRenderer {
    fn render(&self, template: &AppTemplate, context: &RenderContext) -> StrataResult<ProjectStructure> {
        Ok(template.render(context)?)
    }
}

fn io_error(path: &Path) -> StrataError {
    ApplicationError::filesystem(path, "disk full").into()
}

fn blog_template() -> AppTemplate {
    AppTemplate::new("default", TemplateSource::Builtin)
        .with_file("apps.py", TemplateContent::Text("name = '{{app_name}}'\n".into()))
        .with_file("models/__init__.py", TemplateContent::Text(String::new()))
}

fn store_with(template: AppTemplate) -> MockTemplateStore {
    let mut store = MockTemplateStore::new();
    store
        .expect_load()
        .withf(|name: &str| name == "default")
        .returning(move |_| Ok(template.clone()));
    store
}

fn request() -> StartAppRequest {
    StartAppRequest {
        name: "blog".into(),
        template: "default".into(),
        dest_dir: PathBuf::new(),
        force: false,
        add_to_settings: false,
        dry_run: false,
    }
}

#[test]
fn start_app_removes_staging_when_a_write_fails() {
    let mut fs = MockFilesystem::new();
    fs.expect_exists().returning(|_| false);
    fs.expect_create_dir_all().returning(|_| Ok(()));
    fs.expect_write_file()
        .returning(|path, _| Err(io_error(path)));
    fs.expect_remove_dir_all()
        .withf(|path: &Path| {
            path.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with(".strata-staging-"))
        })
        .times(1)
        .returning(|_| Ok(()));
    fs.expect_rename().never();
    fs.expect_write_atomic().never();

    let service = AppTemplateService::new(
        Box::new(store_with(blog_template())),
        Box::new(DirectRenderer),
        Arc::new(fs),
        "/project",
    );

    let err = service.start_app(request(), None).unwrap_err();
    assert!(matches!(
        err,
        StrataError::Application(ApplicationError::FilesystemError { .. })
    ));
}

#[test]
fn start_app_refuses_existing_destination_before_rendering() {
    let mut fs = MockFilesystem::new();
    fs.expect_exists()
        .withf(|p: &Path| p == Path::new("/project/blog"))
        .returning(|_| true);
    fs.expect_create_dir_all().never();
    fs.expect_write_file().never();

    let service = AppTemplateService::new(
        Box::new(store_with(blog_template())),
        Box::new(DirectRenderer),
        Arc::new(fs),
        "/project",
    );

    let err = service.start_app(request(), None).unwrap_err();
    assert_eq!(
        err,
        StrataError::Application(ApplicationError::DestinationExists {
            path: PathBuf::from("blog")
        })
    );
}

#[test]
fn start_app_surfaces_missing_template() {
    let mut store = MockTemplateStore::new();
    store.expect_load().returning(|name| {
        Err(ApplicationError::TemplateNotFound {
            name: name.to_string(),
            available: vec!["default".into()],
        }
        .into())
    });
    let mut fs = MockFilesystem::new();
    fs.expect_write_file().never();

    let service = AppTemplateService::new(
        Box::new(store),
        Box::new(DirectRenderer),
        Arc::new(fs),
        "/project",
    );
    let mut req = request();
    req.template = "api".into();

    let err = service.start_app(req, None).unwrap_err();
    assert!(matches!(
        err,
        StrataError::Application(ApplicationError::TemplateNotFound { ref name, .. }) if name == "api"
    ));
}

#[test]
fn start_app_checks_settings_before_writing() {
    let mut fs = MockFilesystem::new();
    fs.expect_exists()
        .withf(|p: &Path| p == Path::new("/project/blog"))
        .returning(|_| false);
    fs.expect_exists()
        .withf(|p: &Path| p == Path::new("/project/settings.py"))
        .returning(|_| true);
    fs.expect_read_to_string()
        .returning(|_| Ok("INSTALLED_APPS = []\n".into()));
    fs.expect_create_dir_all().never();
    fs.expect_write_file().never();
    let fs: Arc<dyn crate::application::Filesystem> = Arc::new(fs);

    let settings = SettingsService::new(Arc::clone(&fs), "/project", "settings.py");
    let service = AppTemplateService::new(
        Box::new(store_with(blog_template())),
        Box::new(DirectRenderer),
        fs,
        "/project",
    );
    let mut req = request();
    req.add_to_settings = true;

    let err = service.start_app(req, Some(&settings)).unwrap_err();
    assert_eq!(
        err,
        StrataError::Domain(DomainError::ListNotFound {
            list: "PROJECT_APPS".into()
        })
    );
}

#[test]
fn settings_edit_requires_the_file() {
    let mut fs = MockFilesystem::new();
    fs.expect_is_dir().returning(|_| true);
    fs.expect_exists().returning(|_| false);
    fs.expect_write_atomic().never();

    let service = SettingsService::new(Arc::new(fs), "/project", "config/settings.py");
    let err = service
        .edit(
            SettingsCategory::Project,
            "shop",
            &SettingsOp::Add { comment: None },
            false,
            false,
        )
        .unwrap_err();
    assert_eq!(err.category(), crate::error::ErrorCategory::NotFound);
}

#[test]
fn settings_guard_blocks_missing_app_folder() {
    let mut fs = MockFilesystem::new();
    fs.expect_is_dir()
        .withf(|p: &Path| p == Path::new("/project/shop"))
        .returning(|_| false);
    fs.expect_read_to_string().never();

    let service = SettingsService::new(Arc::new(fs), "/project", "settings.py");
    let err = service
        .edit(
            SettingsCategory::Project,
            "shop",
            &SettingsOp::Add { comment: None },
            false,
            false,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StrataError::Application(ApplicationError::AppFolderMissing { .. })
    ));
}

#[test]
fn failed_settings_write_is_reported() {
    let mut fs = MockFilesystem::new();
    fs.expect_exists().returning(|_| true);
    fs.expect_read_to_string()
        .returning(|_| Ok("DEV_APPS = [\n]\n".into()));
    fs.expect_write_atomic()
        .times(1)
        .returning(|path, _| Err(io_error(path)));

    let service = SettingsService::new(Arc::new(fs), "/project", "settings.py");
    let err = service
        .edit(
            SettingsCategory::Dev,
            "django_extensions",
            &SettingsOp::Add { comment: None },
            false,
            false,
        )
        .unwrap_err();
    assert_eq!(err.category(), crate::error::ErrorCategory::Internal);
}

#[test]
fn create_file_validates_before_touching_disk() {
    let mut fs = MockFilesystem::new();
    fs.expect_is_dir()
        .withf(|p: &Path| p == Path::new("/project/shop"))
        .returning(|_| false);
    fs.expect_write_file().never();
    fs.expect_create_dir_all().never();

    let service = ScaffoldService::new(Arc::new(fs), LayerCatalog::default(), "/project");

    let err = service
        .create_file(CreateFileRequest {
            app: "shop".into(),
            layer: "controllers".into(),
            suffix: "review".into(),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        StrataError::Application(ApplicationError::NotFound { what: "app directory", .. })
    ));

    let err = service
        .create_file(CreateFileRequest {
            app: "shop".into(),
            layer: "views".into(),
            suffix: "review".into(),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, StrataError::Domain(DomainError::UnknownLayer { .. })));
}

#[test]
fn toggle_rejects_both_flags() {
    let fs = MockFilesystem::new();
    let service = ScaffoldService::new(Arc::new(fs), LayerCatalog::default(), "/project");
    let err = service
        .toggle(ToggleRequest {
            app: "shop".into(),
            layer: "controllers".into(),
            suffix: "review".into(),
            enable: true,
            disable: true,
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, StrataError::Domain(DomainError::ConflictingFlags { .. })));
}

#[test]
fn pycache_sizes_are_summed() {
    let mut fs = MockFilesystem::new();
    fs.expect_list_dir().returning(|path| {
        let entry = |name: &str, is_dir: bool| DirEntry {
            name: name.to_string(),
            path: path.join(name),
            is_dir,
        };
        Ok(match path.to_str().unwrap_or_default() {
            "/p" => vec![entry("shop", true), entry(".git", true)],
            "/p/shop" => vec![entry("__pycache__", true), entry("models.py", false)],
            "/p/shop/__pycache__" => vec![entry("a.pyc", false), entry("b.pyc", false)],
            _ => Vec::new(),
        })
    });
    fs.expect_file_size().returning(|_| Ok(512));
    fs.expect_remove_dir_all()
        .withf(|p: &Path| p == Path::new("/p/shop/__pycache__"))
        .times(1)
        .returning(|_| Ok(()));

    let report = PycacheService::new(Arc::new(fs), "/p").clean(false).unwrap();
    assert_eq!(report.total_bytes, 1024);
    assert_eq!(report.directories.len(), 1);
    assert_eq!(report.directories[0].path, PathBuf::from("shop/__pycache__"));
}
