//! Layer catalog and layer-file boilerplate.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;

use super::{AppName, DomainError, ScopePath, Suffix, aggregator_tree::AGGREGATOR_FILE};

const DEFAULT_LAYERS: [&str; 10] = [
    "admin",
    "controllers",
    "handlers",
    "models",
    "permissions",
    "selectors",
    "serializers",
    "services",
    "urls",
    "filters",
];

fn default_imports(layer: &str) -> &'static [&'static str] {
    match layer {
        "urls" => &[
            "from django.urls import path, include",
            "from django.conf import settings as cfg",
            "from django.conf.urls.static import static",
        ],
        "controllers" => &[
            "from rest_framework import viewsets, status, mixins",
            "from rest_framework.response import Response",
            "from rest_framework.decorators import action",
            "from rest_framework import permissions",
            "from django.shortcuts import get_object_or_404",
        ],
        "models" => &[
            "from django.db import models",
            "from django.utils import timezone",
            "from django.conf import settings as cfg",
            "from django.db.models import Q, F",
        ],
        "admin" => &[
            "from django.contrib import admin",
            "from django.utils.html import format_html",
        ],
        "serializers" => &[
            "from rest_framework import serializers",
            "from django.contrib.auth import get_user_model",
            "from rest_framework.validators import UniqueValidator",
        ],
        "services" => &[
            "import logging",
            "from django.db import transaction",
            "from django.core.exceptions import ObjectDoesNotExist",
        ],
        "permissions" => &["from rest_framework import permissions"],
        "selectors" => &["from django.db.models import Q"],
        "handlers" => &[
            "from django.dispatch import receiver",
            "from django.db.models.signals import post_save, pre_save, post_delete",
        ],
        "filters" => &[
            "from django_filters import rest_framework as filters",
            "from django.db.models import Q",
        ],
        _ => &[],
    }
}

/// Starter definition for a layer's role. `None` for layers with no known role.
fn skeleton(layer: &str, suffix: &Suffix) -> Option<String> {
    let name = suffix.as_str();
    let class = suffix.pascal();
    let body = match layer {
        "controllers" => format!(
            "class {class}ViewSet(viewsets.GenericViewSet):\n    permission_classes = [permissions.IsAuthenticated]\n"
        ),
        "serializers" => format!("class {class}Serializer(serializers.Serializer):\n    pass\n"),
        "models" => format!(
            "class {class}(models.Model):\n    created_at = models.DateTimeField(default=timezone.now)\n\n    class Meta:\n        ordering = [\"-created_at\"]\n"
        ),
        "admin" => format!("class {class}Admin(admin.ModelAdmin):\n    list_display = (\"id\",)\n"),
        "services" => format!(
            "logger = logging.getLogger(__name__)\n\n\nclass {class}Service:\n    @transaction.atomic\n    def execute(self, *args, **kwargs):\n        raise NotImplementedError\n"
        ),
        "selectors" => format!("def {name}_queryset(queryset, **filters):\n    return queryset.filter(Q(**filters))\n"),
        "permissions" => format!(
            "class {class}Permission(permissions.BasePermission):\n    def has_permission(self, request, view):\n        return True\n"
        ),
        "handlers" => format!("def on_{name}(sender, instance, **kwargs):\n    pass\n"),
        "filters" => format!("class {class}FilterSet(filters.FilterSet):\n    pass\n"),
        "urls" => "urlpatterns = []\n".to_string(),
        _ => return None,
    };
    Some(body)
}

/// Configured layer rules: which layers exist, what a new file imports,
/// which files are never cleaned up, and how files are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerCatalog {
    valid: Vec<String>,
    imports: BTreeMap<String, Vec<String>>,
    protected: BTreeSet<String>,
    file_prefix: String,
}

impl Default for LayerCatalog {
    fn default() -> Self {
        Self {
            valid: DEFAULT_LAYERS.iter().map(|s| s.to_string()).collect(),
            imports: BTreeMap::new(),
            protected: BTreeSet::from([AGGREGATOR_FILE.to_string()]),
            file_prefix: String::new(),
        }
    }
}

impl LayerCatalog {
    pub fn with_valid_layers(mut self, layers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.valid = layers.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the default imports of one layer.
    pub fn with_imports(
        mut self,
        layer: impl Into<String>,
        lines: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.imports
            .insert(layer.into(), lines.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_protected(mut self, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.protected = files.into_iter().map(Into::into).collect();
        // the aggregator is managed, never a cleanup candidate
        self.protected.insert(AGGREGATOR_FILE.to_string());
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    pub fn valid_layers(&self) -> &[String] {
        &self.valid
    }

    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }

    /// Accept `layer` only if it is configured.
    pub fn check(&self, layer: &str) -> Result<(), DomainError> {
        if self.valid.iter().any(|l| l == layer) {
            Ok(())
        } else {
            Err(DomainError::UnknownLayer {
                layer: layer.to_string(),
                valid: self.valid.clone(),
            })
        }
    }

    pub fn is_protected(&self, file_name: &str) -> bool {
        self.protected.contains(file_name)
    }

    pub fn imports_for(&self, layer: &str) -> Vec<String> {
        match self.imports.get(layer) {
            Some(lines) => lines.clone(),
            None => default_imports(layer).iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Module stem for a suffix: prefix plus suffix.
    pub fn module_name(&self, suffix: &Suffix) -> String {
        format!("{}{}", self.file_prefix, suffix)
    }

    /// Full content of a new layer file.
    pub fn render(&self, file: &LayerFile, description: Option<&str>) -> String {
        let path = file.relative_path(self);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut out = format!(
            "\"\"\"\n{file_name}: {}\nPath: {}\n\"\"\"\n\n",
            description.unwrap_or("Describe what this module provides."),
            path.display()
        );

        let imports = self.imports_for(&file.layer);
        if !imports.is_empty() {
            out.push_str(&imports.join("\n"));
            out.push_str("\n\n\n");
        }

        match skeleton(&file.layer, &file.suffix) {
            Some(body) => out.push_str(&body),
            None => out.push_str("# Your code starts here\n"),
        }
        out
    }
}

/// A source file inside an app layer: `<app>/<layer>/[<scope>/]<prefix><suffix>.py`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerFile {
    pub app: AppName,
    pub layer: String,
    pub scope: ScopePath,
    pub suffix: Suffix,
}

impl LayerFile {
    pub fn new(app: AppName, layer: impl Into<String>, scope: ScopePath, suffix: Suffix) -> Self {
        Self {
            app,
            layer: layer.into(),
            scope,
            suffix,
        }
    }

    /// `<app>/<layer>`, relative to the project root.
    pub fn layer_dir(&self) -> PathBuf {
        PathBuf::from(self.app.as_str()).join(&self.layer)
    }

    /// Directory holding the file and its aggregator.
    pub fn dir(&self) -> PathBuf {
        self.scope.resolve(&self.layer_dir())
    }

    pub fn relative_path(&self, catalog: &LayerCatalog) -> PathBuf {
        self.dir().join(format!("{}.py", catalog.module_name(&self.suffix)))
    }
}
