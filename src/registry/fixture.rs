//! Template trees on disk for registry and watcher tests.

use crate::config::{ComponentConfig, RepositoryConfig, TemplatesConfig};
use crate::funcs::Collaborators;
use std::{fs, path::Path};
use tempfile::TempDir;

pub const BASE: &str = r#"<html><head><title>{% block title %}Glasskube{% endblock %}</title></head><body>{% block body %}{% endblock %}</body></html>"#;

pub const PACKAGE: &str = r#"{% extends "layout/base.html" %}
{%- block title %}{{ package.spec.packageInfo.name }}{% endblock %}
{%- block body %}{% include "components/pkg-detail-header.html" %}<div class="md">{{ description | markdown }}</div>{% endblock %}"#;

pub const PACKAGES: &str = r#"{% extends "layout/base.html" %}
{%- block body %}{% for name in names | reversed %}{{ name }};{% endfor %}{% include "components/toast.html" %}{% endblock %}"#;

pub const HEADER: &str = r#"<header>{{ package.spec.packageInfo.name }}{% include "components/pkg-detail-btns.html" %}</header>"#;

pub const BUTTONS: &str =
    r#"<button{% if is_suspended(pkg=package) %} disabled{% endif %}>Update</button>"#;

pub const TOAST: &str = r#"<div class="toast">{{ message }}</div>"#;

pub struct Fixture {
    pub dir: TempDir,
    pub config: TemplatesConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let files = [
            ("layout/base.html", BASE),
            ("pages/package.html", PACKAGE),
            ("pages/packages.html", PACKAGES),
            ("components/pkg-detail-header.html", HEADER),
            ("components/pkg-detail-btns.html", BUTTONS),
            ("components/toast.html", TOAST),
        ];
        for (name, content) in files {
            write(dir.path(), name, content);
        }

        let config = TemplatesConfig {
            root: dir.path().to_path_buf(),
            layout: "base".into(),
            pages: vec!["package".into(), "packages".into()],
            components: vec![
                ComponentConfig {
                    name: "pkg-detail-header".into(),
                    requires: vec!["pkg-detail-btns".into()],
                },
                ComponentConfig {
                    name: "toast".into(),
                    requires: vec![],
                },
            ],
        };

        Self { dir, config }
    }

    pub fn write(&self, name: &str, content: &str) {
        write(self.dir.path(), name, content);
    }

    pub fn collaborators() -> Collaborators {
        Collaborators::from_config(&RepositoryConfig::default())
    }
}

fn write(root: &Path, name: &str, content: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
