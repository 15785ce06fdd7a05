//! NApp scaffolding
//!
//! Bootstraps `<owner>/<name>/` with starter files for a new NApp.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::error::{NappError, Result};
use crate::napp::host::MODULE_MARKER;
use crate::napp::types::MANIFEST_FILE;

const DEFAULT_DESCRIPTION: &str = "<<<< Insert your NApp description here >>>>";

const UI_SECTIONS: &[&str] = &["k-info-panel", "k-toolbar", "k-action-menu"];

const INIT_TEMPLATE: &str = r#""""NApp {{username}}/{{napp}}."""
"#;

const MAIN_TEMPLATE: &str = r#""""Main module of {{username}}/{{napp}} Kytos Network Application.

{{description}}
"""

from kytos.core import KytosNApp, log

from napps.{{username}}.{{napp}} import settings


class Main(KytosNApp):
    """Main class of {{username}}/{{napp}} NApp.

    This class is the entry point for this NApp.
    """

    def setup(self):
        """Replace the '__init__' method for the KytosNApp subclass."""

    def execute(self):
        """Run after the setup method execution."""

    def shutdown(self):
        """Run when your NApp is unloaded."""
"#;

const SETTINGS_TEMPLATE: &str = r#""""Module with the Constants used in the {{username}}/{{napp}}."""
"#;

const README_TEMPLATE: &str = r#"Overview
========

{{description}}

Requirements
============

Events
======
"#;

const UI_README_TEMPLATE: &str = r#"Place {{section}} components of {{username}}/{{napp}} here.
"#;

/// Inputs for [`create_napp`]
#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub username: String,
    pub napp: String,
    pub description: String,
    /// Meta packages only carry metadata: no code and no UI
    pub meta_package: bool,
}

/// Files written by [`create_napp`]
#[derive(Debug)]
pub struct ScaffoldResult {
    pub napp_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Validate an owner or NApp name: a letter followed by at least two
/// letters, digits or underscores
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = || NappError::InvalidNappName {
        name: name.to_string(),
    };

    let mut chars = name.chars();
    let first = chars.next().ok_or_else(invalid)?;
    if !first.is_ascii_alphabetic() || name.len() < 3 {
        return Err(invalid());
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid());
    }

    Ok(())
}

/// Replace `{{key}}` placeholders
pub fn render(template: &str, context: &[(&str, &str)]) -> String {
    context
        .iter()
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{{{}}}}}", key), value)
        })
}

/// Create `<dir>/<username>/<napp>/` from the built-in templates
pub fn create_napp(dir: &Path, options: &ScaffoldOptions) -> Result<ScaffoldResult> {
    validate_name(&options.username)?;
    validate_name(&options.napp)?;

    let owner_dir = dir.join(&options.username);
    let napp_dir = owner_dir.join(&options.napp);
    if napp_dir.exists() {
        return Err(NappError::NappAlreadyExists { path: napp_dir });
    }

    let description = if options.description.trim().is_empty() {
        DEFAULT_DESCRIPTION
    } else {
        options.description.trim()
    };
    let context = [
        ("username", options.username.as_str()),
        ("napp", options.napp.as_str()),
        ("description", description),
    ];

    let mut files = Vec::new();

    fs::create_dir_all(&napp_dir)?;
    let owner_init = owner_dir.join(MODULE_MARKER);
    if !owner_init.exists() {
        fs::write(
            &owner_init,
            format!("\"\"\"NApps for the user {}.\"\"\"\n", options.username),
        )?;
        files.push(owner_init);
    }

    let manifest = json!({
        "username": options.username,
        "name": options.napp,
        "description": description,
        "version": "",
        "napp_dependencies": [],
        "license": "",
        "tags": [],
        "url": "",
    });
    let manifest_path = napp_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)? + "\n")?;
    files.push(manifest_path);

    let mut templates = vec![
        ("__init__.py", INIT_TEMPLATE),
        ("README.rst", README_TEMPLATE),
    ];
    if !options.meta_package {
        templates.push(("main.py", MAIN_TEMPLATE));
        templates.push(("settings.py", SETTINGS_TEMPLATE));
    }

    for (file_name, template) in templates {
        let path = napp_dir.join(file_name);
        fs::write(&path, render(template, &context))?;
        files.push(path);
    }

    if !options.meta_package {
        for &section in UI_SECTIONS {
            let section_dir = napp_dir.join("ui").join(section);
            fs::create_dir_all(&section_dir)?;

            let path = section_dir.join("README.rst");
            let mut section_context = context.to_vec();
            section_context.push(("section", section));
            fs::write(&path, render(UI_README_TEMPLATE, &section_context))?;
            files.push(path);
        }
    }

    tracing::info!(napp_dir = %napp_dir.display(), files = files.len(), "scaffolded NApp");
    Ok(ScaffoldResult { napp_dir, files })
}
