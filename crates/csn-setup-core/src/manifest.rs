use std::collections::HashSet;
use std::path::{Component, Path};

use anyhow::{anyhow, Context};
use semver::Version;
use serde::{Deserialize, Serialize};

/// Declarative description of one application install, shipped as a TOML
/// file next to the packaged payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallManifest {
    pub app: String,
    pub display_name: String,
    pub version: Version,
    pub publisher: String,
    pub app_id: String,
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub purge: Vec<StaleStateRule>,
    pub shortcut: Option<ShortcutSpec>,
    #[serde(default)]
    pub tasks: Vec<TaskOption>,
    pub post_install: Option<PostInstallAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub source: String,
    pub dest: String,
    #[serde(default)]
    pub overwrite: OverwritePolicy,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    #[default]
    Always,
    IfNewerVersion,
}

impl OverwritePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::IfNewerVersion => "if-newer-version",
        }
    }
}

/// Prior local state removed before staging so the new version regenerates
/// it from scratch. Deletion is policy, not an accident.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaleStateRule {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShortcutSpec {
    pub display_name: String,
    pub target: String,
    pub task: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskOption {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostInstallAction {
    pub command: String,
    #[serde(default = "default_skip_if_silent")]
    pub skip_if_silent: bool,
}

fn default_skip_if_silent() -> bool {
    true
}

impl InstallManifest {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let manifest: Self = toml::from_str(input).context("failed to parse install manifest")?;

        validate_app_token(&manifest.app)?;
        validate_app_id(&manifest.app_id)?;

        for dir in &manifest.directories {
            validate_relative_path(dir)
                .with_context(|| format!("invalid directory entry: {dir}"))?;
        }
        for entry in &manifest.files {
            validate_relative_path(&entry.source)
                .with_context(|| format!("invalid file source: {}", entry.source))?;
            validate_relative_path(&entry.dest)
                .with_context(|| format!("invalid file destination: {}", entry.dest))?;
        }
        for rule in &manifest.purge {
            validate_relative_path(&rule.path)
                .with_context(|| format!("invalid purge target: {}", rule.path))?;
        }

        let mut seen_tasks = HashSet::new();
        for task in &manifest.tasks {
            if task.id.trim().is_empty() {
                return Err(anyhow!("task id must not be empty"));
            }
            if !seen_tasks.insert(task.id.as_str()) {
                return Err(anyhow!("duplicate task declaration '{}'", task.id));
            }
        }

        if let Some(shortcut) = &manifest.shortcut {
            validate_relative_path(&shortcut.target).with_context(|| {
                format!("invalid shortcut target: {}", shortcut.target)
            })?;
            if !seen_tasks.contains(shortcut.task.as_str()) {
                return Err(anyhow!(
                    "shortcut references undeclared task '{}'",
                    shortcut.task
                ));
            }
        }

        if let Some(action) = &manifest.post_install {
            validate_relative_path(&action.command).with_context(|| {
                format!("invalid post-install command: {}", action.command)
            })?;
        }

        Ok(manifest)
    }

    /// Task ids selected when the invoker passes no explicit choices.
    pub fn default_tasks(&self) -> HashSet<String> {
        self.tasks
            .iter()
            .filter(|task| task.default)
            .map(|task| task.id.clone())
            .collect()
    }

    pub fn task_ids(&self) -> HashSet<String> {
        self.tasks.iter().map(|task| task.id.clone()).collect()
    }
}

fn validate_app_token(value: &str) -> anyhow::Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("app name must not be empty"));
    }
    if value
        .chars()
        .any(|ch| !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.'))
    {
        return Err(anyhow!(
            "app name contains invalid character(s): {value}"
        ));
    }
    Ok(())
}

fn validate_app_id(value: &str) -> anyhow::Result<()> {
    // Canonical UUID form: 8-4-4-4-12 hex groups.
    let groups: Vec<&str> = value.split('-').collect();
    let expected_lens = [8usize, 4, 4, 4, 12];
    if groups.len() != expected_lens.len() {
        return Err(anyhow!("app_id is not a canonical UUID: {value}"));
    }
    for (group, expected_len) in groups.iter().zip(expected_lens) {
        if group.len() != expected_len || !group.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(anyhow!("app_id is not a canonical UUID: {value}"));
        }
    }
    Ok(())
}

fn validate_relative_path(path: &str) -> anyhow::Result<()> {
    let relative = Path::new(path);
    if relative.as_os_str().is_empty() {
        return Err(anyhow!("path must not be empty"));
    }
    if relative.is_absolute() {
        return Err(anyhow!("path must be relative: {path}"));
    }
    if relative
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(anyhow!("path must not include '..': {path}"));
    }
    Ok(())
}
