use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use csn_setup_core::ShortcutSpec;

use crate::errors::InstallError;
use crate::layout::InstallLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutOutcome {
    Created { path: PathBuf },
    SkippedUnselected,
    Failed,
}

/// Creates the desktop shortcut when its owning task was selected.
///
/// The gate is a plain set-membership check: an unselected task produces
/// no filesystem effect at all. Re-running with the task selected
/// replaces the existing launcher file, so a second run leaves exactly
/// one shortcut. Every failure maps to `ShortcutCreationFailed`, which
/// the orchestrator downgrades to a warning.
pub fn maybe_create_shortcut(
    layout: &InstallLayout,
    spec: &ShortcutSpec,
    selected_tasks: &HashSet<String>,
    desktop_dir_override: Option<&Path>,
) -> Result<ShortcutOutcome, InstallError> {
    if !selected_tasks.contains(&spec.task) {
        return Ok(ShortcutOutcome::SkippedUnselected);
    }

    match create_shortcut(layout, spec, desktop_dir_override) {
        Ok(path) => Ok(ShortcutOutcome::Created { path }),
        Err(err) => Err(InstallError::ShortcutCreationFailed {
            reason: format!("{err:#}"),
        }),
    }
}

pub fn remove_shortcut(path: &Path) -> Result<()> {
    remove_file_if_exists(path)
        .with_context(|| format!("failed to remove shortcut: {}", path.display()))?;
    Ok(())
}

fn create_shortcut(
    layout: &InstallLayout,
    spec: &ShortcutSpec,
    desktop_dir_override: Option<&Path>,
) -> Result<PathBuf> {
    let target = layout.resolve(&spec.target)?;
    if !target.exists() {
        return Err(anyhow!(
            "shortcut target '{}' was not found in install root: {}",
            spec.target,
            target.display()
        ));
    }

    let desktop_dir = match desktop_dir_override {
        Some(dir) => dir.to_path_buf(),
        None => resolve_user_desktop_dir()?,
    };
    fs::create_dir_all(&desktop_dir)
        .with_context(|| format!("failed to create {}", desktop_dir.display()))?;

    create_shortcut_in(&desktop_dir, spec, &target)
}

pub(crate) fn create_shortcut_in(
    desktop_dir: &Path,
    spec: &ShortcutSpec,
    target: &Path,
) -> Result<PathBuf> {
    let path = desktop_dir.join(shortcut_filename(&spec.display_name));
    remove_file_if_exists(&path)
        .with_context(|| format!("failed to replace existing shortcut: {}", path.display()))?;

    let launcher = render_shortcut_launcher(spec, target);
    fs::write(&path, launcher.as_bytes())
        .with_context(|| format!("failed to write shortcut: {}", path.display()))?;
    Ok(path)
}

fn resolve_user_desktop_dir() -> Result<PathBuf> {
    if cfg!(windows) {
        let profile = std::env::var("USERPROFILE")
            .context("USERPROFILE is not set; cannot resolve the user desktop")?;
        return Ok(project_user_desktop_dir(Path::new(&profile)));
    }

    let home = std::env::var("HOME").context("HOME is not set; cannot resolve the user desktop")?;
    Ok(project_user_desktop_dir(Path::new(&home)))
}

pub(crate) fn project_user_desktop_dir(profile: &Path) -> PathBuf {
    profile.join("Desktop")
}

pub(crate) fn shortcut_filename(display_name: &str) -> String {
    format!(
        "{}.{}",
        normalize_shortcut_token(display_name),
        shortcut_extension()
    )
}

fn shortcut_extension() -> &'static str {
    if cfg!(windows) {
        "cmd"
    } else if cfg!(target_os = "linux") {
        "desktop"
    } else {
        "command"
    }
}

pub(crate) fn normalize_shortcut_token(value: &str) -> String {
    let normalized = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
                ch
            } else {
                '-'
            }
        })
        .collect::<String>();
    let trimmed = normalized.trim_matches('-');
    if trimmed.is_empty() {
        "app".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(windows)]
pub(crate) fn render_shortcut_launcher(spec: &ShortcutSpec, target: &Path) -> String {
    format!(
        "@echo off\r\nREM {}\r\n\"{}\" %*\r\n",
        sanitize_metadata_value(&spec.display_name),
        target.display()
    )
}

#[cfg(target_os = "linux")]
pub(crate) fn render_shortcut_launcher(spec: &ShortcutSpec, target: &Path) -> String {
    let mut desktop = String::new();
    desktop.push_str("[Desktop Entry]\n");
    desktop.push_str("Type=Application\n");
    desktop.push_str(&format!(
        "Name={}\n",
        sanitize_metadata_value(&spec.display_name)
    ));
    desktop.push_str(&format!("Exec=\"{}\"\n", target.display()));
    desktop
}

#[cfg(all(not(windows), not(target_os = "linux")))]
pub(crate) fn render_shortcut_launcher(spec: &ShortcutSpec, target: &Path) -> String {
    format!(
        "#!/bin/sh\n# {}\nexec \"{}\" \"$@\"\n",
        sanitize_metadata_value(&spec.display_name),
        target.display()
    )
}

pub(crate) fn sanitize_metadata_value(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}

pub(crate) fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
