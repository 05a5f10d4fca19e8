use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::errors::{classify_create_error, InstallError, MAX_INSTALL_PATH_LEN};

/// Resolved install root for one application. All destination paths are
/// derived from here; nothing is ever written outside it except the
/// opt-in desktop shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn receipt_path(&self) -> PathBuf {
        self.root.join("setup.receipt")
    }

    /// Joins a validated relative path onto the root, enforcing the
    /// platform path-length ceiling.
    pub fn resolve(&self, rel: &str) -> Result<PathBuf, InstallError> {
        let relative = validated_relative_path(rel)?;
        let full = self.root.join(relative);
        ensure_path_within_limit(&full)?;
        Ok(full)
    }

    pub fn ensure_root(&self) -> Result<(), InstallError> {
        ensure_path_within_limit(&self.root)?;
        fs::create_dir_all(&self.root).map_err(|err| classify_create_error(&self.root, err))
    }

    /// Creates every listed directory under the root. Idempotent: an
    /// already-existing directory is a success, not an error.
    pub fn ensure_directories(&self, dirs: &[String]) -> Result<Vec<PathBuf>, InstallError> {
        self.ensure_root()?;
        let mut ensured = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let path = self.resolve(dir)?;
            fs::create_dir_all(&path).map_err(|err| classify_create_error(&path, err))?;
            ensured.push(path);
        }
        Ok(ensured)
    }
}

/// Per-user install root, writable without elevation.
pub fn default_user_root(app: &str) -> Result<PathBuf> {
    if cfg!(windows) {
        let app_data = std::env::var("LOCALAPPDATA")
            .context("LOCALAPPDATA is not set; cannot resolve Windows user install root")?;
        return Ok(PathBuf::from(app_data).join(app));
    }

    let home =
        std::env::var("HOME").context("HOME is not set; cannot resolve user install root")?;
    Ok(PathBuf::from(home).join(".local").join("share").join(app))
}

pub(crate) fn validated_relative_path(path: &str) -> Result<&Path, InstallError> {
    let relative = Path::new(path);
    if relative.as_os_str().is_empty() {
        return Err(InstallError::Other(anyhow!("path must not be empty")));
    }
    if relative.is_absolute() {
        return Err(InstallError::Other(anyhow!(
            "path must be relative: {path}"
        )));
    }
    if relative
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(InstallError::Other(anyhow!(
            "path must not include '..': {path}"
        )));
    }
    Ok(relative)
}

pub(crate) fn ensure_path_within_limit(path: &Path) -> Result<(), InstallError> {
    if path.as_os_str().len() > MAX_INSTALL_PATH_LEN {
        return Err(InstallError::PathTooLong {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
