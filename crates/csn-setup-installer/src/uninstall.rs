use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use semver::Version;

use crate::layout::InstallLayout;
use crate::receipt::read_install_receipt;
use crate::shortcut::remove_shortcut;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallStatus {
    NotInstalled,
    Uninstalled,
    RepairedStaleState,
}

impl UninstallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInstalled => "not-installed",
            Self::Uninstalled => "uninstalled",
            Self::RepairedStaleState => "repaired-stale-state",
        }
    }
}

#[derive(Debug)]
pub struct UninstallResult {
    pub status: UninstallStatus,
    pub version: Option<Version>,
    pub removed_shortcut: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Removes the recorded shortcut and the whole install root. A root
/// without a readable receipt is still removed, reported as
/// `RepairedStaleState` since the shortcut bookkeeping is gone with it.
pub fn uninstall_app(layout: &InstallLayout) -> Result<UninstallResult> {
    if !layout.root().exists() {
        return Ok(UninstallResult {
            status: UninstallStatus::NotInstalled,
            version: None,
            removed_shortcut: None,
            warnings: Vec::new(),
        });
    }

    let mut warnings = Vec::new();
    let receipt = match read_install_receipt(layout) {
        Ok(receipt) => receipt,
        Err(err) => {
            warnings.push(format!("install receipt is unreadable: {err:#}"));
            None
        }
    };

    let mut removed_shortcut = None;
    if let Some(shortcut) = receipt.as_ref().and_then(|receipt| receipt.shortcut.clone()) {
        let path = PathBuf::from(shortcut);
        match remove_shortcut(&path) {
            Ok(()) => removed_shortcut = Some(path),
            Err(err) => warnings.push(format!("{err:#}")),
        }
    }

    fs::remove_dir_all(layout.root())
        .with_context(|| format!("failed to remove install root: {}", layout.root().display()))?;

    Ok(UninstallResult {
        status: if receipt.is_some() {
            UninstallStatus::Uninstalled
        } else {
            UninstallStatus::RepairedStaleState
        },
        version: receipt.map(|receipt| receipt.version),
        removed_shortcut,
        warnings,
    })
}
