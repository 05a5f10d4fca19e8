use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use semver::Version;

use crate::layout::InstallLayout;
use crate::stage::StagedFile;

/// Bookkeeping written into the install root after a successful run. It
/// drives the if-newer overwrite policy and shortcut replacement on the
/// next run, and is destroyed together with the root on uninstall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReceipt {
    pub app: String,
    pub version: Version,
    pub app_id: String,
    pub shortcut: Option<String>,
    pub staged: Vec<StagedFile>,
    pub installed_at_unix: u64,
}

pub fn write_install_receipt(
    layout: &InstallLayout,
    receipt: &InstallReceipt,
) -> Result<PathBuf> {
    let mut payload = String::new();
    push_value(&mut payload, "app", &receipt.app)?;
    push_value(&mut payload, "version", &receipt.version.to_string())?;
    push_value(&mut payload, "app_id", &receipt.app_id)?;
    if let Some(shortcut) = &receipt.shortcut {
        push_value(&mut payload, "shortcut", shortcut)?;
    }
    for file in &receipt.staged {
        if file.dest.contains('\n') || file.dest.contains('\t') {
            return Err(anyhow!("receipt values must not contain tabs or newlines"));
        }
        payload.push_str(&format!("staged={}\t{}\n", file.dest, file.sha256));
    }
    payload.push_str(&format!(
        "installed_at_unix={}\n",
        receipt.installed_at_unix
    ));

    let path = layout.receipt_path();
    fs::write(&path, payload.as_bytes())
        .with_context(|| format!("failed to write install receipt: {}", path.display()))?;
    Ok(path)
}

pub fn read_install_receipt(layout: &InstallLayout) -> Result<Option<InstallReceipt>> {
    let path = layout.receipt_path();
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read install receipt: {}", path.display()));
        }
    };

    let receipt = parse_receipt(&raw)
        .with_context(|| format!("failed to parse install receipt: {}", path.display()))?;
    Ok(Some(receipt))
}

pub(crate) fn parse_receipt(raw: &str) -> Result<InstallReceipt> {
    let mut app = None;
    let mut version = None;
    let mut app_id = None;
    let mut shortcut = None;
    let mut staged = Vec::new();
    let mut installed_at_unix = None;

    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key {
            "app" => app = Some(value.to_string()),
            "version" => {
                version = Some(Version::parse(value).context("version must be semver")?)
            }
            "app_id" => app_id = Some(value.to_string()),
            "shortcut" => shortcut = Some(value.to_string()),
            "staged" => {
                let Some((dest, sha256)) = value.split_once('\t') else {
                    return Err(anyhow!("invalid staged row format"));
                };
                if dest.trim().is_empty() {
                    return Err(anyhow!("staged row destination must not be empty"));
                }
                staged.push(StagedFile {
                    dest: dest.to_string(),
                    sha256: sha256.to_string(),
                });
            }
            "installed_at_unix" => {
                installed_at_unix =
                    Some(value.parse().context("installed_at_unix must be u64")?)
            }
            _ => {}
        }
    }

    Ok(InstallReceipt {
        app: app.context("missing app")?,
        version: version.context("missing version")?,
        app_id: app_id.context("missing app_id")?,
        shortcut,
        staged,
        installed_at_unix: installed_at_unix.context("missing installed_at_unix")?,
    })
}

pub fn current_unix_timestamp() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system time is before unix epoch")?
        .as_secs())
}

fn push_value(payload: &mut String, key: &str, value: &str) -> Result<()> {
    if value.contains('\n') || value.contains('\t') {
        return Err(anyhow!("receipt values must not contain tabs or newlines"));
    }
    payload.push_str(&format!("{key}={value}\n"));
    Ok(())
}
