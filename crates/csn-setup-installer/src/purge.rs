use std::fs;
use std::io;

use csn_setup_core::StaleStateRule;

use crate::errors::{classify_replace_error, InstallError};
use crate::layout::InstallLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    Removed,
    Absent,
}

impl PurgeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Removed => "removed",
            Self::Absent => "absent",
        }
    }
}

/// Deletes prior local state so the new version regenerates it from
/// scratch. This is deliberate, irreversible discard policy, not a
/// backup-and-restore. A missing target is the first-install case and
/// counts as success.
pub fn purge_stale_state(
    layout: &InstallLayout,
    rule: &StaleStateRule,
) -> Result<PurgeOutcome, InstallError> {
    let path = layout.resolve(&rule.path)?;
    match fs::remove_file(&path) {
        Ok(()) => Ok(PurgeOutcome::Removed),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(PurgeOutcome::Absent),
        Err(err) => Err(classify_replace_error(&path, err)),
    }
}
