use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Longest absolute path the installer will create. Windows stays under
/// the classic MAX_PATH ceiling since long-path opt-in cannot be assumed.
pub const MAX_INSTALL_PATH_LEN: usize = if cfg!(windows) { 259 } else { 4095 };

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("permission denied: {path}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("path exceeds the platform length limit: {path}")]
    PathTooLong { path: PathBuf },

    #[error("packaged source is missing: {path}")]
    SourceMissing { path: PathBuf },

    #[error("destination is locked by a running process: {path}")]
    DestinationLocked {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("shortcut creation failed: {reason}")]
    ShortcutCreationFailed { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl InstallError {
    /// Fatal errors abort the remaining steps; the only non-fatal kind is
    /// the shortcut, which is a convenience rather than core install state.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ShortcutCreationFailed { .. })
    }

    /// A recoverable error means the user can fix the condition (close the
    /// running application) and re-run the whole procedure.
    pub fn user_recoverable(&self) -> bool {
        matches!(self, Self::DestinationLocked { .. })
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::PermissionDenied { .. } => 10,
            Self::PathTooLong { .. } => 11,
            Self::SourceMissing { .. } => 12,
            Self::DestinationLocked { .. } => 13,
            Self::ShortcutCreationFailed { .. } | Self::Other(_) => 1,
        }
    }
}

pub(crate) fn io_context(err: io::Error, message: String) -> InstallError {
    InstallError::Other(anyhow::Error::new(err).context(message))
}

pub(crate) fn classify_create_error(path: &Path, err: io::Error) -> InstallError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => InstallError::PermissionDenied {
            path: path.to_path_buf(),
            source: err,
        },
        _ => io_context(err, format!("failed to create {}", path.display())),
    }
}

/// An existing destination the OS refuses to replace is the
/// running-application case; anything else is a plain permission problem.
pub(crate) fn classify_replace_error(path: &Path, err: io::Error) -> InstallError {
    if path.exists() && err.kind() == io::ErrorKind::PermissionDenied {
        return InstallError::DestinationLocked {
            path: path.to_path_buf(),
            source: err,
        };
    }
    match err.kind() {
        io::ErrorKind::PermissionDenied => InstallError::PermissionDenied {
            path: path.to_path_buf(),
            source: err,
        },
        _ => io_context(err, format!("failed to replace {}", path.display())),
    }
}
