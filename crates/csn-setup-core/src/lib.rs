mod locale;
mod manifest;

pub use locale::{Locale, Messages};
pub use manifest::{
    FileEntry, InstallManifest, OverwritePolicy, PostInstallAction, ShortcutSpec, StaleStateRule,
    TaskOption,
};
