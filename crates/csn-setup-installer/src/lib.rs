mod checksum;
mod errors;
mod layout;
mod orchestrator;
mod purge;
mod receipt;
mod shortcut;
mod stage;
mod uninstall;

pub use checksum::{sha256_file_hex, sha256_hex};
pub use errors::InstallError;
pub use layout::{default_user_root, InstallLayout};
pub use orchestrator::{
    plan_install, run_install, run_install_with_observer, InstallPhase, InstallPlan, InstallReport,
    InstallRequest, PlannedEntry, StepEvent, StepFailure,
};
pub use purge::{purge_stale_state, PurgeOutcome};
pub use receipt::{
    current_unix_timestamp, read_install_receipt, write_install_receipt, InstallReceipt,
};
pub use shortcut::{maybe_create_shortcut, remove_shortcut, ShortcutOutcome};
pub use stage::{stage_entry, StageOutcome, StagedFile};
pub use uninstall::{uninstall_app, UninstallResult, UninstallStatus};
