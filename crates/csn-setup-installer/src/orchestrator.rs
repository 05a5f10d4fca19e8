use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use csn_setup_core::{InstallManifest, OverwritePolicy, PostInstallAction};

use crate::errors::InstallError;
use crate::layout::{default_user_root, InstallLayout};
use crate::purge::{purge_stale_state, PurgeOutcome};
use crate::receipt::{
    current_unix_timestamp, read_install_receipt, write_install_receipt, InstallReceipt,
};
use crate::shortcut::{maybe_create_shortcut, ShortcutOutcome};
use crate::stage::{stage_entry, StageOutcome, StagedFile};

/// Install state machine. Transitions are strictly sequential within a
/// single run; `Failed` is terminal and reachable from any step. Nothing
/// is rolled back on failure: every step is idempotent, so recovery is a
/// plain re-run of the whole procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
    Start,
    DirectoriesReady,
    StateMigrated,
    FilesStaged,
    ShortcutResolved,
    Complete,
    Failed,
}

impl InstallPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::DirectoriesReady => "directories-ready",
            Self::StateMigrated => "state-migrated",
            Self::FilesStaged => "files-staged",
            Self::ShortcutResolved => "shortcut-resolved",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

/// Explicit invocation configuration. There are no ambient globals: the
/// silent flag, selected tasks and overrides all arrive here.
#[derive(Debug)]
pub struct InstallRequest<'a> {
    pub manifest: &'a InstallManifest,
    pub payload_root: &'a Path,
    pub root_override: Option<PathBuf>,
    pub silent: bool,
    pub selected_tasks: HashSet<String>,
    pub desktop_dir_override: Option<PathBuf>,
}

#[derive(Debug)]
pub struct InstallReport {
    pub root: PathBuf,
    pub purged: Vec<(String, PurgeOutcome)>,
    pub staged: Vec<StagedFile>,
    pub skipped_entries: u64,
    pub shortcut: ShortcutOutcome,
    pub launched: bool,
    pub warnings: Vec<String>,
}

/// Names the step a fatal error aborted, for the exit message.
#[derive(Debug)]
pub struct StepFailure {
    pub phase: InstallPhase,
    pub error: InstallError,
}

#[derive(Debug)]
pub enum StepEvent<'a> {
    PhaseReached(InstallPhase),
    EntryStaged { dest: &'a str, files: u64 },
    EntrySkipped { dest: &'a str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub source: String,
    pub dest: String,
    pub overwrite: OverwritePolicy,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    pub root: PathBuf,
    pub directories: Vec<String>,
    pub purge: Vec<String>,
    pub entries: Vec<PlannedEntry>,
    pub shortcut_selected: Option<bool>,
    pub launch: bool,
}

pub fn run_install(request: &InstallRequest) -> Result<InstallReport, StepFailure> {
    run_install_with_observer(request, &mut |_event: &StepEvent| {})
}

pub fn run_install_with_observer(
    request: &InstallRequest,
    observer: &mut dyn FnMut(&StepEvent),
) -> Result<InstallReport, StepFailure> {
    let manifest = request.manifest;
    let mut warnings = Vec::new();

    let root = resolve_root(request)
        .map_err(|error| fail_at(InstallPhase::DirectoriesReady, error))?;
    let layout = InstallLayout::new(root);

    layout
        .ensure_directories(&manifest.directories)
        .map_err(|error| fail_at(InstallPhase::DirectoriesReady, error))?;
    observer(&StepEvent::PhaseReached(InstallPhase::DirectoriesReady));

    // Stale state is discarded strictly before any file lands.
    let mut purged = Vec::with_capacity(manifest.purge.len());
    for rule in &manifest.purge {
        let outcome = purge_stale_state(&layout, rule)
            .map_err(|error| fail_at(InstallPhase::StateMigrated, error))?;
        purged.push((rule.path.clone(), outcome));
    }
    observer(&StepEvent::PhaseReached(InstallPhase::StateMigrated));

    let previous = match read_install_receipt(&layout) {
        Ok(previous) => previous,
        Err(err) => {
            warnings.push(format!(
                "previous install receipt is unreadable; treating as first install: {err:#}"
            ));
            None
        }
    };
    let previous_version = previous.as_ref().map(|receipt| &receipt.version);

    let mut staged = Vec::new();
    let mut skipped_entries = 0u64;
    for entry in &manifest.files {
        let outcome = stage_entry(
            &layout,
            request.payload_root,
            entry,
            &manifest.version,
            previous_version,
        )
        .map_err(|error| fail_at(InstallPhase::FilesStaged, error))?;
        match outcome {
            StageOutcome::Copied { files } => {
                observer(&StepEvent::EntryStaged {
                    dest: &entry.dest,
                    files: files.len() as u64,
                });
                staged.extend(files);
            }
            StageOutcome::SkippedCurrent => {
                skipped_entries += 1;
                observer(&StepEvent::EntrySkipped { dest: &entry.dest });
            }
        }
    }
    observer(&StepEvent::PhaseReached(InstallPhase::FilesStaged));

    // The shortcut is a convenience: its failure becomes a warning and
    // never aborts the run.
    let shortcut = match &manifest.shortcut {
        Some(spec) => match maybe_create_shortcut(
            &layout,
            spec,
            &request.selected_tasks,
            request.desktop_dir_override.as_deref(),
        ) {
            Ok(outcome) => outcome,
            Err(error) => {
                warnings.push(format!("{error:#}"));
                ShortcutOutcome::Failed
            }
        },
        None => ShortcutOutcome::SkippedUnselected,
    };
    // A shortcut from an earlier opt-in stays recorded so uninstall can
    // still remove it.
    let shortcut_record = match &shortcut {
        ShortcutOutcome::Created { path } => Some(path.display().to_string()),
        _ => previous.as_ref().and_then(|receipt| receipt.shortcut.clone()),
    };
    observer(&StepEvent::PhaseReached(InstallPhase::ShortcutResolved));

    let bookkeeping = current_unix_timestamp().and_then(|now| {
        write_install_receipt(
            &layout,
            &InstallReceipt {
                app: manifest.app.clone(),
                version: manifest.version.clone(),
                app_id: manifest.app_id.clone(),
                shortcut: shortcut_record,
                staged: staged.clone(),
                installed_at_unix: now,
            },
        )
    });
    if let Err(err) = bookkeeping {
        warnings.push(format!("failed to record install receipt: {err:#}"));
    }

    let mut launched = false;
    if let Some(action) = &manifest.post_install {
        if should_launch(action, request.silent) {
            match spawn_post_install(&layout, &action.command) {
                Ok(()) => launched = true,
                Err(err) => warnings.push(format!("post-install launch failed: {err:#}")),
            }
        }
    }
    observer(&StepEvent::PhaseReached(InstallPhase::Complete));

    Ok(InstallReport {
        root: layout.root().to_path_buf(),
        purged,
        staged,
        skipped_entries,
        shortcut,
        launched,
        warnings,
    })
}

/// Previews every decision of a run without touching the filesystem.
pub fn plan_install(request: &InstallRequest) -> Result<InstallPlan, InstallError> {
    let manifest = request.manifest;
    let root = resolve_root(request)?;

    let entries = manifest
        .files
        .iter()
        .map(|entry| PlannedEntry {
            source: entry.source.clone(),
            dest: entry.dest.clone(),
            overwrite: entry.overwrite,
            recursive: entry.recursive,
        })
        .collect();

    let shortcut_selected = manifest
        .shortcut
        .as_ref()
        .map(|spec| request.selected_tasks.contains(&spec.task));

    let launch = manifest
        .post_install
        .as_ref()
        .map(|action| should_launch(action, request.silent))
        .unwrap_or(false);

    Ok(InstallPlan {
        root,
        directories: manifest.directories.clone(),
        purge: manifest.purge.iter().map(|rule| rule.path.clone()).collect(),
        entries,
        shortcut_selected,
        launch,
    })
}

pub(crate) fn should_launch(action: &PostInstallAction, silent: bool) -> bool {
    !(silent && action.skip_if_silent)
}

fn resolve_root(request: &InstallRequest) -> Result<PathBuf, InstallError> {
    match &request.root_override {
        Some(root) => Ok(root.clone()),
        None => default_user_root(&request.manifest.app).map_err(InstallError::from),
    }
}

fn fail_at(phase: InstallPhase, error: InstallError) -> StepFailure {
    StepFailure { phase, error }
}

/// Spawn, do not join: the installer hands the process off and never
/// observes its exit.
fn spawn_post_install(layout: &InstallLayout, command: &str) -> Result<()> {
    let path = layout.resolve(command)?;
    if !path.exists() {
        return Err(anyhow!(
            "post-install command was not found in install root: {}",
            path.display()
        ));
    }

    Command::new(&path)
        .current_dir(layout.root())
        .spawn()
        .with_context(|| format!("failed to launch {}", path.display()))?;
    Ok(())
}
