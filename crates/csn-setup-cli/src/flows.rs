use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use csn_setup_core::{InstallManifest, Locale, Messages};
use csn_setup_installer::{
    default_user_root, plan_install, read_install_receipt, run_install_with_observer,
    uninstall_app, InstallLayout, InstallPhase, InstallPlan, InstallReport, InstallRequest,
    PurgeOutcome, ShortcutOutcome, StepEvent, UninstallStatus,
};

use crate::render::{current_output_style, render_status_line, OutputStyle, TerminalRenderer};

pub struct InstallArgs {
    pub manifest_path: PathBuf,
    pub payload: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub silent: bool,
    pub tasks: Vec<String>,
    pub dry_run: bool,
}

pub fn run_install_command(args: InstallArgs, locale: Locale) -> ExitCode {
    let messages = locale.messages();
    let style = if args.silent {
        OutputStyle::Plain
    } else {
        current_output_style()
    };

    let manifest = match load_manifest(&args.manifest_path) {
        Ok(manifest) => manifest,
        Err(err) => return fail(style, &format!("{err:#}"), 1),
    };
    let payload_root = args
        .payload
        .clone()
        .unwrap_or_else(|| payload_root_for(&args.manifest_path));
    let selected_tasks = match selected_tasks(&manifest, &args.tasks) {
        Ok(selected) => selected,
        Err(err) => return fail(style, &format!("{err:#}"), 2),
    };

    let request = InstallRequest {
        manifest: &manifest,
        payload_root: &payload_root,
        root_override: args.root.clone(),
        silent: args.silent,
        selected_tasks,
        desktop_dir_override: None,
    };

    if args.dry_run {
        return match plan_install(&request) {
            Ok(plan) => {
                for line in format_plan_lines(&plan, messages) {
                    println!("{line}");
                }
                ExitCode::SUCCESS
            }
            Err(err) => fail(style, &format!("{err:#}"), err.exit_code()),
        };
    }

    let renderer = TerminalRenderer::from_style(style);
    renderer.print_section(&format!("{} {}", manifest.display_name, manifest.version));

    let mut progress = renderer.start_progress(messages.step_stage, manifest.files.len() as u64);
    let mut completed_entries = 0u64;
    let result = run_install_with_observer(&request, &mut |event: &StepEvent| match event {
        StepEvent::EntryStaged { .. } | StepEvent::EntrySkipped { .. } => {
            completed_entries += 1;
            progress.set(completed_entries);
        }
        StepEvent::PhaseReached(_) => {}
    });

    match result {
        Ok(report) => {
            progress.finish_success();
            for line in format_report_lines(&report, messages) {
                println!("{}", render_status_line(style, "ok", &line));
            }
            for warning in &report.warnings {
                eprintln!(
                    "{}",
                    render_status_line(
                        style,
                        "warn",
                        &format!("{} : {warning}", messages.warning_prefix)
                    )
                );
            }
            println!("{}", render_status_line(style, "ok", messages.install_complete));
            ExitCode::SUCCESS
        }
        Err(failure) => {
            progress.finish_abandon();
            let step = step_label(messages, failure.phase);
            eprintln!(
                "{}",
                render_status_line(
                    style,
                    "err",
                    &format!(
                        "{} « {} » : {:#}",
                        messages.install_failed_at_step, step, failure.error
                    )
                )
            );
            if failure.error.user_recoverable() {
                eprintln!(
                    "{}",
                    render_status_line(style, "err", messages.retry_after_closing)
                );
            }
            ExitCode::from(failure.error.exit_code())
        }
    }
}

pub fn run_uninstall_command(
    manifest_path: &Path,
    root_override: Option<PathBuf>,
    locale: Locale,
) -> ExitCode {
    let messages = locale.messages();
    let style = current_output_style();

    let manifest = match load_manifest(manifest_path) {
        Ok(manifest) => manifest,
        Err(err) => return fail(style, &format!("{err:#}"), 1),
    };
    let layout = match resolve_layout(&manifest, root_override) {
        Ok(layout) => layout,
        Err(err) => return fail(style, &format!("{err:#}"), 1),
    };

    match uninstall_app(&layout) {
        Ok(result) => {
            for warning in &result.warnings {
                eprintln!(
                    "{}",
                    render_status_line(
                        style,
                        "warn",
                        &format!("{} : {warning}", messages.warning_prefix)
                    )
                );
            }
            let line = match result.status {
                UninstallStatus::Uninstalled => messages.uninstall_done,
                UninstallStatus::NotInstalled => messages.uninstall_not_installed,
                UninstallStatus::RepairedStaleState => messages.uninstall_repaired,
            };
            println!("{}", render_status_line(style, "ok", line));
            ExitCode::SUCCESS
        }
        Err(err) => fail(style, &format!("{err:#}"), 1),
    }
}

pub fn run_doctor_command(
    manifest_path: &Path,
    root_override: Option<PathBuf>,
    locale: Locale,
) -> ExitCode {
    let messages = locale.messages();
    let style = current_output_style();

    let manifest = match load_manifest(manifest_path) {
        Ok(manifest) => manifest,
        Err(err) => return fail(style, &format!("{err:#}"), 1),
    };
    let layout = match resolve_layout(&manifest, root_override) {
        Ok(layout) => layout,
        Err(err) => return fail(style, &format!("{err:#}"), 1),
    };

    println!(
        "{}",
        render_status_line(
            style,
            "step",
            &format!("{} : {}", messages.doctor_root, layout.root().display())
        )
    );
    match read_install_receipt(&layout) {
        Ok(Some(receipt)) => {
            println!(
                "{}",
                render_status_line(
                    style,
                    "step",
                    &format!("{} : {}", messages.doctor_installed_version, receipt.version)
                )
            );
            println!(
                "{}",
                render_status_line(
                    style,
                    "step",
                    &format!("{} : {}", messages.doctor_staged_files, receipt.staged.len())
                )
            );
            let shortcut_line = match &receipt.shortcut {
                Some(path) => format!("{} : {path}", messages.doctor_shortcut),
                None => messages.doctor_shortcut_none.to_string(),
            };
            println!("{}", render_status_line(style, "step", &shortcut_line));
        }
        Ok(None) => {
            println!(
                "{}",
                render_status_line(style, "step", messages.doctor_not_installed)
            );
        }
        Err(err) => {
            eprintln!(
                "{}",
                render_status_line(
                    style,
                    "warn",
                    &format!("{} : {err:#}", messages.warning_prefix)
                )
            );
        }
    }
    ExitCode::SUCCESS
}

pub(crate) fn step_label(messages: &Messages, phase: InstallPhase) -> &'static str {
    match phase {
        InstallPhase::DirectoriesReady => messages.step_directories,
        InstallPhase::StateMigrated => messages.step_purge,
        InstallPhase::FilesStaged => messages.step_stage,
        InstallPhase::ShortcutResolved => messages.step_shortcut,
        InstallPhase::Start | InstallPhase::Complete | InstallPhase::Failed => {
            messages.step_finalize
        }
    }
}

pub(crate) fn selected_tasks(
    manifest: &InstallManifest,
    requested: &[String],
) -> Result<HashSet<String>> {
    let known = manifest.task_ids();
    let mut selected = manifest.default_tasks();
    for task in requested {
        if !known.contains(task) {
            return Err(anyhow!("tâche inconnue : {task}"));
        }
        selected.insert(task.clone());
    }
    Ok(selected)
}

pub(crate) fn format_plan_lines(plan: &InstallPlan, messages: &Messages) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(messages.dry_run_header.to_string());
    lines.push(format!("{} : {}", messages.plan_root, plan.root.display()));
    for purge in &plan.purge {
        lines.push(format!("{} : {purge}", messages.plan_purge));
    }
    for entry in &plan.entries {
        let recursive = if entry.recursive { " (récursif)" } else { "" };
        lines.push(format!(
            "{} : {} -> {}{recursive}",
            messages.plan_stage, entry.source, entry.dest
        ));
    }
    match plan.shortcut_selected {
        Some(true) => lines.push(messages.plan_shortcut_selected.to_string()),
        Some(false) => lines.push(messages.plan_shortcut_skipped.to_string()),
        None => {}
    }
    if plan.launch {
        lines.push(messages.plan_launch.to_string());
    }
    lines
}

pub(crate) fn format_report_lines(report: &InstallReport, messages: &Messages) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("{} : {}", messages.plan_root, report.root.display()));
    lines.push(format!("{} : {}", messages.report_staged, report.staged.len()));
    if report.skipped_entries > 0 {
        lines.push(format!(
            "{} : {}",
            messages.report_skipped_current, report.skipped_entries
        ));
    }
    for (path, outcome) in &report.purged {
        if *outcome == PurgeOutcome::Removed {
            lines.push(format!("{} : {path}", messages.report_purged));
        }
    }
    match &report.shortcut {
        ShortcutOutcome::Created { path } => lines.push(format!(
            "{} : {}",
            messages.report_shortcut_created,
            path.display()
        )),
        ShortcutOutcome::SkippedUnselected => {
            lines.push(messages.report_shortcut_skipped.to_string())
        }
        ShortcutOutcome::Failed => {}
    }
    if report.launched {
        lines.push(messages.report_launched.to_string());
    }
    lines
}

fn load_manifest(path: &Path) -> Result<InstallManifest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    InstallManifest::from_toml_str(&raw)
}

pub(crate) fn payload_root_for(manifest_path: &Path) -> PathBuf {
    manifest_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn resolve_layout(
    manifest: &InstallManifest,
    root_override: Option<PathBuf>,
) -> Result<InstallLayout> {
    let root = match root_override {
        Some(root) => root,
        None => default_user_root(&manifest.app)?,
    };
    Ok(InstallLayout::new(root))
}

fn fail(style: OutputStyle, message: &str, code: u8) -> ExitCode {
    eprintln!("{}", render_status_line(style, "err", message));
    ExitCode::from(code)
}
