use std::path::{Path, PathBuf};

use csn_setup_core::{InstallManifest, Locale};
use csn_setup_installer::{
    InstallPhase, InstallPlan, InstallReport, PlannedEntry, PurgeOutcome, ShortcutOutcome,
    StagedFile,
};

use crate::flows::{
    format_plan_lines, format_report_lines, payload_root_for, selected_tasks, step_label,
};
use crate::render::{render_status_line, OutputStyle};

fn sample_manifest() -> InstallManifest {
    InstallManifest::from_toml_str(
        r#"
app = "EtiquettesCSN"
display_name = "Etiquettes CSN"
version = "1.4.0"
publisher = "Club Subaquatique de Nantes"
app_id = "7b3f2a9c-51d4-4e8a-9f06-2c8d41b7a5e0"

[[tasks]]
id = "desktopicon"
description = "Créer une icône sur le Bureau"

[[tasks]]
id = "autostart"
description = "Lancer au démarrage"
default = true
"#,
    )
    .expect("manifest must parse")
}

#[test]
fn render_status_line_plain_is_unadorned() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, "ok", "installation terminée"),
        "installation terminée"
    );
}

#[test]
fn render_status_line_rich_includes_ascii_badge() {
    assert_eq!(
        render_status_line(OutputStyle::Rich, "ok", "installation terminée"),
        "[OK] installation terminée"
    );
}

#[test]
fn render_status_line_rich_formats_warning() {
    assert_eq!(
        render_status_line(OutputStyle::Rich, "warn", "raccourci ignoré"),
        "[WARN] raccourci ignoré"
    );
}

#[test]
fn step_labels_name_each_phase_in_french() {
    let messages = Locale::French.messages();
    assert_eq!(
        step_label(messages, InstallPhase::DirectoriesReady),
        "création des dossiers"
    );
    assert_eq!(
        step_label(messages, InstallPhase::StateMigrated),
        "suppression de l'état périmé"
    );
    assert_eq!(
        step_label(messages, InstallPhase::FilesStaged),
        "copie des fichiers"
    );
}

#[test]
fn selected_tasks_merge_defaults_and_flags() {
    let manifest = sample_manifest();

    let defaults = selected_tasks(&manifest, &[]).expect("defaults must resolve");
    assert!(defaults.contains("autostart"));
    assert!(!defaults.contains("desktopicon"));

    let merged = selected_tasks(&manifest, &["desktopicon".to_string()])
        .expect("explicit task must resolve");
    assert!(merged.contains("autostart"));
    assert!(merged.contains("desktopicon"));
}

#[test]
fn selected_tasks_reject_unknown_id() {
    let manifest = sample_manifest();
    let err = selected_tasks(&manifest, &["fullscreen".to_string()])
        .expect_err("unknown task must be rejected");
    assert!(err.to_string().contains("tâche inconnue"));
}

#[test]
fn payload_defaults_to_manifest_directory() {
    assert_eq!(
        payload_root_for(Path::new("/packages/csn/etiquettes-csn.toml")),
        PathBuf::from("/packages/csn")
    );
    assert_eq!(
        payload_root_for(Path::new("etiquettes-csn.toml")),
        PathBuf::from(".")
    );
}

#[test]
fn plan_lines_walk_through_every_decision() {
    let messages = Locale::French.messages();
    let plan = InstallPlan {
        root: PathBuf::from("/home/user/.local/share/EtiquettesCSN"),
        directories: vec!["data".to_string()],
        purge: vec!["data/app.db".to_string()],
        entries: vec![
            PlannedEntry {
                source: "EtiquettesCSN.exe".to_string(),
                dest: "EtiquettesCSN.exe".to_string(),
                overwrite: csn_setup_core::OverwritePolicy::Always,
                recursive: false,
            },
            PlannedEntry {
                source: "templates".to_string(),
                dest: "src/app/templates".to_string(),
                overwrite: csn_setup_core::OverwritePolicy::Always,
                recursive: true,
            },
        ],
        shortcut_selected: Some(true),
        launch: true,
    };

    let lines = format_plan_lines(&plan, messages);
    assert_eq!(lines[0], "Plan d'installation (aucune modification)");
    assert!(lines
        .iter()
        .any(|line| line.contains("/home/user/.local/share/EtiquettesCSN")));
    assert!(lines
        .iter()
        .any(|line| line.contains("data/app.db")));
    assert!(lines
        .iter()
        .any(|line| line.contains("templates -> src/app/templates (récursif)")));
    assert!(lines.contains(&"raccourci sur le Bureau : oui".to_string()));
    assert!(lines.contains(&"lancement de l'application en fin d'installation".to_string()));
}

#[test]
fn report_lines_summarize_the_run() {
    let messages = Locale::French.messages();
    let report = InstallReport {
        root: PathBuf::from("/home/user/.local/share/EtiquettesCSN"),
        purged: vec![
            ("data/app.db".to_string(), PurgeOutcome::Removed),
            ("data/cache.tmp".to_string(), PurgeOutcome::Absent),
        ],
        staged: vec![StagedFile {
            dest: "EtiquettesCSN.exe".to_string(),
            sha256: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
                .to_string(),
        }],
        skipped_entries: 1,
        shortcut: ShortcutOutcome::Created {
            path: PathBuf::from("/home/user/Desktop/Etiquettes-CSN.desktop"),
        },
        launched: true,
        warnings: Vec::new(),
    };

    let lines = format_report_lines(&report, messages);
    assert!(lines.iter().any(|line| line == "fichiers copiés : 1"));
    assert!(lines.iter().any(|line| line == "entrées déjà à jour : 1"));
    assert!(lines
        .iter()
        .any(|line| line == "état périmé supprimé : data/app.db"));
    assert!(
        !lines.iter().any(|line| line.contains("data/cache.tmp")),
        "absent purges are not reported"
    );
    assert!(lines
        .iter()
        .any(|line| line.contains("raccourci créé : /home/user/Desktop/Etiquettes-CSN.desktop")));
    assert!(lines.contains(&"application lancée".to_string()));
}

#[test]
fn skipped_shortcut_is_reported_without_a_path() {
    let messages = Locale::French.messages();
    let report = InstallReport {
        root: PathBuf::from("/tmp/root"),
        purged: Vec::new(),
        staged: Vec::new(),
        skipped_entries: 0,
        shortcut: ShortcutOutcome::SkippedUnselected,
        launched: false,
        warnings: Vec::new(),
    };

    let lines = format_report_lines(&report, messages);
    assert!(lines.contains(&"raccourci non demandé".to_string()));
    assert!(!lines.iter().any(|line| line.contains("raccourci créé")));
    assert!(!lines.contains(&"application lancée".to_string()));
}
