use anyhow::anyhow;

/// Message set selector. The installer ships exactly one localized
/// catalogue; rejecting other tags here keeps the CLI surface honest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    French,
}

impl Locale {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "fr" | "fr-FR" => Ok(Self::French),
            _ => Err(anyhow!("unsupported locale: {value} (available: fr)")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        "fr"
    }

    pub fn messages(&self) -> &'static Messages {
        match self {
            Self::French => &FRENCH,
        }
    }
}

/// User-facing strings, one field per message the CLI prints.
#[derive(Debug)]
pub struct Messages {
    pub step_directories: &'static str,
    pub step_purge: &'static str,
    pub step_stage: &'static str,
    pub step_shortcut: &'static str,
    pub step_finalize: &'static str,
    pub install_complete: &'static str,
    pub install_failed_at_step: &'static str,
    pub retry_after_closing: &'static str,
    pub warning_prefix: &'static str,
    pub dry_run_header: &'static str,
    pub plan_root: &'static str,
    pub plan_purge: &'static str,
    pub plan_stage: &'static str,
    pub plan_shortcut_selected: &'static str,
    pub plan_shortcut_skipped: &'static str,
    pub plan_launch: &'static str,
    pub report_staged: &'static str,
    pub report_skipped_current: &'static str,
    pub report_purged: &'static str,
    pub report_shortcut_created: &'static str,
    pub report_shortcut_skipped: &'static str,
    pub report_launched: &'static str,
    pub uninstall_done: &'static str,
    pub uninstall_not_installed: &'static str,
    pub uninstall_repaired: &'static str,
    pub doctor_root: &'static str,
    pub doctor_installed_version: &'static str,
    pub doctor_not_installed: &'static str,
    pub doctor_shortcut: &'static str,
    pub doctor_shortcut_none: &'static str,
    pub doctor_staged_files: &'static str,
}

static FRENCH: Messages = Messages {
    step_directories: "création des dossiers",
    step_purge: "suppression de l'état périmé",
    step_stage: "copie des fichiers",
    step_shortcut: "raccourci sur le Bureau",
    step_finalize: "finalisation",
    install_complete: "Installation terminée",
    install_failed_at_step: "Échec à l'étape",
    retry_after_closing: "Fermez l'application en cours d'exécution puis relancez l'installation.",
    warning_prefix: "avertissement",
    dry_run_header: "Plan d'installation (aucune modification)",
    plan_root: "dossier d'installation",
    plan_purge: "à supprimer avant copie",
    plan_stage: "à copier",
    plan_shortcut_selected: "raccourci sur le Bureau : oui",
    plan_shortcut_skipped: "raccourci sur le Bureau : non",
    plan_launch: "lancement de l'application en fin d'installation",
    report_staged: "fichiers copiés",
    report_skipped_current: "entrées déjà à jour",
    report_purged: "état périmé supprimé",
    report_shortcut_created: "raccourci créé",
    report_shortcut_skipped: "raccourci non demandé",
    report_launched: "application lancée",
    uninstall_done: "Désinstallation terminée",
    uninstall_not_installed: "Application non installée",
    uninstall_repaired: "Dossier d'installation incomplet supprimé",
    doctor_root: "dossier d'installation",
    doctor_installed_version: "version installée",
    doctor_not_installed: "aucune installation détectée",
    doctor_shortcut: "raccourci",
    doctor_shortcut_none: "raccourci : aucun",
    doctor_staged_files: "fichiers suivis",
};
