use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use csn_setup_core::Locale;

mod flows;
mod render;
#[cfg(test)]
mod tests;

use flows::{run_doctor_command, run_install_command, run_uninstall_command, InstallArgs};

#[derive(Parser, Debug)]
#[command(name = "csn-setup")]
#[command(about = "Installateur de l'application Etiquettes CSN", long_about = None)]
struct Cli {
    /// Langue des messages (« fr » uniquement).
    #[arg(long, global = true, default_value = "fr")]
    lang: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Installe ou met à niveau l'application.
    Install {
        /// Manifeste d'installation (TOML) livré avec le paquet.
        manifest: PathBuf,
        /// Dossier du paquet (par défaut : le dossier du manifeste).
        #[arg(long)]
        payload: Option<PathBuf>,
        /// Remplace le dossier d'installation par défaut.
        #[arg(long)]
        root: Option<PathBuf>,
        /// Mode silencieux : sortie brute, pas de lancement final.
        #[arg(long)]
        silent: bool,
        /// Active une tâche optionnelle (répétable), ex. desktopicon.
        #[arg(long = "task", value_name = "ID")]
        tasks: Vec<String>,
        /// Affiche le plan sans modifier la machine.
        #[arg(long)]
        dry_run: bool,
    },
    /// Supprime l'application installée.
    Uninstall {
        manifest: PathBuf,
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Affiche l'état de l'installation.
    Doctor {
        manifest: PathBuf,
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Affiche la version de l'installateur.
    Version,
    /// Génère le script de complétion pour un shell.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let locale = match Locale::parse(&cli.lang) {
        Ok(locale) => locale,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Install {
            manifest,
            payload,
            root,
            silent,
            tasks,
            dry_run,
        } => run_install_command(
            InstallArgs {
                manifest_path: manifest,
                payload,
                root,
                silent,
                tasks,
                dry_run,
            },
            locale,
        ),
        Commands::Uninstall { manifest, root } => run_uninstall_command(&manifest, root, locale),
        Commands::Doctor { manifest, root } => run_doctor_command(&manifest, root, locale),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "csn-setup", &mut std::io::stdout());
            ExitCode::SUCCESS
        }
    }
}
