use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::Path;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use bossdex::app_state::{AppConfig, AppState};
use bossdex::commands;
use bossdex::repl::readline;

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bossdex=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load();
    let last_save = config.last_save_path.clone();

    let (tx, mut rx) = mpsc::channel(32);
    let state = AppState::new(config, tx);

    tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            commands::print_update(&update);
        }
    });

    if let Some(path) = last_save.filter(|p| Path::new(p).exists()) {
        commands::watch(&path, &state).await;
    }

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &state).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "boss checklist")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a save file and reconcile it on every change
    Watch {
        #[arg(short, long)]
        path: String,
    },
    Unwatch,
    /// Re-run reconciliation without reporting kills
    Refresh,
    List {
        #[arg(short, long)]
        zone: Option<String>,
    },
    Zones,
    /// Manually set a boss's killed state for the current save
    Mark {
        #[arg(short, long)]
        id: String,
        #[arg(short, long, action = clap::ArgAction::Set)]
        killed: bool,
    },
    /// Add a boss to the catalog, or update an existing one
    AddBoss {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "Boss")]
        category: String,
        #[arg(short, long)]
        zone: String,
        #[arg(short, long)]
        id: Option<String>,
    },
    ClearOverrides,
    Settings {
        #[arg(long)]
        manual_edit: Option<bool>,
        #[arg(long)]
        boss_editing: Option<bool>,
    },
    Status,
    Config,
    Exit,
}

async fn respond(line: &str, state: &AppState) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "bossdex".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Watch { path }) => commands::watch(path, state).await,
        Some(Commands::Unwatch) => commands::unwatch(state).await,
        Some(Commands::Refresh) => commands::refresh(state).await,
        Some(Commands::List { zone }) => commands::list(state, zone.as_deref()).await,
        Some(Commands::Zones) => commands::zones(state).await,
        Some(Commands::Mark { id, killed }) => commands::mark(state, id, *killed).await,
        Some(Commands::AddBoss {
            name,
            category,
            zone,
            id,
        }) => commands::add_boss(state, name, category, zone, id.as_deref()).await,
        Some(Commands::ClearOverrides) => commands::clear_overrides(state).await,
        Some(Commands::Settings {
            manual_edit,
            boss_editing,
        }) => commands::settings(state, *manual_edit, *boss_editing).await,
        Some(Commands::Status) => commands::status(state).await,
        Some(Commands::Config) => commands::show_config(state).await,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
