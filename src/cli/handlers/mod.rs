mod init;
pub use init::cmd_init;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::engine::MentionEngine;
use crate::io::config_io;
use crate::io::source::StaffFileSource;
use crate::model::config::MentionConfig;
use crate::ops::directory::RefreshOutcome;

/// Environment variable holding the log filter (`warn` when unset).
pub const LOG_ENV: &str = "MENTION_LOG";

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        command,
        json,
        config,
        staff,
        me,
        log: _,
    } = cli;
    let load = || load_config(config.as_deref(), staff.as_deref(), me.as_deref());

    match command {
        // Init runs before any config exists
        Some(Commands::Init(args)) => cmd_init(args),
        Some(Commands::Suggest(args)) => cmd_suggest(&load()?, args, json),
        Some(Commands::Insert(args)) => cmd_insert(&load()?, args, json),
        Some(Commands::Edit(args)) => cmd_edit(&load()?, args.text),
        None => cmd_edit(&load()?, String::new()),
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install the global subscriber. Logs go to `log_file` when given, else to
/// stderr.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| e.to_string())?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Config from `--config` or ./mention.toml, with command-line overrides applied.
fn load_config(
    explicit: Option<&Path>,
    staff: Option<&Path>,
    me: Option<&str>,
) -> Result<MentionConfig, Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let mut config = config_io::load_config(explicit, &cwd)?;
    if let Some(staff) = staff {
        config.directory.staff_file = Some(staff.to_path_buf());
    }
    if let Some(me) = me {
        config.directory.current_user = Some(me.to_string());
    }
    Ok(config)
}

fn staff_source(config: &MentionConfig) -> Result<StaffFileSource, Box<dyn std::error::Error>> {
    let path = config.directory.staff_file.as_ref().ok_or(
        "no staff file configured (set [directory].staff_file in mention.toml or pass --staff)",
    )?;
    Ok(StaffFileSource::new(path))
}

/// Engine with the directory loaded synchronously. A failed fetch is an
/// error here: one-shot commands have no cached data to fall back on.
fn loaded_engine(config: &MentionConfig) -> Result<MentionEngine, Box<dyn std::error::Error>> {
    let source = staff_source(config)?;
    let mut engine = MentionEngine::from_config(&config.directory);
    match engine.refresh_from(&source) {
        RefreshOutcome::Applied { count } => {
            debug!(count, path = %source.path().display(), "staff directory loaded");
            Ok(engine)
        }
        RefreshOutcome::Failed { message } => Err(message.into()),
        RefreshOutcome::Discarded(reason) => {
            Err(format!("staff directory refresh discarded: {:?}", reason).into())
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_suggest(
    config: &MentionConfig,
    args: SuggestArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = loaded_engine(config)?;
    let cursor = args.cursor.unwrap_or(args.text.len());
    engine.on_text_changed(&args.text, cursor);

    let token = engine.active_token();
    let state = engine.current_suggestion_state();
    if json {
        println!("{}", serde_json::to_string_pretty(&suggest_to_json(token, state))?);
    } else {
        for line in format_suggestions(token, state) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_insert(
    config: &MentionConfig,
    args: InsertArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = loaded_engine(config)?;
    let cursor = args.cursor.unwrap_or(args.text.len());
    engine.on_text_changed(&args.text, cursor);

    if engine.active_token().is_none() {
        return Err("no active mention at the cursor".into());
    }
    let state = engine.current_suggestion_state();
    let Some(candidate) = state.candidates.get(args.pick).cloned() else {
        return Err(format!(
            "no suggestion at index {} ({} available)",
            args.pick,
            state.candidates.len()
        )
        .into());
    };

    let insertion = engine
        .on_candidate_clicked(args.pick)
        .ok_or("suggestion could not be confirmed")?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&insert_to_json(&insertion, Some(&candidate)))?
        );
    } else {
        println!("{}", insertion.text);
    }
    Ok(())
}

fn cmd_edit(config: &MentionConfig, text: String) -> Result<(), Box<dyn std::error::Error>> {
    let source = Arc::new(staff_source(config)?);
    let final_text = crate::tui::run(config, source, text)?;
    println!("{}", final_text);
    Ok(())
}
