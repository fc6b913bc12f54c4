use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mention", about = concat!("[@] mention v", env!("CARGO_PKG_VERSION"), " - @-mention autocomplete for plain text fields"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Read settings from this file instead of ./mention.toml
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Staff directory JSON file (overrides [directory].staff_file)
    #[arg(long, global = true)]
    pub staff: Option<PathBuf>,

    /// Id of the authoring user, never suggested (overrides [directory].current_user)
    #[arg(long, global = true)]
    pub me: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter mention.toml in the current directory
    Init(InitArgs),
    /// Show the active mention and the suggestion list for a text
    Suggest(SuggestArgs),
    /// Confirm a suggestion and print the resulting text
    Insert(InsertArgs),
    /// Edit a text interactively with live suggestions
    Edit(EditArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing mention.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct SuggestArgs {
    /// The field's text
    pub text: String,
    /// Caret position as a byte offset (default: end of text)
    #[arg(long)]
    pub cursor: Option<usize>,
}

#[derive(Args)]
pub struct InsertArgs {
    /// The field's text
    pub text: String,
    /// Index of the suggestion to confirm
    #[arg(long)]
    pub pick: usize,
    /// Caret position as a byte offset (default: end of text)
    #[arg(long)]
    pub cursor: Option<usize>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Initial text of the field
    #[arg(long, default_value = "")]
    pub text: String,
}
