//! annotext - inspect and annotate rich-text documents from the terminal.
//!
//! # Usage
//!
//! ```bash
//! annotext --document essay.json ranges
//! annotext --mode teacher-comment comment --from 1 --to 6 --text "Which prices?"
//! annotext --mode student-input insert --at 6 --text "!"
//! annotext resolve 0b9c...
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use annotext_config::Config;
use annotext_engine::{Cmd, CommentRange, Dispatch, EditorSession, MemoryStorage, Mode, io};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

/// Rich-text documents with range-anchored comments
#[derive(Parser, Debug)]
#[command(name = "annotext", version, about, long_about = None)]
struct Cli {
    /// Interchange JSON document (defaults to the configured document)
    #[arg(short, long, value_name = "FILE")]
    document: Option<PathBuf>,

    /// Editing mode: student_input, student_view or teacher_comment
    #[arg(short, long)]
    mode: Option<Mode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the plain text of the document
    Show,
    /// List comment ranges in document order
    Ranges,
    /// List comment threads
    Threads {
        /// Only threads whose text contains this, ignoring case
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Print the comment after (or before) a position, wrapping around
    Next {
        #[arg(long, default_value_t = 0)]
        from: usize,
        #[arg(long)]
        backwards: bool,
    },
    /// Comment the range [from, to)
    Comment {
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
        #[arg(long)]
        text: String,
    },
    /// Remove a comment and its thread
    Resolve { id: String },
    /// Insert text at a position
    Insert {
        #[arg(long)]
        at: usize,
        #[arg(long)]
        text: String,
    },
    /// Delete the range [from, to)
    Delete {
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
    },
    /// Write the document as HTML
    ExportHtml {
        #[arg(value_name = "OUT")]
        out: PathBuf,
    },
    /// Replace the document with the contents of an HTML file
    ImportHtml {
        #[arg(value_name = "IN")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config file")?;
    let (document, mode) = resolve_settings(&cli, config)?;

    let stdout = std::io::stdout();
    run(&cli.command, &document, mode, &mut stdout.lock())
}

/// Command-line flags win over the config file
fn resolve_settings(cli: &Cli, config: Option<Config>) -> Result<(PathBuf, Mode)> {
    let config_mode = config.as_ref().map(|config| config.mode);
    let document = match (&cli.document, config) {
        (Some(path), _) => path.clone(),
        (None, Some(config)) => {
            log::info!(
                "Using document from config: {}",
                config.document_path.display()
            );
            config.document_path
        }
        (None, None) => bail!(
            "No document given and no config file found; pass --document or create {}",
            Config::config_path().display()
        ),
    };
    let mode = cli.mode.or(config_mode).unwrap_or_default();
    Ok((document, mode))
}

fn run(command: &Command, document: &Path, mode: Mode, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Show => {
            let session = open_session(document, mode)?;
            writeln!(out, "{}", session.document().text_content())?;
        }
        Command::Ranges => {
            let session = open_session(document, mode)?;
            for range in session.comment_ranges() {
                print_range(out, &range)?;
            }
        }
        Command::Threads { query } => {
            let session = open_session(document, mode)?;
            for thread in session.search_threads(query.as_deref().unwrap_or(""))? {
                writeln!(out, "{}\t{}", thread.id, thread.text)?;
            }
        }
        Command::Next { from, backwards } => {
            let mut session = open_session(document, mode)?;
            session.set_selection(*from..*from);
            let found = if *backwards {
                session.prev_comment()
            } else {
                session.next_comment()
            };
            match found {
                Some(range) => print_range(out, &range)?,
                None => writeln!(out, "No comments")?,
            }
        }
        Command::Comment { from, to, text } => {
            let mut session = open_session(document, mode)?;
            session.set_selection(*from..*to);
            let Some(id) = session.add_comment(text)? else {
                bail!("No comment added in {mode} mode (empty range, blank text or not allowed)");
            };
            io::write_document(document, session.document())?;
            writeln!(out, "Added comment {id}")?;
        }
        Command::Resolve { id } => {
            let mut session = open_session(document, mode)?;
            if session.document().comment_range_for_id(id).is_none() {
                bail!("No comment with id {id}");
            }
            let outcome = session.resolve_comment(id)?;
            save_outcome(&session, outcome, document, out)?;
        }
        Command::Insert { at, text } => {
            let mut session = open_session(document, mode)?;
            let outcome = session.dispatch(&Cmd::InsertText {
                at: *at,
                text: text.clone(),
            })?;
            save_outcome(&session, outcome, document, out)?;
        }
        Command::Delete { from, to } => {
            let mut session = open_session(document, mode)?;
            let outcome = session.dispatch(&Cmd::DeleteRange { range: *from..*to })?;
            save_outcome(&session, outcome, document, out)?;
        }
        Command::ExportHtml { out: path } => {
            let session = open_session(document, mode)?;
            io::write_html(path, session.document())?;
            writeln!(out, "Wrote {}", path.display())?;
        }
        Command::ImportHtml { input } => import_html(input, document, out)?,
    }
    Ok(())
}

fn open_session(document: &Path, mode: Mode) -> Result<EditorSession> {
    let doc = io::read_document(document)?;
    Ok(EditorSession::open(
        MemoryStorage::with_document(doc.to_json()),
        mode,
    )?)
}

fn save_outcome(
    session: &EditorSession,
    outcome: Dispatch,
    document: &Path,
    out: &mut impl Write,
) -> Result<()> {
    match outcome {
        Dispatch::Applied(patch) => {
            io::write_document(document, session.document())?;
            log::info!("Saved {} at version {}", document.display(), patch.version);
        }
        Dispatch::Rejected(rejection) => {
            bail!("Edit rejected in {} mode: {rejection}", session.mode())
        }
        Dispatch::Unchanged => writeln!(out, "Nothing changed")?,
    }
    Ok(())
}

fn import_html(input: &Path, document: &Path, out: &mut impl Write) -> Result<()> {
    let doc = io::read_html(input)?;
    io::write_document(document, &doc)?;
    writeln!(
        out,
        "Imported {} comment(s) into {}",
        doc.comment_ids().len(),
        document.display()
    )?;
    Ok(())
}

fn print_range(out: &mut impl Write, range: &CommentRange) -> Result<()> {
    writeln!(
        out,
        "{}\t{}..{}\t{}",
        range.id, range.from, range.to, range.text
    )?;
    Ok(())
}
