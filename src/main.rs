mod commands;
mod console;
mod diagnostic;
mod edit_session;
mod editor;
mod error;
mod rc;
mod session;
mod store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use console::{StdinPrompter, TextPrinter};
use editor::ExternalEditor;
use rc::RcLoader;
use session::Session;
use store::{MemoryStore, RevisionStore};

/// Interactive client for a revisioned document store.
#[derive(Parser)]
#[command(name = "sofa", version)]
struct Args {
    /// Database to select at startup (created if absent)
    database: Option<String>,

    /// Enable write commands
    #[arg(long)]
    write: bool,

    /// Commands to run before the interactive loop, separated by ';'
    #[arg(short = 'c', long)]
    commands: Option<String>,

    /// Verbose internal logging
    #[arg(long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.debug);

    let config = RcLoader::load_config();
    let enable_write = args.write || config.write;
    let program = rc::editor_program(&config);

    let mut store = MemoryStore::new();
    let startup_db = args.database.or(config.database);
    if let Some(db) = &startup_db {
        if matches!(store.database_exists(db), Ok(false)) {
            if let Err(err) = store.create_database(db) {
                eprintln!("ERROR: {err}");
            }
        }
    }

    let mut session = Session::new(
        Box::new(store),
        Box::new(TextPrinter),
        Box::new(ExternalEditor::new(program)),
        Box::new(StdinPrompter::new()),
        enable_write,
        "memory",
    );
    session.print("Using in-memory store");
    if let Some(db) = &startup_db {
        session.use_db(db);
    }
    session.run(args.commands.as_deref().unwrap_or(""));
}

fn init_tracing(debug: bool) {
    let default = if debug { "sofa=debug" } else { "sofa=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
