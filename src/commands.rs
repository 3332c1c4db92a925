use globset::Glob;

use crate::edit_session::{EditSession, SaveOutcome};
use crate::error::Error;
use crate::session::Session;
use crate::store::RevisionStore;

pub struct CommandSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub write_op: bool,
    pub needs_database: bool,
    pub handler: fn(&mut Session, &[String]) -> Result<bool, Error>,
}

/// The full command set, looked up by iteration. Built once, never
/// mutated at runtime.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "use",
        help: "Select a database",
        write_op: false,
        needs_database: false,
        handler: cmd_use,
    },
    CommandSpec {
        name: "databases",
        help: "List databases, -l for a long listing, patterns allowed",
        write_op: false,
        needs_database: false,
        handler: cmd_databases,
    },
    CommandSpec {
        name: "createdb",
        help: "Create a database",
        write_op: true,
        needs_database: false,
        handler: cmd_createdb,
    },
    CommandSpec {
        name: "deletedb",
        help: "Delete databases matching patterns, -f skips confirmation",
        write_op: true,
        needs_database: false,
        handler: cmd_deletedb,
    },
    CommandSpec {
        name: "all",
        help: "List all docs, optionally filtered by id prefix",
        write_op: false,
        needs_database: true,
        handler: cmd_all,
    },
    CommandSpec {
        name: "get",
        help: "Get a single document by id",
        write_op: false,
        needs_database: true,
        handler: cmd_get,
    },
    CommandSpec {
        name: "put",
        help: "Create a new document",
        write_op: true,
        needs_database: true,
        handler: cmd_put,
    },
    CommandSpec {
        name: "edit",
        help: "Edit an existing document",
        write_op: true,
        needs_database: true,
        handler: cmd_edit,
    },
    CommandSpec {
        name: "help",
        help: "Show help",
        write_op: false,
        needs_database: false,
        handler: cmd_help,
    },
    CommandSpec {
        name: "exit",
        help: "Exit sofa",
        write_op: false,
        needs_database: false,
        handler: cmd_exit,
    },
];

/// Expand glob patterns against the database list. Returns the matched
/// names and the patterns that matched nothing.
pub fn match_databases(
    store: &dyn RevisionStore,
    patterns: &[String],
) -> Result<(Vec<String>, Vec<String>), Error> {
    let all = store.all_databases()?;
    let mut matches = Vec::new();
    let mut mismatches = Vec::new();

    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|_| Error::Pattern(pattern.clone()))?
            .compile_matcher();
        let mut count = 0;
        for db in &all {
            if glob.is_match(db) {
                matches.push(db.clone());
                count += 1;
            }
        }
        if count == 0 {
            mismatches.push(pattern.clone());
        }
    }
    Ok((matches, mismatches))
}

fn cmd_use(session: &mut Session, args: &[String]) -> Result<bool, Error> {
    if args.len() != 2 {
        return Err(Error::Usage);
    }
    session.use_db(&args[1]);
    Ok(false)
}

fn cmd_databases(session: &mut Session, args: &[String]) -> Result<bool, Error> {
    let mut long = false;
    let mut patterns = Vec::new();
    for arg in &args[1..] {
        if arg == "-l" {
            long = true;
        } else {
            patterns.push(arg.clone());
        }
    }
    if patterns.is_empty() {
        patterns.push("*".to_string());
    }

    let (matches, mismatches) = match_databases(session.store.as_ref(), &patterns)?;
    if long {
        session.print(&format!("{:<50} {:>10}", "Name", "#docs"));
        for db in &matches {
            let count = session.store.doc_count(db)?;
            session.print(&format!("{db:<50} {count:>10}"));
        }
    } else {
        for db in &matches {
            session.print(db);
        }
    }
    for pattern in &mismatches {
        session.error(&format!("No matches for pattern {pattern}"));
    }
    Ok(false)
}

fn cmd_createdb(session: &mut Session, args: &[String]) -> Result<bool, Error> {
    if args.len() != 2 {
        return Err(Error::Usage);
    }
    session.store.create_database(&args[1])?;
    // Assume we also want to use it immediately
    session.use_db(&args[1]);
    Ok(false)
}

fn cmd_deletedb(session: &mut Session, args: &[String]) -> Result<bool, Error> {
    let mut force = false;
    let mut patterns = Vec::new();
    for arg in &args[1..] {
        if arg == "-f" {
            force = true;
        } else {
            patterns.push(arg.clone());
        }
    }
    if patterns.is_empty() {
        return Err(Error::Usage);
    }

    let (to_delete, mismatches) = match_databases(session.store.as_ref(), &patterns)?;
    for db in &to_delete {
        if !force {
            let answer = session
                .prompter
                .input(&format!("Please type {db} to delete it> "));
            if answer != *db {
                session.print("Okay, not deleting");
                continue;
            }
        }
        if session.database.as_deref() == Some(db.as_str()) {
            session.print("Unselecting database before destroying");
            session.database = None;
            let label = session.prompt_label();
            session.prompter.set_prompt(&label);
        }
        session.store.delete_database(db)?;
        session.print(&format!("Database {db} destroyed"));
    }
    for pattern in &mismatches {
        session.error(&format!("No matches for pattern {pattern}"));
    }
    Ok(false)
}

fn cmd_all(session: &mut Session, args: &[String]) -> Result<bool, Error> {
    if args.len() > 2 {
        return Err(Error::Usage);
    }
    let db = session.selected_database()?;
    let prefix = args.get(1).map(String::as_str);
    for row in session.store.all_docs(&db, prefix)? {
        session.print(&format!("{} {}", row.id, row.revision));
    }
    Ok(false)
}

fn cmd_get(session: &mut Session, args: &[String]) -> Result<bool, Error> {
    if args.len() != 2 {
        return Err(Error::Usage);
    }
    let db = session.selected_database()?;
    let doc = session
        .store
        .fetch(&db, &args[1])?
        .ok_or_else(|| Error::DocumentNotFound(args[1].clone()))?;
    session.json(&doc.body);
    Ok(false)
}

fn cmd_put(session: &mut Session, args: &[String]) -> Result<bool, Error> {
    edit_put(session, args, true)
}

fn cmd_edit(session: &mut Session, args: &[String]) -> Result<bool, Error> {
    edit_put(session, args, false)
}

fn edit_put(session: &mut Session, args: &[String], create_if_missing: bool) -> Result<bool, Error> {
    if args.len() != 2 {
        return Err(Error::Usage);
    }
    let db = session.selected_database()?;
    let outcome = EditSession::begin(
        &mut *session.store,
        &mut *session.editor,
        &mut *session.prompter,
        &mut *session.printer,
        &db,
        &args[1],
        create_if_missing,
    )?
    .run()?;

    match outcome {
        SaveOutcome::Saved(revision) => session.print(&revision),
        SaveOutcome::Aborted => session.print("Aborted"),
    }
    Ok(false)
}

fn cmd_help(session: &mut Session, _args: &[String]) -> Result<bool, Error> {
    for spec in COMMANDS {
        let write_tag = if !spec.write_op {
            ""
        } else if session.enable_write {
            "(w)"
        } else {
            "(disabled, ro mode)"
        };
        session.print(&format!("{:<20}  {} {}", spec.name, spec.help, write_tag));
    }
    Ok(false)
}

fn cmd_exit(session: &mut Session, _args: &[String]) -> Result<bool, Error> {
    session.print("Bye!");
    Ok(true)
}
