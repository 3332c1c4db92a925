use tracing::debug;

use crate::commands;
use crate::console::{Printer, Prompter};
use crate::editor::Editor;
use crate::error::Error;
use crate::store::RevisionStore;

/// One interactive session against a store. Capabilities are injected at
/// construction; commands look the session up through the static table
/// and run against it.
pub struct Session {
    pub store: Box<dyn RevisionStore>,
    pub printer: Box<dyn Printer>,
    pub editor: Box<dyn Editor>,
    pub prompter: Box<dyn Prompter>,
    pub database: Option<String>,
    pub enable_write: bool,
    label: String,
}

impl Session {
    pub fn new(
        store: Box<dyn RevisionStore>,
        printer: Box<dyn Printer>,
        editor: Box<dyn Editor>,
        prompter: Box<dyn Prompter>,
        enable_write: bool,
        label: &str,
    ) -> Self {
        Self {
            store,
            printer,
            editor,
            prompter,
            database: None,
            enable_write,
            label: label.to_string(),
        }
    }

    pub fn print(&mut self, message: &str) {
        self.printer.print(message);
    }

    pub fn error(&mut self, message: &str) {
        self.printer.error(message);
    }

    pub fn json(&mut self, raw: &[u8]) {
        self.printer.json(raw);
    }

    pub fn selected_database(&self) -> Result<String, Error> {
        self.database.clone().ok_or(Error::NoDatabase)
    }

    pub fn prompt_label(&self) -> String {
        let mode = if self.enable_write { "(rw)" } else { "(ro)" };
        match &self.database {
            Some(db) => format!("{}/{}{}", self.label, db, mode),
            None => self.label.clone(),
        }
    }

    /// Select `name` as the current database. Reports and returns false
    /// if it does not exist.
    pub fn use_db(&mut self, name: &str) -> bool {
        match self.store.database_exists(name) {
            Err(err) => {
                self.error(&err.to_string());
                false
            }
            Ok(false) => {
                self.error(&format!("{name} does not exist"));
                false
            }
            Ok(true) => {
                self.database = Some(name.to_string());
                let label = self.prompt_label();
                self.prompter.set_prompt(&label);
                true
            }
        }
    }

    /// Parse and run one command line. Returns true when the session
    /// should end.
    pub fn execute(&mut self, line: &str) -> bool {
        let args: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if args.is_empty() {
            return false;
        }
        debug!(?args, "command");

        let Some(spec) = commands::COMMANDS.iter().find(|c| c.name == args[0]) else {
            self.error("command not found. Use 'help'");
            return false;
        };
        if spec.write_op && !self.enable_write {
            self.error("Write operation in ro mode. Restart with --write");
            return false;
        }
        if spec.needs_database && self.database.is_none() {
            self.error("No database selected");
            return false;
        }

        match (spec.handler)(self, &args) {
            Ok(quit) => quit,
            Err(err) => {
                self.error(&err.to_string());
                false
            }
        }
    }

    /// Split a `;`-separated batch into individual commands, dropping
    /// blanks.
    pub fn split_cmds(batch: &str) -> Vec<String> {
        batch
            .split(';')
            .map(str::trim)
            .filter(|cmd| !cmd.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Run the batch commands, then the interactive loop until `exit` or
    /// end of input.
    pub fn run(&mut self, batch: &str) {
        for cmd in Self::split_cmds(batch) {
            if self.execute(&cmd) {
                return;
            }
        }
        let label = self.prompt_label();
        self.prompter.set_prompt(&label);
        loop {
            let Some(line) = self.prompter.read_command() else {
                break;
            };
            if self.execute(&line) {
                break;
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    use crate::console::{RecordingPrinter, ScriptedPrompter};
    use crate::editor::ScriptedEditor;
    use crate::store::MemoryStore;

    /// Session over a memory store with the given databases, capturing
    /// output. Also hands back the live doubles.
    pub fn session_with_dbs(
        write: bool,
        dbs: &[&str],
    ) -> (Session, RecordingPrinter, ScriptedPrompter, ScriptedEditor) {
        scripted_session(write, dbs, &[], &[])
    }

    /// Like [`session_with_dbs`] with scripted prompt answers and editor
    /// results.
    pub fn scripted_session(
        write: bool,
        dbs: &[&str],
        answers: &[&str],
        edits: &[&[u8]],
    ) -> (Session, RecordingPrinter, ScriptedPrompter, ScriptedEditor) {
        let mut store = MemoryStore::new();
        for db in dbs {
            store.create_database(db).unwrap();
        }
        let printer = RecordingPrinter::new();
        let prompter = ScriptedPrompter::new(answers);
        let editor = ScriptedEditor::returning(edits);
        let session = Session::new(
            Box::new(store),
            Box::new(printer.clone()),
            Box::new(editor.clone()),
            Box::new(prompter.clone()),
            write,
            "test",
        );
        (session, printer, prompter, editor)
    }

    #[test]
    fn test_unknown_command() {
        let (mut session, printer, ..) = session_with_dbs(false, &[]);
        session.execute("frobnicate");
        assert_eq!(
            printer.errors(),
            vec!["command not found. Use 'help'".to_string()]
        );
    }

    #[test]
    fn test_blank_line_is_ignored() {
        let (mut session, printer, ..) = session_with_dbs(false, &[]);
        assert!(!session.execute("   "));
        assert!(printer.errors().is_empty());
        assert!(printer.prints().is_empty());
    }

    #[test]
    fn test_write_op_refused_in_ro_mode() {
        let (mut session, printer, ..) = session_with_dbs(false, &[]);
        session.execute("createdb things");
        assert_eq!(
            printer.errors(),
            vec!["Write operation in ro mode. Restart with --write".to_string()]
        );
        assert!(!session.store.database_exists("things").unwrap());
    }

    #[test]
    fn test_database_command_without_selection() {
        let (mut session, printer, ..) = session_with_dbs(false, &["db"]);
        session.execute("all");
        assert_eq!(printer.errors(), vec!["No database selected".to_string()]);
    }

    #[test]
    fn test_use_db() {
        let (mut session, printer, ..) = session_with_dbs(false, &["exists"]);
        assert!(!session.use_db("missing"));
        assert_eq!(
            printer.errors(),
            vec!["missing does not exist".to_string()]
        );
        assert!(session.use_db("exists"));
        assert_eq!(session.database.as_deref(), Some("exists"));
    }

    #[test]
    fn test_prompt_label_tracks_selection_and_mode() {
        let (mut session, ..) = session_with_dbs(false, &["db"]);
        assert_eq!(session.prompt_label(), "test");
        session.use_db("db");
        assert_eq!(session.prompt_label(), "test/db(ro)");

        let (mut session, ..) = session_with_dbs(true, &["db"]);
        session.use_db("db");
        assert_eq!(session.prompt_label(), "test/db(rw)");
    }

    #[test]
    fn test_split_cmds() {
        assert_eq!(
            Session::split_cmds("use db; all ;; exit"),
            vec!["use db", "all", "exit"]
        );
        assert!(Session::split_cmds("  ;  ").is_empty());
    }

    #[test]
    fn test_run_executes_batch_then_loop() {
        let (mut session, printer, ..) = scripted_session(false, &["db"], &["databases", "exit"], &[]);
        session.run("use db");
        let prints = printer.prints();
        // The interactive loop listed databases and then quit
        assert!(prints.contains(&"db".to_string()));
        assert_eq!(prints.last(), Some(&"Bye!".to_string()));
    }

    #[test]
    fn test_run_stops_at_end_of_input() {
        let (mut session, printer, ..) = session_with_dbs(false, &[]);
        // No scripted input at all: the loop ends immediately
        session.run("databases");
        assert!(printer.errors().is_empty());
    }
}
