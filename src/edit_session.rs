use tracing::debug;

use crate::console::{Printer, Prompter};
use crate::diagnostic::{self, SyntaxIssue};
use crate::editor::Editor;
use crate::error::Error;
use crate::store::{RevisionStore, StoreError};

#[derive(Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(String),
    Aborted,
}

enum State {
    Editing,
    Validating,
    Saving,
    Conflicted,
}

/// One edit-and-save attempt against a single document. Holds the working
/// body and the last known revision for the duration of the attempt and
/// is discarded afterwards; the store stays authoritative throughout.
pub struct EditSession<'a> {
    store: &'a mut dyn RevisionStore,
    editor: &'a mut dyn Editor,
    prompter: &'a mut dyn Prompter,
    printer: &'a mut dyn Printer,
    database: &'a str,
    id: String,
    known_revision: Option<String>,
    working_body: Vec<u8>,
    exists: bool,
}

impl<'a> EditSession<'a> {
    /// Fetch the document and set up the session. In edit mode
    /// (`create_if_missing == false`) an absent document fails here,
    /// before any editor is invoked; in put mode it starts the session
    /// from a skeleton body carrying only the id.
    pub fn begin(
        store: &'a mut dyn RevisionStore,
        editor: &'a mut dyn Editor,
        prompter: &'a mut dyn Prompter,
        printer: &'a mut dyn Printer,
        database: &'a str,
        id: &str,
        create_if_missing: bool,
    ) -> Result<EditSession<'a>, Error> {
        let (known_revision, working_body, exists) = match store.fetch(database, id)? {
            Some(doc) => {
                if create_if_missing {
                    printer.print(&format!("{id} already exists, editing instead"));
                }
                (Some(doc.revision), reformat(doc.body), true)
            }
            None if create_if_missing => {
                printer.print(&format!("Creating {id}"));
                (None, skeleton(id), false)
            }
            None => return Err(Error::DocumentNotFound(id.to_string())),
        };

        Ok(EditSession {
            store,
            editor,
            prompter,
            printer,
            database,
            id: id.to_string(),
            known_revision,
            working_body,
            exists,
        })
    }

    /// Drive the session to a terminal outcome: a successful conditional
    /// save, a user abort, or a terminal error. Conflicts and invalid
    /// JSON are recovered through the prompts; everything else ends the
    /// session.
    pub fn run(mut self) -> Result<SaveOutcome, Error> {
        let mut state = State::Editing;
        loop {
            state = match state {
                State::Editing => {
                    self.working_body = self.editor.edit(&self.working_body)?;
                    State::Validating
                }

                State::Validating => match diagnostic::validate(&self.working_body) {
                    Ok(()) => State::Saving,
                    Err(issue) => {
                        self.report(&issue);
                        let answer = self
                            .prompter
                            .input("Document does not validate as json. (E)dit again or (A)bort?> ");
                        if answer.eq_ignore_ascii_case("a") {
                            return Ok(SaveOutcome::Aborted);
                        }
                        // Hand the same bytes back so the user can fix
                        // them in place.
                        State::Editing
                    }
                },

                State::Saving => {
                    debug!(id = %self.id, exists = self.exists, "attempting conditional save");
                    match self.store.save(
                        self.database,
                        &self.id,
                        self.known_revision.as_deref(),
                        &self.working_body,
                    ) {
                        Ok(revision) => return Ok(SaveOutcome::Saved(revision)),
                        Err(StoreError::Conflict) => State::Conflicted,
                        Err(err) => return Err(err.into()),
                    }
                }

                State::Conflicted => {
                    let current = self
                        .store
                        .fetch(self.database, &self.id)?
                        .ok_or_else(|| Error::DocumentNotFound(self.id.clone()))?;
                    debug!(id = %self.id, revision = %current.revision, "save conflicted");
                    let answer = self.prompter.input(&format!(
                        "Conflict with rev {}. (A)bort, [(F)orce] or (E)dit with diff?> ",
                        current.revision
                    ));
                    if answer.eq_ignore_ascii_case("a") {
                        return Ok(SaveOutcome::Aborted);
                    }
                    // Both versions go back into the editor, local first,
                    // for manual reconciliation.
                    self.working_body.push(b'\n');
                    self.working_body.extend_from_slice(&current.body);
                    self.known_revision = Some(current.revision);
                    State::Editing
                }
            };
        }
    }

    fn report(&mut self, issue: &SyntaxIssue) {
        self.printer.error(&issue.to_string());
        if issue.line == 0 {
            return;
        }
        let window = diagnostic::annotate(&self.working_body, issue, 2, 2);
        for line in &window.lines {
            self.printer.print(line);
        }
    }
}

fn skeleton(id: &str) -> Vec<u8> {
    let body = serde_json::json!({ "_id": id });
    serde_json::to_vec(&body).unwrap_or_else(|_| format!("{{\"_id\": \"{id}\"}}").into_bytes())
}

// Documents go into the editor pretty-formatted; bodies that do not parse
// are passed through untouched.
fn reformat(body: Vec<u8>) -> Vec<u8> {
    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(value) => serde_json::to_vec_pretty(&value).unwrap_or(body),
        Err(_) => body,
    }
}
