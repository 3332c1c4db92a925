use std::fs;
use std::io::Write;
use std::process::Command;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("editor exited with {0}")]
    Failed(std::process::ExitStatus),
}

pub trait Editor {
    fn edit(&mut self, content: &[u8]) -> Result<Vec<u8>, EditorError>;
}

/// Runs a real editor against a staged temp file and reads the result
/// back once the process exits.
pub struct ExternalEditor {
    program: String,
}

impl ExternalEditor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Editor for ExternalEditor {
    fn edit(&mut self, content: &[u8]) -> Result<Vec<u8>, EditorError> {
        // The staging file is removed when `staged` drops, on every path
        // out of this function.
        let mut staged = tempfile::Builder::new()
            .prefix("sofa-")
            .suffix(".json")
            .tempfile()?;
        staged.write_all(content)?;
        staged.flush()?;

        debug!(program = %self.program, path = %staged.path().display(), "invoking editor");
        let status = Command::new(&self.program).arg(staged.path()).status()?;
        if !status.success() {
            return Err(EditorError::Failed(status));
        }

        Ok(fs::read(staged.path())?)
    }
}

#[cfg(test)]
pub use scripted::{ScriptedEdit, ScriptedEditor};

#[cfg(test)]
mod scripted {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::{Editor, EditorError};

    pub enum ScriptedEdit {
        Return(Vec<u8>),
        Fail,
    }

    /// Plays back a fixed script of edit results and records every
    /// buffer it was handed. Clones share state, so tests can keep a
    /// handle after boxing one into a session.
    #[derive(Clone, Default)]
    pub struct ScriptedEditor {
        script: Rc<RefCell<VecDeque<ScriptedEdit>>>,
        pub seen: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    impl ScriptedEditor {
        pub fn new(script: Vec<ScriptedEdit>) -> Self {
            Self {
                script: Rc::new(RefCell::new(script.into())),
                seen: Rc::new(RefCell::new(Vec::new())),
            }
        }

        pub fn returning(outputs: &[&[u8]]) -> Self {
            Self::new(
                outputs
                    .iter()
                    .map(|bytes| ScriptedEdit::Return(bytes.to_vec()))
                    .collect(),
            )
        }
    }

    impl Editor for ScriptedEditor {
        fn edit(&mut self, content: &[u8]) -> Result<Vec<u8>, EditorError> {
            self.seen.borrow_mut().push(content.to_vec());
            match self.script.borrow_mut().pop_front() {
                Some(ScriptedEdit::Return(bytes)) => Ok(bytes),
                Some(ScriptedEdit::Fail) => {
                    Err(EditorError::Io(std::io::Error::other("scripted failure")))
                }
                // An exhausted script behaves like an editor the user
                // quit without changing anything.
                None => Ok(content.to_vec()),
            }
        }
    }
}
