use std::io::{self, BufRead, Write};

/// User-facing output. Injected at session construction so tests can
/// capture everything the user would see.
pub trait Printer {
    fn error(&mut self, message: &str);
    fn print(&mut self, message: &str);
    fn json(&mut self, raw: &[u8]);
}

pub struct TextPrinter;

impl Printer for TextPrinter {
    fn error(&mut self, message: &str) {
        println!("ERROR: {message}");
    }

    fn print(&mut self, message: &str) {
        println!("{message}");
    }

    fn json(&mut self, raw: &[u8]) {
        match serde_json::from_slice::<serde_json::Value>(raw) {
            Ok(value) => match serde_json::to_string_pretty(&value) {
                Ok(text) => println!("{text}"),
                Err(_) => println!("{}", String::from_utf8_lossy(raw)),
            },
            Err(_) => println!("{}", String::from_utf8_lossy(raw)),
        }
    }
}

/// Line input. `read_command` feeds the interactive loop and signals end
/// of input with `None`; `input` asks a single modal question and returns
/// whatever was typed, possibly empty.
pub trait Prompter {
    fn set_prompt(&mut self, label: &str);
    fn read_command(&mut self) -> Option<String>;
    fn input(&mut self, prompt: &str) -> String;
}

#[derive(Default)]
pub struct StdinPrompter {
    label: String,
}

impl StdinPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_line(prompt: &str) -> Option<String> {
        print!("{prompt}");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

impl Prompter for StdinPrompter {
    fn set_prompt(&mut self, label: &str) {
        self.label = label.to_string();
    }

    fn read_command(&mut self) -> Option<String> {
        Self::read_line(&format!("{}> ", self.label))
    }

    fn input(&mut self, prompt: &str) -> String {
        Self::read_line(prompt).unwrap_or_default()
    }
}

#[cfg(test)]
pub use doubles::{RecordingPrinter, ScriptedPrompter};

#[cfg(test)]
mod doubles {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::{Printer, Prompter};

    /// Captures everything printed. Clones share state, so tests can keep
    /// a handle after boxing one into a session.
    #[derive(Clone, Default)]
    pub struct RecordingPrinter {
        pub errors: Rc<RefCell<Vec<String>>>,
        pub prints: Rc<RefCell<Vec<String>>>,
        pub jsons: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    impl RecordingPrinter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn errors(&self) -> Vec<String> {
            self.errors.borrow().clone()
        }

        pub fn prints(&self) -> Vec<String> {
            self.prints.borrow().clone()
        }
    }

    impl Printer for RecordingPrinter {
        fn error(&mut self, message: &str) {
            self.errors.borrow_mut().push(message.to_string());
        }

        fn print(&mut self, message: &str) {
            self.prints.borrow_mut().push(message.to_string());
        }

        fn json(&mut self, raw: &[u8]) {
            self.jsons.borrow_mut().push(raw.to_vec());
        }
    }

    /// Answers prompts from a fixed script and records every question
    /// asked. An exhausted script answers with an empty line.
    #[derive(Clone, Default)]
    pub struct ScriptedPrompter {
        answers: Rc<RefCell<VecDeque<String>>>,
        pub asked: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: &[&str]) -> Self {
            Self {
                answers: Rc::new(RefCell::new(
                    answers.iter().map(|s| s.to_string()).collect(),
                )),
                asked: Rc::new(RefCell::new(Vec::new())),
            }
        }

        pub fn asked(&self) -> Vec<String> {
            self.asked.borrow().clone()
        }
    }

    impl Prompter for ScriptedPrompter {
        fn set_prompt(&mut self, _label: &str) {}

        fn read_command(&mut self) -> Option<String> {
            self.answers.borrow_mut().pop_front()
        }

        fn input(&mut self, prompt: &str) -> String {
            self.asked.borrow_mut().push(prompt.to_string());
            self.answers.borrow_mut().pop_front().unwrap_or_default()
        }
    }
}
