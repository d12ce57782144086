//! Line-oriented terminal I/O for the interactive assessment.

use std::io::{BufRead, Write};

use anyhow::Result;

/// One line typed at the assessment prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// An empty line.
    Empty,
    /// Answer the question being asked.
    Level(u8),
    /// `N L`: change answer `N` (1-based) of the current pillar to `L`.
    Change { question: usize, level: u8 },
    Back,
    Next,
    /// `:goto N` with a 1-based pillar number.
    Goto(usize),
    Finish,
    Quit,
    Reset,
    Help,
}

impl Input {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Input::Empty);
        }

        if let Some(command) = line.strip_prefix(':') {
            let mut parts = command.split_whitespace();
            let name = parts.next().unwrap_or_default().to_lowercase();
            let arg = parts.next();
            return match (name.as_str(), arg) {
                ("back" | "b", None) => Ok(Input::Back),
                ("next" | "n", None) => Ok(Input::Next),
                ("finish" | "f", None) => Ok(Input::Finish),
                ("quit" | "q", None) => Ok(Input::Quit),
                ("reset", None) => Ok(Input::Reset),
                ("help" | "h", None) => Ok(Input::Help),
                ("goto" | "g", Some(n)) => match n.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(Input::Goto(n)),
                    _ => Err(format!("not a pillar number: {n}")),
                },
                ("goto" | "g", None) => Err("usage: :goto N".into()),
                _ => Err(format!("unknown command: {line} (type :help)")),
            };
        }

        let numbers: Vec<&str> = line.split_whitespace().collect();
        match numbers.as_slice() {
            [level] => level
                .parse()
                .map(Input::Level)
                .map_err(|_| format!("not a maturity level: {level}")),
            [question, level] => {
                let question = question
                    .parse::<usize>()
                    .ok()
                    .filter(|q| *q > 0)
                    .ok_or_else(|| format!("not a question number: {question}"))?;
                let level = level
                    .parse()
                    .map_err(|_| format!("not a maturity level: {level}"))?;
                Ok(Input::Change { question, level })
            }
            _ => Err(format!("could not understand: {line} (type :help)")),
        }
    }
}

pub const HELP: &str = "\
  1-4      answer the current question
  N L      change answer N of this pillar to level L
  :back    previous pillar
  :next    next pillar (this one must be complete)
  :goto N  jump to pillar N
  :finish  submit the assessment
  :reset   discard everything and start over
  :quit    stop here; progress is saved
";

/// Prompts on a writer and reads answers from a reader.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `text` without a newline and read one line. `None` on EOF.
    pub fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", text.as_ref())?;
        Ok(())
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.output
    }
}
