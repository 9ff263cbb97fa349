//! Reconcile the identifier given on the command line with the saved one.

use std::io::{self, BufRead, Write};
use thiserror::Error;

use crate::project::ProjectId;

/// Errors returned while resolving the identifier for a run.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither the caller nor a previous run provided an identifier.
    #[error("No id supplied! See (-h) for usage.")]
    NoIdentifier,
    /// Input ended before the operator picked an identifier.
    #[error("input closed before an id was chosen")]
    PromptClosed,
    /// Reading or writing the prompt failed.
    #[error("prompt IO error: {0}")]
    Io(#[from] io::Error),
}

/// Which identifier wins a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// The identifier recorded by a previous run.
    Saved,
    /// The identifier supplied for this run.
    Supplied,
}

/// Decides between two different identifiers.
pub trait ConflictStrategy {
    fn choose(&mut self, saved: &ProjectId, supplied: &ProjectId) -> Result<Choice, ResolveError>;
}

/// Non-interactive strategy: the latest (supplied) identifier always wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreferSupplied;

impl ConflictStrategy for PreferSupplied {
    fn choose(&mut self, _saved: &ProjectId, _supplied: &ProjectId) -> Result<Choice, ResolveError> {
        Ok(Choice::Supplied)
    }
}

/// Where prompt answers are read from, one line at a time.
pub trait LineSource {
    fn read_answer(&mut self, buf: &mut String) -> io::Result<usize>;
}

/// Locks stdin for the duration of one line only, so later readers on the
/// same thread are not blocked.
impl LineSource for io::Stdin {
    fn read_answer(&mut self, buf: &mut String) -> io::Result<usize> {
        self.read_line(buf)
    }
}

impl<T: AsRef<[u8]>> LineSource for io::Cursor<T> {
    fn read_answer(&mut self, buf: &mut String) -> io::Result<usize> {
        self.read_line(buf)
    }
}

/// Asks the operator, looping until `1` (saved) or `2` (supplied) is entered.
/// An empty answer picks `2`.
pub struct InteractivePrompt<R, W> {
    input: R,
    output: W,
}

impl InteractivePrompt<io::Stdin, io::Stdout> {
    /// Prompt on the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin(), io::stdout())
    }
}

impl<R: LineSource, W: Write> InteractivePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: LineSource, W: Write> ConflictStrategy for InteractivePrompt<R, W> {
    fn choose(&mut self, saved: &ProjectId, supplied: &ProjectId) -> Result<Choice, ResolveError> {
        loop {
            writeln!(
                self.output,
                "Conflicting ids. Given {supplied}, but previous records show {saved}. Which to use?"
            )?;
            writeln!(self.output, "1. {saved} [old]")?;
            writeln!(self.output, "2. {supplied} [new]")?;
            write!(self.output, "Id to use [blank = 2.] -> ")?;
            self.output.flush()?;

            let mut answer = String::new();
            if self.input.read_answer(&mut answer)? == 0 {
                return Err(ResolveError::PromptClosed);
            }

            match answer.trim() {
                "1" => return Ok(Choice::Saved),
                "" | "2" => return Ok(Choice::Supplied),
                _ => continue,
            }
        }
    }
}

/// Pick the identifier for this run.
///
/// The strategy is only consulted when both identifiers are present and differ.
pub fn resolve(
    supplied: Option<ProjectId>,
    saved: Option<ProjectId>,
    strategy: &mut dyn ConflictStrategy,
) -> Result<ProjectId, ResolveError> {
    match (supplied, saved) {
        (None, None) => Err(ResolveError::NoIdentifier),
        (Some(id), None) | (None, Some(id)) => Ok(id),
        (Some(supplied), Some(saved)) if supplied == saved => Ok(supplied),
        (Some(supplied), Some(saved)) => match strategy.choose(&saved, &supplied)? {
            Choice::Saved => Ok(saved),
            Choice::Supplied => Ok(supplied),
        },
    }
}
