use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::error::{ShellError, SyntaxError};
use crate::parse::{Operator, Token};

/// Permission bits for files created by `>`.
const OUTPUT_MODE: u32 = 0o640;

/// Argument vector of a command; never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    argv: Vec<String>,
}

impl CommandSpec {
    pub fn new(argv: Vec<String>) -> Result<Self, SyntaxError> {
        if argv.is_empty() {
            return Err(SyntaxError::EmptyCommand);
        }
        Ok(Self { argv })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionSpec {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl RedirectionSpec {
    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none()
    }

    /// Opens both targets. Nothing is left open if either one fails.
    pub fn open(&self) -> Result<OpenedRedirects, ShellError> {
        let stdin = self.open_input()?;
        let stdout = self.open_output()?;
        Ok(OpenedRedirects { stdin, stdout })
    }

    pub fn open_input(&self) -> Result<Option<File>, ShellError> {
        self.input.as_deref().map(open_for_reading).transpose()
    }

    pub fn open_output(&self) -> Result<Option<File>, ShellError> {
        self.output.as_deref().map(open_for_writing).transpose()
    }
}

/// Files backing a command's redirected stdin/stdout, closed on drop.
#[derive(Debug, Default)]
pub struct OpenedRedirects {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

fn open_for_reading(path: &Path) -> Result<File, ShellError> {
    log::debug!("opening {} for input", path.display());
    File::open(path).map_err(|source| ShellError::Redirect {
        path: path.to_path_buf(),
        source,
    })
}

fn open_for_writing(path: &Path) -> Result<File, ShellError> {
    log::debug!("opening {} for output", path.display());
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(OUTPUT_MODE)
        .open(path)
        .map_err(|source| ShellError::Redirect {
            path: path.to_path_buf(),
            source,
        })
}

/// Pulls `< file` and `> file` out of a token sequence.
///
/// Each redirection operator must be followed by a word. When a direction is
/// given twice the later target wins; targets are only recorded here, never
/// opened. Remaining words keep their order and become the command.
pub fn resolve(tokens: Vec<Token>) -> Result<(CommandSpec, RedirectionSpec), SyntaxError> {
    let mut argv = Vec::new();
    let mut redirects = RedirectionSpec::default();
    let mut tokens = tokens.into_iter();

    while let Some(token) = tokens.next() {
        let op = match token {
            Token::Word(word) => {
                argv.push(word);
                continue;
            }
            Token::Op(Operator::Pipe) => return Err(SyntaxError::UnexpectedPipe),
            Token::Op(op) => op,
        };

        let target = match tokens.next() {
            Some(Token::Word(target)) => PathBuf::from(target),
            Some(Token::Op(next)) => return Err(SyntaxError::OperatorAfterRedirect(op, next)),
            None => return Err(SyntaxError::MissingTarget(op)),
        };
        match op {
            Operator::RedirectIn => redirects.input = Some(target),
            _ => redirects.output = Some(target),
        }
    }

    Ok((CommandSpec::new(argv)?, redirects))
}
