use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::parse::Operator;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("syntax error: expected a file name after '{0}'")]
    MissingTarget(Operator),
    #[error("syntax error: unexpected '{1}' after '{0}'")]
    OperatorAfterRedirect(Operator, Operator),
    #[error("syntax error: missing command")]
    EmptyCommand,
    #[error("syntax error: only one '|' is supported per line")]
    TooManyPipes,
    #[error("syntax error: '|' needs a command on both sides")]
    EmptyPipeSide,
    #[error("syntax error: unexpected '|'")]
    UnexpectedPipe,
    #[error("syntax error: '{0}' conflicts with the pipe")]
    PipeConflict(Operator),
}

#[derive(Error, Debug)]
pub enum BuiltinError {
    #[error("{0}: missing operand")]
    MissingOperand(&'static str),
    #[error("{0}: too many arguments")]
    TooManyArguments(&'static str),
    #[error("{name}: {value}: numeric argument required")]
    NotANumber { name: &'static str, value: String },
    #[error("cd: {}: {source}", path.display())]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pwd: {0}")]
    CurrentDir(#[source] io::Error),
    #[error("{name}: write error: {source}")]
    Write {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Anything that stops a line from running.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Builtin(#[from] BuiltinError),
    #[error("{}: {source}", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error("{0}: builtin cannot read from a pipe")]
    BuiltinAfterPipe(String),
    #[error("{0}: cannot be used in a pipeline")]
    NotInPipeline(String),
    #[error("cannot create pipe: {0}")]
    Pipe(#[source] io::Error),
}
