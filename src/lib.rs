//! mysh: a small shell with `<`/`>` redirection and a single `|`.
//!
//! Input is read by [`reader::LineReader`], split into tokens by
//! [`parse::tokenize`], stripped of redirections by [`redirect::resolve`] and
//! run by [`shell::exec`], which picks between the in-process builtins and
//! external programs.

pub mod builtins;
pub mod config;
pub mod error;
pub mod parse;
pub mod process_exec;
pub mod prompt;
pub mod reader;
pub mod redirect;
pub mod shell;
pub mod status;

pub use error::{BuiltinError, ShellError, SyntaxError};
pub use reader::LineReader;
pub use shell::{Flow, Session};
pub use status::ExitStatus;
