use std::env;
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::error::BuiltinError;
use crate::process_exec::find_program;

/// What the shell should do after a builtin returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue(i32),
    Exit(i32),
}

/// Streams handed to a builtin; the redirected file or the shell's own stdio.
pub struct BuiltinIo<'a> {
    pub stdin: &'a mut dyn Read,
    pub stdout: &'a mut dyn Write,
}

type Handler = fn(&[String], &mut BuiltinIo<'_>) -> Result<Action, BuiltinError>;

/// A command run inside the shell process.
pub struct Builtin {
    pub name: &'static str,
    pub usage: &'static str,
    /// Builtins that end the session or change the shell's working directory
    /// may not sit in a pipeline.
    pub pipeable: bool,
    handler: Handler,
}

impl Builtin {
    pub fn run(&self, args: &[String], io: &mut BuiltinIo<'_>) -> Result<Action, BuiltinError> {
        log::debug!("running builtin {} {:?}", self.name, args);
        let action = (self.handler)(args, io)?;
        io.stdout.flush().map_err(|source| BuiltinError::Write { name: self.name, source })?;
        Ok(action)
    }
}

static BUILTINS: &[Builtin] = &[
    Builtin { name: "cd", usage: "cd <dir>", pipeable: false, handler: cd },
    Builtin { name: "pwd", usage: "pwd", pipeable: true, handler: pwd },
    Builtin { name: "which", usage: "which <name>", pipeable: true, handler: which },
    Builtin { name: "exit", usage: "exit [code]", pipeable: false, handler: exit },
    Builtin { name: "die", usage: "die [code] [message...]", pipeable: false, handler: die },
    Builtin { name: "help", usage: "help", pipeable: true, handler: help },
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

pub fn is_builtin(name: &str) -> bool {
    lookup(name).is_some()
}

/// Change current working directory
fn cd(args: &[String], _io: &mut BuiltinIo<'_>) -> Result<Action, BuiltinError> {
    let dir = match args {
        [] => return Err(BuiltinError::MissingOperand("cd")),
        [dir] => dir,
        _ => return Err(BuiltinError::TooManyArguments("cd")),
    };
    let path = PathBuf::from(shellexpand::tilde(dir).into_owned());

    env::set_current_dir(&path).map_err(|source| BuiltinError::ChangeDir { path, source })?;
    Ok(Action::Continue(0))
}

fn pwd(args: &[String], io: &mut BuiltinIo<'_>) -> Result<Action, BuiltinError> {
    if !args.is_empty() {
        return Err(BuiltinError::TooManyArguments("pwd"));
    }
    let cwd = env::current_dir().map_err(BuiltinError::CurrentDir)?;
    writeln!(io.stdout, "{}", cwd.display())
        .map_err(|source| BuiltinError::Write { name: "pwd", source })?;
    Ok(Action::Continue(0))
}

// Silent failure for builtins, unknown names and wrong arity.
fn which(args: &[String], io: &mut BuiltinIo<'_>) -> Result<Action, BuiltinError> {
    let [name] = args else {
        return Ok(Action::Continue(1));
    };
    if is_builtin(name) {
        return Ok(Action::Continue(1));
    }
    match find_program(name) {
        Some(path) => {
            writeln!(io.stdout, "{}", path.display())
                .map_err(|source| BuiltinError::Write { name: "which", source })?;
            Ok(Action::Continue(0))
        }
        None => Ok(Action::Continue(1)),
    }
}

fn exit(args: &[String], _io: &mut BuiltinIo<'_>) -> Result<Action, BuiltinError> {
    match args {
        [] => Ok(Action::Exit(0)),
        [code] => parse_code("exit", code).map(Action::Exit),
        _ => Err(BuiltinError::TooManyArguments("exit")),
    }
}

fn die(args: &[String], _io: &mut BuiltinIo<'_>) -> Result<Action, BuiltinError> {
    let Some((first, rest)) = args.split_first() else {
        return Ok(Action::Exit(0));
    };
    let (code, message) = match first.parse::<i32>() {
        Ok(code) => (code, rest),
        Err(_) => (1, args),
    };
    if !message.is_empty() {
        eprintln!("{}", message.join(" "));
    }
    Ok(Action::Exit(code))
}

fn help(_args: &[String], io: &mut BuiltinIo<'_>) -> Result<Action, BuiltinError> {
    let write_err = |source| BuiltinError::Write { name: "help", source };
    writeln!(io.stdout, "Builtin commands:").map_err(write_err)?;
    for builtin in BUILTINS {
        writeln!(io.stdout, "  {}", builtin.usage).map_err(write_err)?;
    }
    writeln!(io.stdout, "Operators: cmd < in, cmd > out, cmd1 | cmd2").map_err(write_err)?;
    Ok(Action::Continue(0))
}

fn parse_code(name: &'static str, value: &str) -> Result<i32, BuiltinError> {
    value.parse().map_err(|_| BuiltinError::NotANumber {
        name,
        value: value.to_string(),
    })
}
