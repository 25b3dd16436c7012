use std::io::{self, Read, Write};

use crate::{
    builtins::{self, Action, BuiltinIo},
    config::Config,
    error::ShellError,
    parse::{split_pipe, tokenize},
    process_exec::{run_external, run_pipeline},
    prompt::Prompt,
    reader::LineReader,
    redirect::{resolve, CommandSpec, RedirectionSpec},
    status::ExitStatus,
};

/// A parsed, non-empty command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Single(CommandSpec, RedirectionSpec),
    Pipeline((CommandSpec, RedirectionSpec), (CommandSpec, RedirectionSpec)),
}

/// What the session loop does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue(ExitStatus),
    Exit(i32),
}

/// Parses one line. Blank lines give `None`.
pub fn parse_line(line: &str) -> Result<Option<Job>, ShellError> {
    let tokens = tokenize(line);
    if tokens.is_empty() {
        return Ok(None);
    }

    let job = match split_pipe(tokens)? {
        (tokens, None) => {
            let (cmd, redirects) = resolve(tokens)?;
            Job::Single(cmd, redirects)
        }
        (left, Some(right)) => Job::Pipeline(resolve(left)?, resolve(right)?),
    };
    Ok(Some(job))
}

/// Parses and runs one line. Blank lines give `None` and run nothing.
pub fn exec(line: &str) -> Result<Option<Flow>, ShellError> {
    let Some(job) = parse_line(line)? else {
        return Ok(None);
    };
    log::debug!("dispatching {job:?}");

    let flow = match &job {
        Job::Single(cmd, redirects) => execute(cmd, redirects)?,
        Job::Pipeline(left, right) => {
            let (left_status, right_status) = run_pipeline((&left.0, &left.1), (&right.0, &right.1))?;
            log::debug!("pipeline finished: {left_status}, {right_status}");
            Flow::Continue(right_status)
        }
    };
    Ok(Some(flow))
}

/// Runs a single command, in-process for builtins and as a child otherwise.
///
/// Redirection targets are opened before anything runs. A builtin gets the
/// opened files in place of the shell's stdio, so the shell's own streams are
/// never rebound.
pub fn execute(cmd: &CommandSpec, redirects: &RedirectionSpec) -> Result<Flow, ShellError> {
    let Some(builtin) = builtins::lookup(cmd.program()) else {
        return run_external(cmd, redirects).map(Flow::Continue);
    };

    let opened = redirects.open()?;
    let mut shell_stdin = io::stdin();
    let mut shell_stdout = io::stdout();
    let mut file_stdin;
    let mut file_stdout;
    let stdin: &mut dyn Read = match opened.stdin {
        Some(file) => {
            file_stdin = file;
            &mut file_stdin
        }
        None => &mut shell_stdin,
    };
    let stdout: &mut dyn Write = match opened.stdout {
        Some(file) => {
            file_stdout = file;
            &mut file_stdout
        }
        None => &mut shell_stdout,
    };

    let action = builtin.run(cmd.args(), &mut BuiltinIo { stdin, stdout })?;
    Ok(match action {
        Action::Continue(code) => Flow::Continue(ExitStatus::Exited(code)),
        Action::Exit(code) => Flow::Exit(code),
    })
}

/// The read-eval loop over one input stream.
#[derive(Debug)]
pub struct Session {
    interactive: bool,
    prompt: Prompt,
    greeting: Option<String>,
    farewell: Option<String>,
    last_failed: bool,
}

impl Session {
    /// A session that prints no prompt or banners.
    pub fn batch() -> Self {
        Self {
            interactive: false,
            prompt: Prompt::default(),
            greeting: None,
            farewell: None,
            last_failed: false,
        }
    }

    pub fn interactive(config: &Config) -> Self {
        Self {
            interactive: true,
            prompt: Prompt::new(config.prompt.clone()),
            greeting: config.greeting.clone(),
            farewell: config.farewell.clone(),
            last_failed: false,
        }
    }

    /// Runs `startup` lines, then every line of `reader`. Returns the
    /// process exit code.
    pub fn run<R: Read>(&mut self, startup: &[String], reader: &mut LineReader<R>) -> i32 {
        if self.interactive {
            if let Some(greeting) = &self.greeting {
                println!("{greeting}");
            }
        }

        let code = self.run_lines(startup, reader);

        if self.interactive {
            if let Some(farewell) = &self.farewell {
                println!("{farewell}");
            }
        }
        code
    }

    fn run_lines<R: Read>(&mut self, startup: &[String], reader: &mut LineReader<R>) -> i32 {
        for line in startup {
            if let Some(code) = self.run_line(line) {
                return code;
            }
        }

        loop {
            if self.interactive {
                self.show_prompt(&mut io::stdout());
            }
            match reader.next_line() {
                Ok(Some(line)) => {
                    if let Some(code) = self.run_line(&line) {
                        return code;
                    }
                }
                Ok(None) => return 0,
                Err(e) => {
                    eprintln!("mysh: cannot read input: {e}");
                    return 1;
                }
            }
        }
    }

    /// Runs one line, reporting any error. Returns an exit code when the
    /// session should end.
    pub fn run_line(&mut self, line: &str) -> Option<i32> {
        match exec(line) {
            Ok(None) => None,
            Ok(Some(Flow::Continue(status))) => {
                self.last_failed = !status.success();
                None
            }
            Ok(Some(Flow::Exit(code))) => Some(code),
            Err(e) => {
                eprintln!("mysh: {e}");
                self.last_failed = true;
                None
            }
        }
    }

    #[cfg(test)]
    fn last_failed(&self) -> bool {
        self.last_failed
    }

    fn show_prompt(&self, out: &mut dyn Write) {
        if let Err(e) = write!(out, "{}", self.prompt.render(self.last_failed)) {
            log::warn!("writing prompt failed: {e}");
        }
        if let Err(e) = out.flush() {
            log::warn!("flushing prompt failed: {e}");
        }
    }
}
