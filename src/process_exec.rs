use std::env;
use std::fs::File;
use std::io::{self, PipeWriter};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::builtins::{self, Action, Builtin, BuiltinIo};
use crate::error::{ShellError, SyntaxError};
use crate::parse::Operator;
use crate::redirect::{CommandSpec, RedirectionSpec};
use crate::status::ExitStatus;

/// Resolves a command name to the file that would be executed.
///
/// Names containing a `/` are taken as paths; anything else is searched for
/// in the directories of `PATH`.
pub fn find_program(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    if name.contains('/') {
        let path = Path::new(name);
        return is_executable(path).then(|| path.to_path_buf());
    }

    let search_paths = env::var_os("PATH")?;
    env::split_paths(&search_paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Spawns `program` with the given stdio.
///
/// The `Command` (and with it every descriptor handed to it) is dropped before
/// returning, so the shell keeps no copy of the child's pipe ends.
fn spawn(cmd: &CommandSpec, program: &Path, stdin: Stdio, stdout: Stdio) -> Option<Child> {
    let spawned = Command::new(program)
        .arg0(cmd.program())
        .args(cmd.args())
        .stdin(stdin)
        .stdout(stdout)
        .spawn();

    match spawned {
        Ok(child) => {
            log::debug!("spawned {} as pid {}", program.display(), child.id());
            Some(child)
        }
        Err(e) => {
            eprintln!("mysh: {}: {e}", cmd.program());
            None
        }
    }
}

fn wait(cmd: &CommandSpec, child: Option<Child>) -> ExitStatus {
    let Some(mut child) = child else {
        return ExitStatus::LaunchFailed;
    };
    match child.wait() {
        Ok(status) => {
            log::debug!("{} (pid {}) {:?}", cmd.program(), child.id(), status);
            status.into()
        }
        Err(e) => {
            log::warn!("waiting for {} (pid {}) failed: {e}", cmd.program(), child.id());
            ExitStatus::FAILURE
        }
    }
}

fn stdio_or_inherit(file: Option<File>) -> Stdio {
    file.map_or_else(Stdio::inherit, Stdio::from)
}

/// Runs an external command to completion with its redirections applied.
///
/// Both redirection targets are opened before the child is created; if either
/// fails nothing is spawned and the shell's own stdio is never touched.
pub fn run_external(cmd: &CommandSpec, redirects: &RedirectionSpec) -> Result<ExitStatus, ShellError> {
    let program =
        find_program(cmd.program()).ok_or_else(|| ShellError::CommandNotFound(cmd.program().to_string()))?;
    let opened = redirects.open()?;

    let child = spawn(
        cmd,
        &program,
        stdio_or_inherit(opened.stdin),
        stdio_or_inherit(opened.stdout),
    );
    Ok(wait(cmd, child))
}

/// One side of a pipeline after validation.
enum Stage {
    Builtin(&'static Builtin),
    External(PathBuf),
}

/// Connects `left`'s stdout to `right`'s stdin and waits for both.
///
/// Every check that can fail without a process (syntax conflicts, program
/// lookup, redirection targets) runs before anything is spawned. The right side
/// is started first so a builtin on the left can write into the pipe without
/// filling it up with no reader.
pub fn run_pipeline(
    (left, left_redirects): (&CommandSpec, &RedirectionSpec),
    (right, right_redirects): (&CommandSpec, &RedirectionSpec),
) -> Result<(ExitStatus, ExitStatus), ShellError> {
    if left_redirects.output.is_some() {
        return Err(SyntaxError::PipeConflict(Operator::RedirectOut).into());
    }
    if right_redirects.input.is_some() {
        return Err(SyntaxError::PipeConflict(Operator::RedirectIn).into());
    }

    let left_stage = match builtins::lookup(left.program()) {
        Some(builtin) if !builtin.pipeable => {
            return Err(ShellError::NotInPipeline(left.program().to_string()));
        }
        Some(builtin) => Stage::Builtin(builtin),
        None => Stage::External(
            find_program(left.program()).ok_or_else(|| ShellError::CommandNotFound(left.program().to_string()))?,
        ),
    };
    match builtins::lookup(right.program()) {
        Some(builtin) if !builtin.pipeable => {
            return Err(ShellError::NotInPipeline(right.program().to_string()));
        }
        Some(_) => return Err(ShellError::BuiltinAfterPipe(right.program().to_string())),
        None => {}
    }
    let right_program =
        find_program(right.program()).ok_or_else(|| ShellError::CommandNotFound(right.program().to_string()))?;

    let left_input = left_redirects.open_input()?;
    let right_output = right_redirects.open_output()?;
    let (reader, writer) = io::pipe().map_err(ShellError::Pipe)?;

    let right_child = spawn(right, &right_program, Stdio::from(reader), stdio_or_inherit(right_output));
    let left_status = run_left(left, left_stage, left_input, writer);
    let right_status = wait(right, right_child);

    Ok((left_status, right_status))
}

/// Runs the writing side. `writer` is consumed, so the pipe's last write end
/// held by the shell is closed when this returns.
fn run_left(cmd: &CommandSpec, stage: Stage, input: Option<File>, writer: PipeWriter) -> ExitStatus {
    match stage {
        Stage::External(program) => {
            let child = spawn(cmd, &program, stdio_or_inherit(input), Stdio::from(writer));
            wait(cmd, child)
        }
        Stage::Builtin(builtin) => run_builtin_into_pipe(cmd, builtin, input, writer),
    }
}

fn run_builtin_into_pipe(
    cmd: &CommandSpec,
    builtin: &Builtin,
    input: Option<File>,
    mut writer: PipeWriter,
) -> ExitStatus {
    let mut shell_stdin = io::stdin();
    let mut file_stdin;
    let stdin: &mut dyn io::Read = match input {
        Some(file) => {
            file_stdin = file;
            &mut file_stdin
        }
        None => &mut shell_stdin,
    };
    let mut io = BuiltinIo { stdin, stdout: &mut writer };

    match builtin.run(cmd.args(), &mut io) {
        Ok(Action::Continue(code)) | Ok(Action::Exit(code)) => ExitStatus::Exited(code),
        Err(e) => {
            eprintln!("mysh: {e}");
            ExitStatus::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::tokenize;
    use crate::redirect::resolve;
    use std::io::{PipeReader, Read};

    fn command(line: &str) -> (CommandSpec, RedirectionSpec) {
        resolve(tokenize(line)).unwrap()
    }

    fn pipeline(left: &str, right: &str) -> Result<(ExitStatus, ExitStatus), ShellError> {
        let (l, lr) = command(left);
        let (r, rr) = command(right);
        run_pipeline((&l, &lr), (&r, &rr))
    }

    fn read_all(mut reader: PipeReader) -> Vec<u8> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn finds_programs_on_path() {
        let sh = find_program("sh").unwrap();
        assert!(sh.is_absolute());
        assert_eq!(find_program(sh.to_str().unwrap()), Some(sh));
        assert_eq!(find_program("definitely-not-a-command-1234"), None);
        assert_eq!(find_program("/etc"), None);
        assert_eq!(find_program(""), None);
    }

    #[test]
    fn external_status_is_reported() {
        let (cmd, redirects) = command("true");
        assert_eq!(run_external(&cmd, &redirects).unwrap(), ExitStatus::SUCCESS);

        let (cmd, redirects) = command("false");
        assert_eq!(run_external(&cmd, &redirects).unwrap(), ExitStatus::Exited(1));
    }

    #[test]
    fn signaled_child_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("kill-self.sh");
        std::fs::write(&script, "kill -9 $$\n").unwrap();

        let (cmd, redirects) = command(&format!("sh {}", script.display()));
        assert_eq!(run_external(&cmd, &redirects).unwrap(), ExitStatus::Signaled(9));
    }

    #[test]
    fn unknown_command_is_not_spawned() {
        let (cmd, redirects) = command("no-such-command-xyz arg");
        assert!(matches!(
            run_external(&cmd, &redirects),
            Err(ShellError::CommandNotFound(name)) if name == "no-such-command-xyz"
        ));
    }

    #[test]
    fn redirects_apply_to_child() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        std::fs::write(&input, "banana\napple\n").unwrap();

        let line = format!("sort < {} > {}", input.display(), output.display());
        let (cmd, redirects) = command(&line);
        assert_eq!(run_external(&cmd, &redirects).unwrap(), ExitStatus::SUCCESS);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "apple\nbanana\n");
    }

    #[test]
    fn missing_input_file_prevents_launch() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let line = format!("cat < {} > {}", dir.path().join("missing").display(), output.display());
        let (cmd, redirects) = command(&line);

        assert!(matches!(run_external(&cmd, &redirects), Err(ShellError::Redirect { .. })));
        assert!(!output.exists(), "output opened although input failed");
    }

    #[test]
    fn pipeline_carries_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let right = format!("wc -c > {}", output.display());

        let statuses = pipeline("head -c 200000 /dev/zero", &right).unwrap();
        assert_eq!(statuses, (ExitStatus::SUCCESS, ExitStatus::SUCCESS));
        assert_eq!(std::fs::read_to_string(&output).unwrap().trim(), "200000");
    }

    #[test]
    fn pipeline_with_silent_writer_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let right = format!("cat > {}", output.display());

        let statuses = pipeline("true", &right).unwrap();
        assert_eq!(statuses, (ExitStatus::SUCCESS, ExitStatus::SUCCESS));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
    }

    #[test]
    fn builtin_feeds_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let right = format!("cat > {}", output.display());

        let statuses = pipeline("which sh", &right).unwrap();
        assert_eq!(statuses.0, ExitStatus::SUCCESS);
        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written.trim_end(), find_program("sh").unwrap().display().to_string());
    }

    #[test]
    fn cd_in_pipeline_keeps_directory() {
        let before = env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let left = format!("cd {}", dir.path().display());

        assert!(matches!(pipeline(&left, "cat"), Err(ShellError::NotInPipeline(name)) if name == "cd"));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn pipeline_policy_errors() {
        assert!(matches!(pipeline("ls", "pwd"), Err(ShellError::BuiltinAfterPipe(_))));
        assert!(matches!(pipeline("exit", "cat"), Err(ShellError::NotInPipeline(_))));
        assert!(matches!(
            pipeline("ls > out", "cat"),
            Err(ShellError::Syntax(SyntaxError::PipeConflict(Operator::RedirectOut)))
        ));
        assert!(matches!(
            pipeline("ls", "cat < in"),
            Err(ShellError::Syntax(SyntaxError::PipeConflict(Operator::RedirectIn)))
        ));
        assert!(matches!(pipeline("ls", "no-such-command-xyz"), Err(ShellError::CommandNotFound(_))));
    }

    #[test]
    fn pipe_end_closes_after_builtin() {
        let (reader, writer) = io::pipe().unwrap();
        let (cmd, _) = command("pwd");
        let status = run_builtin_into_pipe(&cmd, builtins::lookup("pwd").unwrap(), None, writer);
        assert_eq!(status, ExitStatus::SUCCESS);
        // read_all only returns once every write end is closed.
        let out = String::from_utf8(read_all(reader)).unwrap();
        assert_eq!(out.trim_end(), env::current_dir().unwrap().display().to_string());
    }
}
