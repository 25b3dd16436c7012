use std::{
    env,
    fs::File,
    io::{self, IsTerminal},
    process::ExitCode,
};

use anyhow::{Context, Result, bail};
use env_logger::Env;

use mysh::{LineReader, Session, config};

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().filter_or("MYSH_LOG", "warn")).init();

    match run(env::args().skip(1).collect()) {
        // Exit statuses are taken modulo 256, as with any Unix process.
        Ok(code) => ExitCode::from((code & 0xff) as u8),
        Err(e) => {
            eprintln!("mysh: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<i32> {
    match args.as_slice() {
        // [1] Interactive: prompts and banners only when a person is typing
        [] => {
            let stdin = io::stdin();
            let mut reader = LineReader::new(stdin.lock());
            if !stdin.is_terminal() {
                return Ok(Session::batch().run(&[], &mut reader));
            }
            let cfg = config::init();
            Ok(Session::interactive(&cfg).run(&cfg.startup, &mut reader))
        }
        // [2] Batch: one script file, no prompts
        [script] => {
            let file = File::open(script).with_context(|| format!("cannot open {script}"))?;
            let mut reader = LineReader::new(file);
            Ok(Session::batch().run(&[], &mut reader))
        }
        _ => bail!("usage: mysh [script]"),
    }
}
