//! The three-stage replacement sequence.
//!
//! Each stage announces itself on stdout and then calls a different exec
//! primitive against the companion path. A successful call never returns;
//! a failed one falls through to the next stage. The fall-through is the
//! point: an attached debugger breaks on each call site and decides which
//! image, if any, gets to take over the process.

use std::{
  convert::Infallible,
  env,
  ffi::CString,
  io::{Write, stdout},
  os::unix::ffi::OsStringExt,
};

use nix::{
  errno::Errno,
  unistd::{execv, execve, execvp},
};
use snafu::{OptionExt, ResultExt, Snafu};
use strum::IntoStaticStr;
use tracing::debug;

use crate::path;

/// Companion program expected next to our own binary.
pub const DEFAULT_COMPANION: &str = "execd-prog";
/// Environment variable overriding the companion name.
pub const COMPANION_ENV: &str = "EXECD_PROG";

const FIXTURE: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, Snafu)]
pub enum Error {
  #[snafu(display("cannot locate the companion: argv[0] is missing"))]
  MissingArgv0,
  #[snafu(display("{what} contains an interior NUL byte"))]
  Nul {
    what: &'static str,
    source: std::ffi::NulError,
  },
}

/// The exec primitive a stage is about to hand the process to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ExecCall {
  Execvp,
  Execv,
  Execve,
}

/// Runs the replacement attempts in order: path-search `execvp`, direct
/// `execv`, then `execve` with the environment passed through explicitly.
/// Returns only if every attempt failed to replace the image.
pub fn run() -> Result<(), Error> {
  let argv0 = env::args_os().next().context(MissingArgv0Snafu)?;
  let companion = env::var_os(COMPANION_ENV).unwrap_or_else(|| DEFAULT_COMPANION.into());
  let shown = companion.to_string_lossy().into_owned();

  announce(ExecCall::Execvp, &shown);

  let prog = path::sibling(&argv0, &companion)
    .into_cstring()
    .context(NulSnafu {
      what: "companion path",
    })?;
  debug!("computed companion path: {prog:?}");

  fall_through(
    ExecCall::Execvp,
    execvp(
      &prog,
      &[prog.clone(), arg(format!("execvp arg1 from {FIXTURE}"))?],
    ),
  );

  announce(ExecCall::Execv, &shown);
  fall_through(
    ExecCall::Execv,
    execv(
      &prog,
      &[
        prog.clone(),
        arg(format!("execv arg1 from {FIXTURE}"))?,
        arg(format!("execv arg2 from {FIXTURE}"))?,
      ],
    ),
  );

  // Argument vector built up front; slot 0 is only known at run time.
  let mut argv = [
    CString::default(),
    arg(format!("execve arg1 from {FIXTURE}"))?,
  ];
  argv[0] = prog.clone();
  let envp = environ()?;

  announce(ExecCall::Execve, &shown);
  fall_through(ExecCall::Execve, execve(&prog, &argv, &envp));

  Ok(())
}

fn announce(call: ExecCall, companion: &str) {
  // Verified by the debugger driving this fixture. Flush eagerly: buffered
  // output would be lost when the image is replaced.
  println!(
    "{FIXTURE} is about to {}({companion})...",
    <&'static str>::from(call)
  );
  let _ = stdout().flush();
}

/// Reached only when the replacement did not take effect. No recovery, the
/// next statement simply runs.
fn fall_through(call: ExecCall, result: Result<Infallible, Errno>) -> Errno {
  let errno = result.unwrap_err();
  debug!("{} returned: {errno}", <&'static str>::from(call));
  errno
}

fn arg(text: String) -> Result<CString, Error> {
  CString::new(text).context(NulSnafu { what: "argument" })
}

/// Current environment as NUL-terminated `KEY=value` entries for `execve`.
fn environ() -> Result<Vec<CString>, Error> {
  env::vars_os()
    .map(|(key, value)| {
      let mut entry = key.into_vec();
      entry.push(b'=');
      entry.extend(value.into_vec());
      CString::new(entry).context(NulSnafu {
        what: "environment entry",
      })
    })
    .collect()
}
