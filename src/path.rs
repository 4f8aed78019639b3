//! Bounded construction of the companion executable's path.

use std::{
  ffi::{CString, NulError, OsStr},
  os::unix::ffi::OsStrExt,
};

use nix::libc;

/// Capacity limit for the computed path, terminating NUL included.
pub const PATH_LIMIT: usize = libc::PATH_MAX as usize;

/// Byte buffer with shrinking-capacity bookkeeping: every append subtracts
/// from the free-space counter, which must stay positive. Exhaustion kills
/// the fixture on the spot rather than handing a truncated path to exec.
#[derive(Debug)]
pub struct BoundedPath {
  buf: Vec<u8>,
  free: usize,
}

impl BoundedPath {
  pub fn new() -> Self {
    Self {
      buf: Vec::new(),
      free: PATH_LIMIT - 1,
    }
  }

  pub fn append(&mut self, bytes: &[u8]) {
    assert!(
      bytes.len() < self.free,
      "companion path exceeds PATH_MAX ({PATH_LIMIT})"
    );
    self.free -= bytes.len();
    self.buf.extend_from_slice(bytes);
  }

  pub fn into_cstring(self) -> Result<CString, NulError> {
    CString::new(self.buf)
  }
}

impl Default for BoundedPath {
  fn default() -> Self {
    Self::new()
  }
}

/// Path of `name` inside the directory holding `argv0`.
pub fn sibling(argv0: &OsStr, name: &OsStr) -> BoundedPath {
  let mut path = BoundedPath::new();
  path.append(dirname(argv0.as_bytes()));
  path.append(b"/");
  path.append(name.as_bytes());
  path
}

/// POSIX `dirname` over raw bytes. argv[0] is an OS string and need not be
/// valid UTF-8.
pub fn dirname(path: &[u8]) -> &[u8] {
  let trimmed = trim_trailing_slashes(path);
  if trimmed.is_empty() {
    // "" and paths made of nothing but slashes
    return if path.is_empty() { b"." } else { b"/" };
  }
  match trimmed.iter().rposition(|&b| b == b'/') {
    None => b".",
    Some(cut) => {
      let parent = trim_trailing_slashes(&trimmed[..cut]);
      if parent.is_empty() { b"/" } else { parent }
    }
  }
}

fn trim_trailing_slashes(path: &[u8]) -> &[u8] {
  let end = path.iter().rposition(|&b| b != b'/').map_or(0, |i| i + 1);
  &path[..end]
}

#[cfg(test)]
mod tests {
  use std::{ffi::OsString, os::unix::ffi::OsStringExt};

  use rstest::rstest;

  use super::*;

  #[rstest]
  #[case(b"", b".")]
  #[case(b"follow-exec", b".")]
  #[case(b"/", b"/")]
  #[case(b"//", b"/")]
  #[case(b"/usr", b"/")]
  #[case(b"/usr/", b"/")]
  #[case(b"/usr/lib", b"/usr")]
  #[case(b"usr/lib", b"usr")]
  #[case(b"usr/lib/", b"usr")]
  #[case(b"a//b", b"a")]
  #[case(b"/tmp/testdir/follow-exec", b"/tmp/testdir")]
  fn dirname_matches_posix(#[case] path: &[u8], #[case] expected: &[u8]) {
    assert_eq!(dirname(path), expected);
  }

  #[test]
  fn sibling_joins_directory_and_companion() {
    let prog = sibling(
      OsStr::new("/tmp/testdir/follow-exec"),
      OsStr::new("execd-prog"),
    )
    .into_cstring()
    .unwrap();
    assert_eq!(prog.to_bytes(), b"/tmp/testdir/execd-prog");
  }

  #[test]
  fn sibling_of_bare_name_lives_in_cwd() {
    let prog = sibling(OsStr::new("follow-exec"), OsStr::new("execd-prog"))
      .into_cstring()
      .unwrap();
    assert_eq!(prog.to_bytes(), b"./execd-prog");
  }

  #[test]
  #[should_panic(expected = "exceeds PATH_MAX")]
  fn capacity_exhaustion_panics() {
    let mut path = BoundedPath::new();
    path.append(&[b'a'; PATH_LIMIT]);
  }

  #[test]
  #[should_panic(expected = "exceeds PATH_MAX")]
  fn overlong_directory_dies_before_any_exec() {
    let mut bytes = vec![b'/'];
    bytes.extend(vec![b'a'; PATH_LIMIT]);
    bytes.extend_from_slice(b"/follow-exec");
    let argv0 = OsString::from_vec(bytes);
    sibling(&argv0, OsStr::new("execd-prog"));
  }
}
