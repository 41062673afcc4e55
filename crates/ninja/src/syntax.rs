//! Ninja lexical escaping.
//!
//! Ninja treats `$` as its escape character everywhere. In paths on `build`
//! lines, spaces and colons are separators and must be escaped as well.
//! Variable values only need `$` doubled.

/// Escape a string for use as a variable value.
pub fn escape(value: &str) -> String {
  value.replace('$', "$$")
}

/// Escape a path for use on a `build` or `default` line.
pub fn escape_path(path: &str) -> String {
  let mut out = String::with_capacity(path.len());
  for ch in path.chars() {
    match ch {
      '$' => out.push_str("$$"),
      ' ' => out.push_str("$ "),
      ':' => out.push_str("$:"),
      '\n' => out.push_str("$\n"),
      c => out.push(c),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn escape_doubles_dollars_only() {
    assert_eq!(escape("${TOPDIR}/x y:z"), "$${TOPDIR}/x y:z");
  }

  #[test]
  fn escape_path_handles_separators() {
    assert_eq!(escape_path("dir with space/a:b$c"), "dir$ with$ space/a$:b$$c");
  }

  #[test]
  fn plain_path_is_unchanged() {
    assert_eq!(escape_path("yocto/build/conf/local.conf"), "yocto/build/conf/local.conf");
  }
}
