//! POSIX shell quoting.

use crate::error::CoreError;

/// Quote `word` so a POSIX shell reads it back as exactly one word.
///
/// Words made only of shell-safe characters come back unchanged.
pub fn quote(word: &str) -> Result<String, CoreError> {
  shlex::try_quote(word)
    .map(|quoted| quoted.into_owned())
    .map_err(|_| CoreError::Unquotable(word.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn round_trip(word: &str) -> Vec<String> {
    shlex::split(&quote(word).unwrap()).unwrap()
  }

  #[test]
  fn safe_words_are_unchanged() {
    assert_eq!(quote("core-image-minimal").unwrap(), "core-image-minimal");
    assert_eq!(quote("/srv/yocto/build").unwrap(), "/srv/yocto/build");
  }

  #[test]
  fn empty_word_survives() {
    assert_eq!(round_trip(""), vec![""]);
  }

  #[test]
  fn assignments_stay_one_word() {
    assert_eq!(round_trip(r#"MACHINE = "qemux86-64""#), vec![r#"MACHINE = "qemux86-64""#]);
    assert_eq!(round_trip("it's $HOME"), vec!["it's $HOME"]);
  }

  #[test]
  fn quoted_words_keep_boundaries() {
    let line = ["A = \"1 2\"", "plain", ""]
      .map(|w| quote(w).unwrap())
      .join(" ");
    assert_eq!(shlex::split(&line).unwrap(), vec!["A = \"1 2\"", "plain", ""]);
  }

  #[test]
  fn nul_byte_is_rejected() {
    assert!(matches!(quote("a\0b"), Err(CoreError::Unquotable(_))));
  }
}
