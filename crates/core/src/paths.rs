//! Lexical path helpers.
//!
//! Graph generation must not touch the filesystem, so paths are resolved
//! purely by their components: no symlink resolution, no existence checks.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without consulting the filesystem.
///
/// `..` at the root of an absolute path is dropped; leading `..` of a
/// relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
  let mut parts: Vec<Component<'_>> = Vec::new();

  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match parts.last() {
        Some(Component::Normal(_)) => {
          parts.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        Some(Component::ParentDir) | Some(Component::CurDir) | None => parts.push(component),
      },
      other => parts.push(other),
    }
  }

  if parts.is_empty() {
    return PathBuf::from(".");
  }
  parts.iter().collect()
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn absolutize(root: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    normalize(path)
  } else {
    normalize(&root.join(path))
  }
}

#[cfg(test)]
#[cfg(not(windows))]
mod tests {
  use super::*;

  #[test]
  fn normalize_collapses_dots() {
    assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
    assert_eq!(normalize(Path::new("/x/../../y")), PathBuf::from("/y"));
    assert_eq!(normalize(Path::new("../a/..")), PathBuf::from(".."));
    assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
  }

  #[test]
  fn absolutize_joins_relative_paths() {
    assert_eq!(
      absolutize(Path::new("/work"), Path::new("srcs/mylib")),
      PathBuf::from("/work/srcs/mylib")
    );
    assert_eq!(
      absolutize(Path::new("/work/top"), Path::new("../shared")),
      PathBuf::from("/work/shared")
    );
  }

  #[test]
  fn absolutize_keeps_absolute_paths() {
    assert_eq!(absolutize(Path::new("/work"), Path::new("/opt/src/")), PathBuf::from("/opt/src"));
  }
}
