//! User directory resolution from the environment.

use std::path::PathBuf;

use thiserror::Error;

use super::os::Os;

#[derive(Debug, Error)]
pub enum PathsError {
  #[error("cannot locate the user profile: {var} is not set")]
  MissingVar { var: &'static str },
}

/// Variable naming the user's profile directory on `os`.
pub fn profile_var(os: Os) -> &'static str {
  match os {
    Os::Windows => "USERPROFILE",
    Os::Linux | Os::MacOs => "HOME",
  }
}

/// Returns the user's home directory
pub fn home_dir(os: Os) -> Result<PathBuf, PathsError> {
  let var = profile_var(os);
  match std::env::var_os(var) {
    Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
    _ => Err(PathsError::MissingVar { var }),
  }
}

/// Returns the directory desktop shortcuts are written to
///
/// On Linux `XDG_DESKTOP_DIR` wins when set; everywhere else it is
/// `<profile>/Desktop`.
pub fn desktop_dir(os: Os) -> Result<PathBuf, PathsError> {
  if os == Os::Linux {
    if let Some(dir) = std::env::var_os("XDG_DESKTOP_DIR").filter(|d| !d.is_empty()) {
      return Ok(PathBuf::from(dir));
    }
  }
  Ok(home_dir(os)?.join("Desktop"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn windows_desktop_lives_under_userprofile() {
    temp_env::with_var("USERPROFILE", Some(r"C:\Users\op"), || {
      assert_eq!(
        desktop_dir(Os::Windows).unwrap(),
        PathBuf::from(r"C:\Users\op").join("Desktop")
      );
    });
  }

  #[test]
  #[serial]
  fn xdg_desktop_dir_takes_precedence_on_linux() {
    temp_env::with_vars(
      [("XDG_DESKTOP_DIR", Some("/custom/desk")), ("HOME", Some("/home/op"))],
      || {
        assert_eq!(desktop_dir(Os::Linux).unwrap(), PathBuf::from("/custom/desk"));
        assert_eq!(desktop_dir(Os::MacOs).unwrap(), PathBuf::from("/home/op/Desktop"));
      },
    );
  }

  #[test]
  #[serial]
  fn missing_profile_is_reported_by_name() {
    temp_env::with_vars(
      [("XDG_DESKTOP_DIR", None::<&str>), ("HOME", None::<&str>)],
      || {
        let err = desktop_dir(Os::Linux).unwrap_err();
        assert!(err.to_string().contains("HOME"));
      },
    );
  }
}
