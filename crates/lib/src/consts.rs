//! Fixed names and defaults for the install layout.

pub const APP_NAME: &str = "comfyzl";

/// Repository cloned into the application directory.
pub const DEFAULT_REPO_URL: &str = "https://github.com/Royalkin/ComfyUI-Zluda.git";

/// Application checkout, relative to the install directory.
pub const APP_DIR_NAME: &str = "comfyui";

/// Isolated environment, relative to the application directory.
pub const ENV_DIR_NAME: &str = ".venv";

pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const ENTRY_POINT: &str = "main.py";

/// Documentation the operator is pointed at before entering launch arguments.
pub const ARGS_REFERENCE_FILE: &str = "command_line_arguments.md";

/// Launcher file stem; the extension depends on the host shell.
pub const LAUNCHER_STEM: &str = "run_comfyui";

pub const SHORTCUT_NAME: &str = "ComfyUI";
pub const SHORTCUT_DESCRIPTION: &str = "Shortcut to run ComfyUI";

/// Vendor binaries, relative to the application directory.
pub const PATCH_SOURCE_DIR: &[&str] = &["zluda", "renamed_dlls"];

/// (source file, destination file) pairs copied into `torch/lib`.
pub const DEFAULT_PATCHES: &[(&str, &str)] = &[
  ("cublas64_11.dll", "cublas64_11.dll"),
  ("cusparse64_11.dll", "cusparse64_11.dll"),
];
