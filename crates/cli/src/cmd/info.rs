use anyhow::Result;
use serde::Serialize;

use comfyzl_lib::platform::os::Os;
use comfyzl_lib::platform::paths::desktop_dir;
use comfyzl_lib::platform::platform_triple;
use comfyzl_lib::platform::shell::HostShell;

use crate::output::{self, OutputFormat};

#[derive(Serialize)]
struct Info {
  platform: Option<String>,
  shell: Option<HostShell>,
  python: Option<&'static str>,
  desktop: Option<String>,
}

pub fn cmd_info(format: OutputFormat) -> Result<()> {
  let os = Os::current();
  let info = Info {
    platform: platform_triple(),
    shell: os.map(HostShell::detect),
    python: os.map(|os| os.default_python()),
    desktop: os.and_then(|os| desktop_dir(os).ok()).map(|d| d.display().to_string()),
  };

  if format.is_json() {
    return output::print_json(&info);
  }

  println!("System:");
  let unknown = || "unknown".to_string();
  output::print_stat("Platform", &info.platform.clone().unwrap_or_else(unknown));
  output::print_stat("Shell", info.shell.map(|s| s.as_str()).unwrap_or("unknown"));
  output::print_stat("Python", info.python.unwrap_or("unknown"));
  output::print_stat("Desktop", &info.desktop.clone().unwrap_or_else(unknown));
  Ok(())
}
