mod info;
pub mod install;
mod patch;

pub use info::cmd_info;
pub use install::cmd_install;
pub use patch::cmd_patch;
