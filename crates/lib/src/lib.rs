//! comfyzl-lib: installation logic for ComfyUI on ZLUDA
//!
//! This crate provides the pieces of the installation sequence:
//! - `progress`: runs long external processes behind a synthetic heartbeat
//! - `provision`, `deps`, `source`: environment creation, requirements, checkout
//! - `configure`: operator decisions (interactive or preset)
//! - `launcher`, `shortcut`: the optional launcher script and desktop shortcut
//! - `patch`: compatibility binaries copied into `torch/lib`
//! - `install`: the orchestrator tying the steps together

pub mod configure;
pub mod consts;
pub mod context;
pub mod deps;
pub mod install;
pub mod launcher;
pub mod patch;
pub mod platform;
pub mod progress;
pub mod provision;
pub mod shortcut;
pub mod source;
pub mod util;
