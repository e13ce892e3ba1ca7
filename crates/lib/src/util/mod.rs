//! Shared utilities.
//!
//! Test helpers live here so every module's tests share one fake runner.

#[cfg(test)]
pub mod testutil;
