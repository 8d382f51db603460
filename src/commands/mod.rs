// src/commands/mod.rs
//! Command handlers for the pocketup CLI

mod check;
mod install;
mod lint;
mod list;
mod uninstall;

pub use check::cmd_check;
pub use install::cmd_install;
pub use lint::cmd_lint;
pub use list::cmd_list;
pub use uninstall::cmd_uninstall;
