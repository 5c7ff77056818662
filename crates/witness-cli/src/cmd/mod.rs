//! One module per subcommand.

pub mod delete;
pub mod init;
pub mod ls;
pub mod sessions;
pub mod show;
pub mod verify;
