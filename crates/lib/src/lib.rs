//! Newsletter automation core library — channel directory, message normalizer, Slack client,
//! the parse-message handler, and the HTTP function server used by the CLI.

pub mod config;
pub mod directory;
pub mod handler;
pub mod init;
pub mod manifest;
pub mod normalize;
pub mod server;
pub mod slack;
