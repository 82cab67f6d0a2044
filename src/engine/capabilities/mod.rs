//! Built-in step capabilities
//!
//! One capability per action kind.

mod extract;
mod http;
mod read_file;
mod set;
mod shell;
mod sleep;

pub use extract::ExtractCapability;
pub use http::HttpCapability;
pub use read_file::ReadFileCapability;
pub use set::SetCapability;
pub use shell::ShellCapability;
pub use sleep::SleepCapability;
