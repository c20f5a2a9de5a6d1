//! External process execution and host process queries.

pub mod cancel;
pub mod command;
pub mod mock;
pub mod platform;

pub use cancel::CancelToken;
pub use command::{
    display_command, execute, CommandOptions, CommandResult, CommandRunner,
    SystemRunner,
};
pub use mock::{MockResponse, MockRunner};
pub use platform::{is_elevated, is_executable, parse_system_path, resolve_tool_path, which};
