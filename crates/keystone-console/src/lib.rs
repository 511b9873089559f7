#![forbid(unsafe_op_in_unsafe_fn)]

pub mod commands;
pub mod console;
pub mod log_buffer;
pub mod options;
pub mod service;

pub use commands::{CommandCtx, CommandSet};
pub use console::{DeveloperConsole, Tab};
pub use log_buffer::{ConsoleLog, LogBuffer, LogCounts, LogKind};
pub use options::{OptionCategory, OptionData, OptionError, OptionId, OptionsTab, DEFAULT_CATEGORY};
pub use service::DeveloperConsoleService;
