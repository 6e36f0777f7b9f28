//! Voice commands
//!
//! Two pools: compiled-in [`BuiltinCommand`]s matched by substring, and a
//! dynamic [`CommandRegistry`] that pages fill while they are mounted.
//! Registry entries are matched exactly and always win over built-ins.

mod builtin;
mod dispatcher;
mod registry;

pub use builtin::{BUILTIN_GROUPS, BuiltinCommand, SCROLL_STEP};
pub use dispatcher::{
    CUSTOM_COMMAND_CONFIRMATION, Dispatcher, Resolution, global_help, page_help,
    unrecognized_message,
};
pub use registry::{CommandAction, CommandEntry, CommandRegistry, normalize_phrase};
