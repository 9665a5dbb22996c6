//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the extension and something it
//! does not own: the host application, external processes, and executable
//! lookup. Implementations live in `src/adapters/`.

pub mod host;
pub mod process;
pub mod resolver;

pub use host::{
    CommandInfo, ContextMenuItem, Dialog, Host, MenuContext, Notification, NotificationLevel,
    ProgressSink, ProgressUpdate, SettingDefinition, SettingKind,
};
pub use process::{
    BoxError, ExecFuture, ExecutionResult, ProcessEvent, ProcessExecutor, ProgressProcessExecutor,
    RunningProcess,
};
pub use resolver::BinaryResolver;
