//! Live adapters for real external interactions.

pub mod host;
pub mod process;
pub mod resolver;

pub use host::ConsoleHost;
pub use process::{LiveProcessExecutor, LiveProgressExecutor};
pub use resolver::LiveBinaryResolver;
