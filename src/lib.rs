pub mod config;
pub mod error;
pub mod memory;
pub mod status;
pub mod tools;

pub mod prelude {
    pub use crate::config::MemoryConfig;
    pub use crate::error::{MemoryError, Result};
    pub use crate::memory::{FactMemory, FactVerdict, UrlMemory};
    pub use crate::status::StatusReport;
    pub use crate::tools::{Tool, ToolManager, ToolParameters, ToolResult, newsletter_tools};
}
