pub mod config;
pub mod error;
pub mod external;
pub mod runtime;
pub mod tools;

pub use config::DispatchConfig;
pub use error::{DispatchError, ToolExecutionError};
pub use external::{ExternalToolAdapter, load_dynamic_identifiers};
pub use runtime::Dispatcher;
pub use tools::{
    Arguments, ClockTool, GreetingTool, InProcessTool, RegistryEntry, ResolvedRegistry,
    ToolCatalog, ToolDescriptor, ToolHandle, ToolKind, ToolRegistry, WorkspaceTool,
    validate_arguments,
};
