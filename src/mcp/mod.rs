pub mod format;
pub mod handlers;
pub mod sse;
pub mod tools;
pub mod types;

pub use tools::{ToolExecutor, ToolName};
pub use types::{JsonRpcRequest, JsonRpcResponse, RpcError, RpcMethod};
