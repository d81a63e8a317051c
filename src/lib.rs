//! Platform Lifecycle MCP Server
//!
//! This crate provides an MCP server that creates, inspects and deletes
//! resources on a hosted agent platform. Creation and deletion are
//! asynchronous on the platform side, so the server can poll a resource
//! until it settles:
//!
//! - Create requests may attach an existing integration or create one inline
//! - Creation waits until the resource leaves its building states
//! - Deletion waits until the resource is gone
//! - Polling failures after a successful create or delete become warnings
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         MCP client                              │
//! └───────────────────────────┬─────────────────────────────────────┘
//!                             │ MCP Protocol (JSON-RPC over stdio)
//!                             ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        platform-mcp                             │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐    │
//! │  │ Tool       │ │ Resource   │ │ Integration│ │ Lifecycle  │    │
//! │  │ Registry   │ │ Orchestr.  │ │ Resolver   │ │ Poller     │    │
//! │  └────────────┘ └────────────┘ └────────────┘ └────────────┘    │
//! └───────────────────────────┬─────────────────────────────────────┘
//!                             │ HTTPS (reqwest)
//!                             ▼
//!                    ┌─────────────────┐
//!                    │  Platform API   │
//!                    └─────────────────┘
//! ```
//!
//! # MCP Tools
//!
//! Each of `agent`, `job`, `model_api`, `tool_server` and `sandbox` gets:
//!
//! | Tool | Description |
//! |------|-------------|
//! | `create_<kind>` | Create a resource, optionally waiting until deployed |
//! | `delete_<kind>` | Delete a resource, optionally waiting until gone |
//! | `get_<kind>` | Fetch one resource and its status |
//! | `list_<kinds>` | List resources of the kind |

pub mod checker;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod platform;
pub mod poller;
pub mod protocol;
pub mod report;
pub mod resolver;
pub mod resource;
pub mod server;
pub mod status;
pub mod tools;

#[cfg(test)]
mod testing;

pub use config::PlatformConfig;
pub use error::{Error, Result};
pub use orchestrator::{Outcome, ResourceOrchestrator};
pub use platform::{PlatformClient, PlatformError};
pub use protocol::{McpRequest, McpResponse};
pub use resource::{ResourceKind, ResourceSpec};
pub use server::PlatformMcpServer;
pub use status::{LifecycleStatus, PollPolicy};
