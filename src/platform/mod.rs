//! Remote platform API: client traits, HTTP implementation and typed models.

pub mod client;
pub mod error;
pub mod types;

pub use client::{IntegrationClient, PlatformClient, ResourceClient};
pub use error::PlatformError;
pub use types::{PlatformResource, ResourceSummary};
