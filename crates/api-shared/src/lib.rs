//! # API Shared
//!
//! Shared definitions for the Ambulance Assistant HTTP API.
//!
//! Contains:
//! - Request and response bodies (`wire` module), documented for OpenAPI
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` on the server side and by `ambu-client` on the consumer side, so both
//! ends agree on the JSON shapes.

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
