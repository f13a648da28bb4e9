//! # Balancer Core
//!
//! Routing decision engine for the video balancer.
//!
//! ```text
//! balancer-core/src/
//! ├── parser.rs     # Video URL parsing and validation
//! ├── decision.rs   # Deterministic CDN/origin split + request counter
//! ├── resolver.rs   # Config resolution: cache → store → defaults
//! ├── balancer.rs   # Orchestrator composing the balance operation
//! ├── cache.rs      # Config cache trait + Redis backend
//! ├── repository.rs # Config repository trait
//! ├── config_pg.rs  # PostgreSQL repository implementation
//! └── models.rs     # SplitConfig, ConfigRecord, ParsedVideoUrl
//! ```

pub mod balancer;
pub mod cache;
pub mod config_pg;
pub mod decision;
pub mod error;
pub mod models;
pub mod parser;
pub mod repository;
pub mod resolver;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types
pub use balancer::{RouteDecision, VideoBalancer};
pub use decision::{decide, RequestCounter, RouteTarget};
pub use error::{BalancerError, BalancerResult};
pub use models::{ConfigRecord, ParsedVideoUrl, SplitConfig};
