pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod models;
pub mod validation;

pub use config::Config;
pub use health::ClusterHealthMonitor;
pub use models::{ClusterStatus, NodeStatus, ValidationResult, ValidationStatus};
pub use validation::{CompositeValidator, DefaultValidator, DomainValidator, EmailValidator};
