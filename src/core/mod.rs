//! Runtime components: sensor access, sampling loop and metrics endpoint.

pub mod error;
pub mod executor;
pub mod metrics;
pub mod sensor;
