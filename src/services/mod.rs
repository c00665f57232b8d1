pub mod health_monitor;
pub mod query_session;

pub use health_monitor::{HealthMonitor, TickOutcome};
pub use query_session::{QueryActivity, QuerySessionController};
