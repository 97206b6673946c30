//! Database connection pool management

mod any;

pub use any::{create_pool, database_identity, ConnectError, StoreTarget};

// Re-export AnyPool for convenience
pub use sqlx::AnyPool;
