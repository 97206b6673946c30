//! Safe execution gateway
//!
//! Every statement against either store goes through a [`SafeExecutionGateway`].

mod context;
mod error;
mod executor;
mod registry;

pub use context::{
    is_sensitive_key, sanitize_context, CallContext, ExecutionContext, Operation, Outcome,
    REDACTION_MARKER,
};
pub use error::{classify, classify_database_error, sanitize_message};
pub use executor::{RawOutput, ResultMetadata, SafeExecutionGateway};
pub use registry::Gateways;
