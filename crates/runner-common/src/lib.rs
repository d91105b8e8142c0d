// runner-common: Shared services for the runner bootstrap.
// Host context, secret masking, named trace sources, logging setup and the
// HTTP client factory. Depends on `runner-sdk`.

pub mod constants;
pub mod host_context;
pub mod http_client_factory;
pub mod logging;
pub mod secret_masker;
pub mod tracing;

// ---------------------------------------------------------------------------
// Re-exports for convenient access
// ---------------------------------------------------------------------------

pub use constants::{OsPlatform, CURRENT_PLATFORM};
pub use host_context::{HostContext, ShutdownReason};
pub use http_client_factory::HttpClientFactory;
pub use logging::LogFormat;
pub use secret_masker::SecretMasker;
pub use tracing::{TraceEventType, TraceManager, TraceSetting, Tracing};
