// runner-sdk: Foundation layer for the runner bootstrap.
// No dependencies on other workspace crates: process invocation, trace
// abstraction, URL and string helpers, build constants.

pub mod build_constants;
pub mod process_invoker;
pub mod string_util;
pub mod trace;
pub mod url_util;

// Re-export commonly used items at crate root
pub use build_constants::{RunnerPackage, Source};
pub use process_invoker::{
    OutputStream, ProcessCancelledError, ProcessInvoker, ProcessOutputLine,
};
pub use string_util::StringUtil;
pub use trace::TraceWriter;
pub use url_util::UrlUtil;
