/// Diagnostic sink used by the SDK-level helpers.
///
/// Higher layers hand in a writer that already knows its component name and
/// masks secrets; the SDK itself only ever calls these methods.
pub trait TraceWriter: Send + Sync {
    /// Log an informational message.
    fn info(&self, message: &str);

    /// Log a verbose / debug message.
    fn verbose(&self, message: &str);

    /// Log a warning message.
    fn warning(&self, message: &str) {
        self.info(&format!("[warning] {message}"));
    }

    /// Log an error message.
    fn error(&self, message: &str) {
        self.info(&format!("[error] {message}"));
    }

    /// Log an error followed by each of its causes, one line per cause.
    fn error_err(&self, err: &dyn std::error::Error) {
        self.error(&err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            self.error(&format!("  caused by: {cause}"));
            source = cause.source();
        }
    }
}
