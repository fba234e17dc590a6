//! Convenience macros for common logging patterns.

/// Log a timed operation (measures and logs duration)
#[macro_export]
macro_rules! log_timed {
    ($name:expr, $block:expr) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(target: "timing", operation = $name, duration_ms = duration_ms, "operation completed");
        result
    }};
}
