/// Advice to callers on whether a failed gateway request is worth retrying.
///
/// The gateway never retries on its own beyond the single fallback hop, so
/// this is purely a hint for the layer above it.
///
/// | Class | Retry? |
/// |-------|--------|
/// | `Never` | No, the same request will fail the same way |
/// | `AfterBackoff` | Yes, once the limiter or upstream quota has recovered |
/// | `Immediately` | Yes, the failure was transient or caller-initiated |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Bad input, unknown provider, or data that will not improve on retry.
    Never,

    /// Rate limit or quota exhaustion. Wait before trying again.
    AfterBackoff,

    /// Network hiccup, timeout, or cancellation.
    Immediately,
}
