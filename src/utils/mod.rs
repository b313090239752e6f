//! Utility modules.

pub mod file;
pub mod retry;

pub use file::{decode_text, has_suffix, normalize_extensions, read_text_lossless};
pub use retry::{RetryOutcome, RetryPolicy, Retryable, with_retry};
