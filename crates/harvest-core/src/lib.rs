//! Harvest Core - Common infrastructure for the literature harvester
//!
//! Blocking HTTP access over a shared runtime, logging that cooperates
//! with progress lines, and an atomic Parquet sink.

pub mod http;
pub mod logging;
pub mod progress;
pub mod sink;

// Re-exports for convenience
pub use http::{FetchError, SHARED_RUNTIME, get_text, http_client};
pub use logging::{ProgressLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use sink::{ParquetSink, is_valid_parquet, remove_stale_tmp, tmp_path_for};
