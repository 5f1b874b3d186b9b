pub mod logging;
pub mod poll;

pub use logging::{init_log_file, init_tracing, truncate_text, write_run_report};
pub use poll::{poll_until, wait_or_cancel, PollOutcome};
