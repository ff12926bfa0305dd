use serde::{Deserialize, Serialize};

/// One line of `coverage/show` output.
///
/// Rates are per-second averages over the trailing window.
///
/// # Example line
///
/// ```text
/// txn_success   0.0/sec     0.017/sec        0.0044/sec   total: 16
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageCounter {
    pub avg_5s: f64,
    pub avg_1m: f64,
    pub avg_1h: f64,
    pub total: u64,
}
