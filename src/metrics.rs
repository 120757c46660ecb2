//! Pluggable metrics for registry checks and queries.
//!
//! Only compiled with the `observability` feature. The library never talks
//! to a metrics backend directly; install a [`MetricsSink`] once at startup
//! and forward the stats wherever they need to go.
//!
//! ```ignore
//! use rulegate_core::metrics::{CheckStats, MetricsSink, QueryStats};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! struct Denials(AtomicU64);
//!
//! impl MetricsSink for Denials {
//!     fn on_check(&self, stats: &CheckStats) {
//!         if !stats.allowed {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn on_query(&self, _stats: &QueryStats) {}
//! }
//!
//! rulegate_core::metrics::set_sink(Arc::new(Denials(AtomicU64::new(0))));
//! ```

use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::warn;

use crate::error::RuleError;
use crate::types::Predicate;

/// One `PermissionRegistry::check` call.
#[derive(Debug, Clone, Serialize)]
pub struct CheckStats {
    pub permission: String,
    /// `false` also when the rule failed.
    pub allowed: bool,
    pub failed: bool,
    pub duration: Duration,
}

/// One `PermissionRegistry::query` call.
#[derive(Debug, Clone, Serialize)]
pub struct QueryStats {
    pub permission: String,
    /// The predicate kind (`universal`, `empty`, `eq`, `in`, `related`,
    /// `and`, `or`, `not`), or `error` when the rule failed.
    pub outcome: &'static str,
    pub duration: Duration,
}

/// Receives stats from the registry. Called synchronously on the request
/// path, so implementations must not block.
pub trait MetricsSink: Send + Sync {
    fn on_check(&self, stats: &CheckStats);

    fn on_query(&self, stats: &QueryStats);
}

static SINK: OnceLock<Arc<dyn MetricsSink>> = OnceLock::new();

/// Install the global sink. Only the first call takes effect; events
/// recorded before it are dropped.
pub fn set_sink(sink: Arc<dyn MetricsSink>) {
    if SINK.set(sink).is_err() {
        warn!(
            event = "Metrics",
            phase = "SetSink",
            "Metrics sink was already initialized, ignoring set_sink"
        );
    }
}

pub(crate) fn record_check(
    permission: &str,
    result: &Result<bool, RuleError>,
    duration: Duration,
) {
    let Some(sink) = SINK.get() else {
        return;
    };
    sink.on_check(&CheckStats {
        permission: permission.to_string(),
        allowed: matches!(result, Ok(true)),
        failed: result.is_err(),
        duration,
    });
}

pub(crate) fn record_query(
    permission: &str,
    result: &Result<Predicate, RuleError>,
    duration: Duration,
) {
    let Some(sink) = SINK.get() else {
        return;
    };
    sink.on_query(&QueryStats {
        permission: permission.to_string(),
        outcome: match result {
            Ok(predicate) => predicate.into(),
            Err(_) => "error",
        },
        duration,
    });
}
