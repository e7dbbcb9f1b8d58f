//! Source section
//!
//! Batch sizing and pull timing.

use std::time::Duration;

use serde::Deserialize;

/// Source configuration
///
/// # Example
///
/// ```toml
/// [source]
/// max_event_size = 262144
/// batch_size = 128
/// event_timeout = "30ms"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Maximum serialized size of one event in bytes; larger events are dropped
    /// Default: 262144 (256KB)
    pub max_event_size: usize,

    /// Events per batch
    /// Default: 128
    pub batch_size: usize,

    /// Maximum wait of one pull before returning a partial batch
    /// Default: 30ms
    #[serde(with = "humantime_serde")]
    pub event_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            max_event_size: 256 * 1024,
            batch_size: 128,
            event_timeout: Duration::from_millis(30),
        }
    }
}
