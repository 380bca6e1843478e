use serde::{Deserialize, Serialize};

/// A usage fraction in `[0, 1]`.
///
/// Stats collection is best-effort: a percentage field the backend emitted
/// in a form we cannot parse becomes `0.0` with `valid` cleared, so callers
/// can still tell "truly zero" from "unparseable" without the whole sample
/// failing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub fraction: f64,
    pub valid: bool,
}

impl Metric {
    /// A successfully parsed fraction. Negative inputs clamp to zero.
    pub fn measured(fraction: f64) -> Self {
        Self {
            fraction: fraction.max(0.0),
            valid: true,
        }
    }

    /// The zero default for a field that failed numeric parsing.
    pub fn missing() -> Self {
        Self {
            fraction: 0.0,
            valid: false,
        }
    }
}

/// Inbound/outbound byte counts.
///
/// Serializes with exactly the keys `"in"` and `"out"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IoBytes {
    #[serde(rename = "in")]
    pub inbound: f64,
    #[serde(rename = "out")]
    pub outbound: f64,
}

impl IoBytes {
    pub fn new(inbound: f64, outbound: f64) -> Self {
        Self { inbound, outbound }
    }

    pub fn zero() -> Self {
        Self {
            inbound: 0.0,
            outbound: 0.0,
        }
    }
}

/// Resource statistics for one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub container_id: String,
    pub container_name: String,
    pub cpu_usage: Metric,
    pub memory_usage: Metric,
    pub disk_io: IoBytes,
    pub memory_io: IoBytes,
    pub network_io: IoBytes,
}

impl Stats {
    pub fn new(container_id: impl Into<String>, container_name: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            container_name: container_name.into(),
            cpu_usage: Metric::missing(),
            memory_usage: Metric::missing(),
            disk_io: IoBytes::zero(),
            memory_io: IoBytes::zero(),
            network_io: IoBytes::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_clamps_negative() {
        let metric = Metric::measured(-0.2);
        assert_eq!(metric.fraction, 0.0);
        assert!(metric.valid);
    }

    #[test]
    fn test_io_bytes_serializes_in_out_keys() {
        let io = IoBytes::new(12.0, 34.0);
        let json = serde_json::to_value(&io).unwrap();
        assert_eq!(json["in"], 12.0);
        assert_eq!(json["out"], 34.0);
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn test_round_trip() {
        let mut stats = Stats::new("abc123", "web");
        stats.cpu_usage = Metric::measured(0.45);
        stats.memory_usage = Metric::measured(0.1);
        stats.disk_io = IoBytes::new(1.0, 2.0);
        stats.memory_io = IoBytes::new(3.0, 4.0);
        stats.network_io = IoBytes::new(5.0, 6.0);

        let json = serde_json::to_string(&stats).unwrap();
        let restored: Stats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, restored);
    }
}
