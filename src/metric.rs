//! Metric identity: legacy metric names to `(name, data type)` descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between the metric name and its data type in legacy names,
/// e.g. `"system.cpu.utilization - Gauge"`.
pub const LEGACY_SEPARATOR: &str = " - ";

/// Metric data types known to the tag lookup service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricDataType {
    Gauge,
    Sum,
    Histogram,
    Summary,
    ExponentialHistogram,
}

impl fmt::Display for MetricDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricDataType::Gauge => write!(f, "Gauge"),
            MetricDataType::Sum => write!(f, "Sum"),
            MetricDataType::Histogram => write!(f, "Histogram"),
            MetricDataType::Summary => write!(f, "Summary"),
            MetricDataType::ExponentialHistogram => write!(f, "ExponentialHistogram"),
        }
    }
}

impl FromStr for MetricDataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Gauge" => Ok(MetricDataType::Gauge),
            "Sum" => Ok(MetricDataType::Sum),
            "Histogram" => Ok(MetricDataType::Histogram),
            "Summary" => Ok(MetricDataType::Summary),
            "ExponentialHistogram" => Ok(MetricDataType::ExponentialHistogram),
            other => Err(format!("unknown metric data type: {other}")),
        }
    }
}

/// Canonical metric identity sent to the tag lookup service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: Option<MetricDataType>,
}

/// Split a legacy metric name into its descriptor.
///
/// Malformed input is passed through rather than rejected: a missing or
/// unrecognised data type yields `None`, and the name is whatever precedes
/// the first separator.
pub fn normalize_metric_name(raw: &str) -> MetricDescriptor {
    let mut parts = raw.split(LEGACY_SEPARATOR);
    let name = parts.next().unwrap_or_default().to_string();
    let data_type = parts.next().and_then(|dt| match dt.parse() {
        Ok(data_type) => Some(data_type),
        Err(e) => {
            tracing::debug!(metric = raw, error = %e, "passing through metric without data type");
            None
        }
    });
    MetricDescriptor { name, data_type }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_legacy_name() {
        let d = normalize_metric_name("system.cpu.utilization - Gauge");
        assert_eq!(d.name, "system.cpu.utilization");
        assert_eq!(d.data_type, Some(MetricDataType::Gauge));
    }

    #[test]
    fn test_normalize_without_type() {
        let d = normalize_metric_name("http.requests");
        assert_eq!(d.name, "http.requests");
        assert_eq!(d.data_type, None);
    }

    #[test]
    fn test_normalize_unknown_type() {
        let d = normalize_metric_name("queue.depth - Counter");
        assert_eq!(d.name, "queue.depth");
        assert_eq!(d.data_type, None);
    }

    #[test]
    fn test_data_type_display_roundtrips_through_from_str() {
        for dt in [
            MetricDataType::Gauge,
            MetricDataType::Sum,
            MetricDataType::Histogram,
            MetricDataType::Summary,
            MetricDataType::ExponentialHistogram,
        ] {
            assert_eq!(dt.to_string().parse::<MetricDataType>().unwrap(), dt);
        }
    }

    #[test]
    fn test_descriptor_wire_shape() {
        let d = normalize_metric_name("db.latency - Histogram");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["name"], "db.latency");
        assert_eq!(json["dataType"], "Histogram");
    }
}
