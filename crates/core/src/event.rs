use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A battery state transition detected by the manager.
///
/// Serializes as `{"event_type": …, "data": {…}, "timestamp": …}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    #[serde(with = "epoch_seconds")]
    pub timestamp: DateTime<Utc>,
}

/// `DateTime<Utc>` as fractional seconds since the Unix epoch.
mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(at.timestamp_micros() as f64 / 1_000_000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let secs = f64::deserialize(d)?;
        if !secs.is_finite() {
            return Err(de::Error::custom(format!("invalid timestamp: {secs}")));
        }
        DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {secs}")))
    }
}

/// Every transition the manager publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    /// The end threshold differs between two consecutive refreshes.
    ThresholdChanged { old_threshold: u8, new_threshold: u8 },
}

impl BatteryEvent {
    /// Stamp `kind` with the current time.
    pub fn now(kind: EventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self.kind {
            EventKind::ThresholdChanged { .. } => "threshold_changed",
        }
    }

    /// Seconds since the Unix epoch.
    pub fn timestamp(&self) -> f64 {
        self.timestamp.timestamp_micros() as f64 / 1_000_000.0
    }
}

impl std::fmt::Display for BatteryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            EventKind::ThresholdChanged {
                old_threshold,
                new_threshold,
            } => write!(f, "threshold_changed: {old_threshold}% -> {new_threshold}%"),
        }
    }
}
