use crate::error::{KeeperError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest charge threshold the tool accepts (percent).
pub const THRESHOLD_MIN: u8 = 20;
/// Highest charge threshold; `100` means charging is unlimited.
pub const THRESHOLD_MAX: u8 = 100;

/// Check that `value` is a threshold the external tool will accept.
pub fn validate_threshold(value: i64) -> Result<u8> {
    if (i64::from(THRESHOLD_MIN)..=i64::from(THRESHOLD_MAX)).contains(&value) {
        // Range check above guarantees the value fits.
        Ok(value as u8)
    } else {
        Err(KeeperError::Validation(format!(
            "Threshold must be between {THRESHOLD_MIN} and {THRESHOLD_MAX}"
        )))
    }
}

/// Minimal status reported by `a14-charge-keeper status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Battery device name, e.g. `"BAT0"`.
    pub device: String,
    /// Charge level (0–100) at which charging stops.
    pub end_threshold: u8,
    /// Charge level at which charging resumes, when the firmware supports it.
    pub start_threshold: Option<u8>,
    /// Number of configuration backups the tool keeps.
    pub backup_count: u32,
}

/// Full battery record: threshold status plus hardware, power and timing
/// details taken from the power-daemon section of the status output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatteryInfo {
    // ── Threshold status ──────────────────────────────────────────────────────
    pub device: String,
    pub end_threshold: u8,
    pub start_threshold: Option<u8>,
    pub backup_count: u32,

    // ── Hardware ──────────────────────────────────────────────────────────────
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,

    // ── Power ─────────────────────────────────────────────────────────────────
    /// Raw state text, e.g. `"charging"` or `"not charging"`.
    pub state: Option<String>,
    pub percentage: Option<u8>,
    /// Current energy in Wh.
    pub energy_current: Option<f64>,
    /// Last full-charge energy in Wh.
    pub energy_full: Option<f64>,
    /// Design energy in Wh.
    pub energy_full_design: Option<f64>,
    /// Charge/discharge rate in W.
    pub energy_rate: Option<f64>,
    /// Voltage in V.
    pub voltage: Option<f64>,
    /// Capacity reported by the power daemon, in percent.
    pub capacity: Option<f64>,
    pub charge_cycles: Option<u32>,

    // ── Time estimates ────────────────────────────────────────────────────────
    pub time_to_empty: Option<String>,
    pub time_to_full: Option<String>,
}

impl From<BatteryStatus> for BatteryInfo {
    fn from(status: BatteryStatus) -> Self {
        Self {
            device: status.device,
            end_threshold: status.end_threshold,
            start_threshold: status.start_threshold,
            backup_count: status.backup_count,
            ..Self::default()
        }
    }
}

impl BatteryInfo {
    /// Full-charge energy as a percentage of design energy.
    ///
    /// `None` unless both energies are present and non-zero.
    #[must_use]
    pub fn health_percentage(&self) -> Option<f64> {
        match (self.energy_full, self.energy_full_design) {
            (Some(full), Some(design)) if full != 0.0 && design != 0.0 => {
                Some(full / design * 100.0)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn power_state(&self) -> Option<PowerState> {
        self.state.as_deref().map(PowerState::parse)
    }

    /// `true` when charging stops below 100%.
    #[must_use]
    pub fn is_threshold_limited(&self) -> bool {
        self.end_threshold < THRESHOLD_MAX
    }

    /// One-line summary suitable for a tray tooltip.
    pub fn summary(&self) -> String {
        let mut parts = vec!["A14 Charge Keeper".to_string()];
        if let Some(pct) = self.percentage {
            parts.push(format!("Battery: {pct}%"));
        }
        if let Some(state) = self.power_state() {
            parts.push(format!("State: {}", state.label()));
        }
        if self.is_threshold_limited() {
            parts.push(format!("Limit: {}%", self.end_threshold));
        }
        parts.join(" | ")
    }
}

impl fmt::Display for BatteryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (threshold {}%", self.device, self.end_threshold)?;
        if let Some(state) = &self.state {
            write!(f, ", {state}")?;
        }
        f.write_str(")")
    }
}

/// Charging state as reported by the power daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerState {
    Charging,
    Discharging,
    NotCharging,
    Full,
    Unknown,
    /// Any state text we don't recognise, kept verbatim.
    Other(String),
}

impl PowerState {
    /// Parse the free-text state (case-insensitive).
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "charging" => Self::Charging,
            "discharging" => Self::Discharging,
            "not charging" => Self::NotCharging,
            "full" | "fully-charged" => Self::Full,
            "unknown" => Self::Unknown,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Charging => "Charging",
            Self::Discharging => "Discharging",
            Self::NotCharging => "Not Charging",
            Self::Full => "Full",
            Self::Unknown => "Unknown",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn is_charging(&self) -> bool {
        matches!(self, Self::Charging)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> BatteryInfo {
        BatteryInfo {
            device: "BAT0".into(),
            end_threshold: 70,
            ..BatteryInfo::default()
        }
    }

    #[test]
    fn threshold_bounds() {
        assert!(validate_threshold(19).is_err());
        assert!(validate_threshold(101).is_err());
        assert_eq!(validate_threshold(20).unwrap(), 20);
        assert_eq!(validate_threshold(100).unwrap(), 100);
    }

    #[test]
    fn threshold_error_message() {
        let err = validate_threshold(5).unwrap_err();
        assert_eq!(err.to_string(), "Threshold must be between 20 and 100");
    }

    #[test]
    fn health_needs_both_energies() {
        let mut b = info();
        assert_eq!(b.health_percentage(), None);

        b.energy_full = Some(68.0);
        assert_eq!(b.health_percentage(), None);

        b.energy_full_design = Some(0.0);
        assert_eq!(b.health_percentage(), None);

        b.energy_full_design = Some(80.0);
        assert_eq!(b.health_percentage(), Some(85.0));
    }

    #[test]
    fn lift_status_into_info() {
        let status = BatteryStatus {
            device: "BAT1".into(),
            end_threshold: 80,
            start_threshold: Some(60),
            backup_count: 2,
        };
        let b = BatteryInfo::from(status);
        assert_eq!(b.device, "BAT1");
        assert_eq!(b.start_threshold, Some(60));
        assert_eq!(b.backup_count, 2);
        assert!(b.vendor.is_none() && b.percentage.is_none());
    }

    #[test]
    fn power_state_parsing() {
        assert_eq!(PowerState::parse("Charging"), PowerState::Charging);
        assert_eq!(PowerState::parse("not charging"), PowerState::NotCharging);
        assert_eq!(
            PowerState::parse("pending-charge"),
            PowerState::Other("pending-charge".into())
        );
        assert_eq!(PowerState::parse("pending-charge").label(), "pending-charge");
    }

    #[test]
    fn summary_omits_absent_parts() {
        let mut b = info();
        assert_eq!(b.summary(), "A14 Charge Keeper | Limit: 70%");

        b.percentage = Some(66);
        b.state = Some("discharging".into());
        b.end_threshold = 100;
        assert_eq!(b.summary(), "A14 Charge Keeper | Battery: 66% | State: Discharging");
    }
}
