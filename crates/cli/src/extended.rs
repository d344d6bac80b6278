//! Extraction of the power-daemon (`upower -i` style) fields that follow the
//! threshold block in the status output.
//!
//! Every field is optional and extracted independently; a missing line or an
//! unparseable number leaves that field `None`.

use crate::status::{first_capture, parse_status};
use keeper_core::{BatteryInfo, Result};
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

macro_rules! pattern {
    ($name:ident, $re:literal) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).unwrap());
    };
}

pattern!(VENDOR, r"vendor:\s*(.+)");
pattern!(MODEL, r"model:\s*(.+)");
pattern!(SERIAL, r"serial:\s*(.+)");
pattern!(STATE, r"state:\s*(.+)");
pattern!(PERCENTAGE, r"percentage:\s*(\d+)%");
pattern!(ENERGY, r"energy:\s*([\d.]+)\s*Wh");
pattern!(ENERGY_FULL, r"energy-full:\s*([\d.]+)\s*Wh");
pattern!(ENERGY_FULL_DESIGN, r"energy-full-design:\s*([\d.]+)\s*Wh");
pattern!(ENERGY_RATE, r"energy-rate:\s*([\d.]+)\s*W");
pattern!(VOLTAGE, r"voltage:\s*([\d.]+)\s*V");
pattern!(CAPACITY, r"capacity:\s*([\d.]+)%");
pattern!(CHARGE_CYCLES, r"charge-cycles:\s*(\S+)");
pattern!(TIME_TO_EMPTY, r"time to empty:\s*(.+)");
pattern!(TIME_TO_FULL, r"time to full:\s*(.+)");

/// Parse the complete status output into a [`BatteryInfo`].
///
/// Fails only when the threshold block itself is unparseable (see
/// [`parse_status`]).
pub fn extract(output: &str) -> Result<BatteryInfo> {
    let status = parse_status(output)?;

    Ok(BatteryInfo {
        vendor: text(output, &VENDOR),
        model: text(output, &MODEL),
        serial: text(output, &SERIAL),

        state: text(output, &STATE),
        percentage: number(output, &PERCENTAGE).filter(|pct: &u8| *pct <= 100),
        energy_current: number(output, &ENERGY),
        energy_full: number(output, &ENERGY_FULL),
        energy_full_design: number(output, &ENERGY_FULL_DESIGN),
        energy_rate: number(output, &ENERGY_RATE),
        voltage: number(output, &VOLTAGE),
        capacity: number(output, &CAPACITY),
        // "N/A" when the firmware doesn't count cycles.
        charge_cycles: number(output, &CHARGE_CYCLES),

        time_to_empty: text(output, &TIME_TO_EMPTY),
        time_to_full: text(output, &TIME_TO_FULL),

        ..BatteryInfo::from(status)
    })
}

/// Parse a captured token, treating anything unparseable as absent.
pub fn parse_optional<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok())
}

fn text(output: &str, re: &Regex) -> Option<String> {
    first_capture(output, re)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number<T: FromStr>(output: &str, re: &Regex) -> Option<T> {
    parse_optional(first_capture(output, re))
}
