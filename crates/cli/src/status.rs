//! Parser for the threshold block printed by `a14-charge-keeper status`.
//!
//! The tool prints Korean field labels; they are part of its output format
//! and are matched literally:
//!
//! ```text
//! Device : BAT0
//! 충전 종료: 80%
//! 충전 시작: 60%
//! 백업 파일: 3개
//! ```

use keeper_core::{BatteryStatus, KeeperError, Result};
use regex::Regex;
use std::sync::LazyLock;

static DEVICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Device\s*:\s*(.+)$").unwrap());
static END_THRESHOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"충전 종료:\s*(\d+)%").unwrap());
static START_THRESHOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"충전 시작:\s*(\d+)%").unwrap());
static BACKUP_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"백업 파일:\s*(\d+)개").unwrap());

/// Parse raw status output into a [`BatteryStatus`].
///
/// Device and end threshold are required; start threshold and backup count
/// default to `None` and `0`. Each field is taken from the first line that
/// matches it, later duplicates are ignored.
pub fn parse_status(output: &str) -> Result<BatteryStatus> {
    let output = output.trim();
    if output.is_empty() {
        return Err(KeeperError::Parse("Empty or invalid status output".into()));
    }

    let device = output
        .lines()
        .find_map(|line| DEVICE.captures(line.trim()))
        .map(|caps| caps[1].trim().to_string())
        .ok_or_else(|| KeeperError::Parse("Unable to parse device information".into()))?;

    let end_threshold = first_capture(output, &END_THRESHOLD)
        .and_then(parse_percent)
        .ok_or_else(|| KeeperError::Parse("Unable to parse threshold information".into()))?;

    let start_threshold = first_capture(output, &START_THRESHOLD).and_then(parse_percent);
    let backup_count = first_capture(output, &BACKUP_COUNT)
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);

    Ok(BatteryStatus {
        device,
        end_threshold,
        start_threshold,
        backup_count,
    })
}

/// First capture group of the first line `re` matches anywhere in.
pub(crate) fn first_capture<'a>(output: &'a str, re: &Regex) -> Option<&'a str> {
    output
        .lines()
        .find_map(|line| re.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse_percent(raw: &str) -> Option<u8> {
    raw.parse::<u8>().ok().filter(|pct| *pct <= 100)
}
