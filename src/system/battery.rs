use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::format::format_clock;

use super::procfs::read_single_line;

const DEFAULT_CAPACITY: usize = 64;
const EMPTY_TARGET: f64 = 5.0;
const FULL_TARGET: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BatterySample {
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    /// Percent.
    pub capacity: u8,
    pub status: String,
}

/// x where the line through `(x1, y1)` and `(x2, y2)` reaches `y`. `None` for a
/// flat or vertical line.
pub fn intersect_y(x1: f64, y1: f64, x2: f64, y2: f64, y: f64) -> Option<f64> {
    if x2 == x1 {
        return None;
    }
    let slope = (y2 - y1) / (x2 - x1);
    if slope == 0.0 {
        return None;
    }
    Some(x1 + (y - y1) / slope)
}

/// Recent samples of one battery, used to extrapolate the time left.
///
/// A sample is kept only when the capacity moved; a status change starts
/// over from that sample. The oldest samples fall off past `capacity`.
#[derive(Debug, Clone)]
pub struct BatteryHistory {
    samples: VecDeque<BatterySample>,
    capacity: usize,
    time_remaining: Option<f64>,
}

impl Default for BatteryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BatteryHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            time_remaining: None,
        }
    }

    /// Returns `true` if the sample changed the history.
    pub fn push(&mut self, sample: BatterySample) -> bool {
        match self.samples.back() {
            Some(latest) if latest.status != sample.status => self.samples.clear(),
            Some(latest) if latest.capacity == sample.capacity => return false,
            _ => {}
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.time_remaining = self.extrapolate();
        true
    }

    pub fn latest(&self) -> Option<&BatterySample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Seconds until empty (discharging) or full (charging).
    pub fn time_remaining(&self) -> Option<f64> {
        self.time_remaining
    }

    /// `HH:MM`, or empty when unknown.
    pub fn time_remaining_text(&self) -> String {
        self.time_remaining
            .map(|secs| format_clock(secs, false))
            .unwrap_or_default()
    }

    fn extrapolate(&self) -> Option<f64> {
        if self.samples.len() < 2 {
            return None;
        }
        let first = self.samples.front()?;
        let last = self.samples.back()?;
        let target = match last.status.as_str() {
            "Discharging" | "Not charging" => EMPTY_TARGET,
            "Charging" => FULL_TARGET,
            _ => return None,
        };
        let at = intersect_y(
            first.timestamp,
            f64::from(first.capacity),
            last.timestamp,
            f64::from(last.capacity),
            target,
        )?;
        let remaining = at - last.timestamp;
        (remaining > 0.0).then_some(remaining)
    }
}

/// Names of `<sys>/class/power_supply` entries that report a capacity.
pub fn find_battery_paths(sys_root: &Path) -> Vec<String> {
    let dir = power_supply_dir(sys_root);
    let Ok(entries) = fs::read_dir(&dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().join("capacity").exists())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

/// `None` if the battery disappeared or its capacity is unreadable.
pub fn sample_battery(sys_root: &Path, name: &str, timestamp: f64) -> Option<BatterySample> {
    let dir = power_supply_dir(sys_root).join(name);
    let capacity = read_single_line(&dir.join("capacity"))?.trim().parse().ok()?;
    let status = read_single_line(&dir.join("status")).unwrap_or_else(|| "n/a".to_string());
    Some(BatterySample {
        timestamp,
        capacity,
        status,
    })
}

fn power_supply_dir(sys_root: &Path) -> PathBuf {
    sys_root.join("class").join("power_supply")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, capacity: u8, status: &str) -> BatterySample {
        BatterySample {
            timestamp: t,
            capacity,
            status: status.to_string(),
        }
    }

    #[test]
    fn discharging_extrapolates_to_five_percent() {
        let mut history = BatteryHistory::new(16);
        history.push(sample(0.0, 80, "Discharging"));
        assert_eq!(history.time_remaining(), None);
        history.push(sample(10.0, 70, "Discharging"));
        assert_eq!(history.time_remaining(), Some(65.0));
        assert_eq!(history.time_remaining_text(), "00:01");
    }

    #[test]
    fn charging_extrapolates_to_full() {
        let mut history = BatteryHistory::new(16);
        history.push(sample(0.0, 50, "Charging"));
        history.push(sample(100.0, 60, "Charging"));
        // +0.1 %/s, 40 % to go
        assert_eq!(history.time_remaining(), Some(400.0));
    }

    #[test]
    fn not_charging_counts_as_discharging() {
        let mut history = BatteryHistory::new(16);
        history.push(sample(0.0, 30, "Not charging"));
        history.push(sample(25.0, 25, "Not charging"));
        assert_eq!(history.time_remaining(), Some(100.0));
    }

    #[test]
    fn status_change_resets() {
        let mut history = BatteryHistory::new(16);
        history.push(sample(0.0, 80, "Discharging"));
        history.push(sample(10.0, 70, "Discharging"));
        assert!(history.push(sample(20.0, 70, "Charging")));
        assert_eq!(history.len(), 1);
        assert_eq!(history.time_remaining(), None);
    }

    #[test]
    fn unchanged_capacity_is_ignored() {
        let mut history = BatteryHistory::new(16);
        history.push(sample(0.0, 80, "Discharging"));
        assert!(!history.push(sample(5.0, 80, "Discharging")));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn wrong_direction_or_unknown_status_is_empty() {
        let mut history = BatteryHistory::new(16);
        history.push(sample(0.0, 70, "Discharging"));
        history.push(sample(10.0, 80, "Discharging"));
        // rising while discharging: target lies in the past
        assert_eq!(history.time_remaining(), None);

        let mut full = BatteryHistory::new(16);
        full.push(sample(0.0, 99, "Full"));
        full.push(sample(10.0, 100, "Full"));
        assert_eq!(full.time_remaining_text(), "");
    }

    #[test]
    fn history_is_bounded() {
        let mut history = BatteryHistory::new(3);
        for (i, cap) in [90, 89, 88, 87, 86].into_iter().enumerate() {
            history.push(sample(i as f64 * 10.0, cap, "Discharging"));
        }
        assert_eq!(history.len(), 3);
        // earliest kept is (20, 88), latest (40, 86): -0.1 %/s
        assert_eq!(history.time_remaining(), Some(810.0));
    }

    #[test]
    fn flat_line_has_no_intersection() {
        assert_eq!(intersect_y(0.0, 50.0, 10.0, 50.0, 5.0), None);
        assert_eq!(intersect_y(3.0, 1.0, 3.0, 2.0, 5.0), None);
        assert_eq!(intersect_y(0.0, 80.0, 10.0, 70.0, 5.0), Some(75.0));
    }

    #[test]
    fn batteries_are_found_by_capacity_file() {
        let sys = tempfile::tempdir().unwrap();
        let supply = sys.path().join("class/power_supply");
        fs::create_dir_all(supply.join("BAT0")).unwrap();
        fs::create_dir_all(supply.join("AC")).unwrap();
        fs::write(supply.join("BAT0/capacity"), "57\n").unwrap();
        fs::write(supply.join("BAT0/status"), "Discharging\n").unwrap();

        assert_eq!(find_battery_paths(sys.path()), vec!["BAT0".to_string()]);
        let s = sample_battery(sys.path(), "BAT0", 1.5).unwrap();
        assert_eq!(s.capacity, 57);
        assert_eq!(s.status, "Discharging");
        assert!(sample_battery(sys.path(), "AC", 1.5).is_none());
    }
}
