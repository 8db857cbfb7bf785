use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::procfs::parse_key_values;

const NOT_AVAILABLE: &str = "n/a";

/// Raw `/proc/meminfo` values such as `"16314188 kB"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemInfo {
    values: HashMap<String, String>,
}

impl MemInfo {
    pub fn parse(text: &str) -> Self {
        Self {
            values: parse_key_values(text, ':'),
        }
    }

    /// The raw value, or `n/a` when the key is absent.
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or(NOT_AVAILABLE)
    }
}

pub fn sample_memory(proc_root: &Path) -> MemInfo {
    MemInfo::parse(&fs::read_to_string(proc_root.join("meminfo")).unwrap_or_default())
}

/// Bytes mapped writable by `pid`, summed over `/proc/<pid>/maps`. Zero when
/// the maps are unreadable.
pub fn rw_mapped_bytes(proc_root: &Path, pid: u32) -> u64 {
    fs::read_to_string(proc_root.join(pid.to_string()).join("maps"))
        .map(|text| sum_rw_regions(&text))
        .unwrap_or(0)
}

fn sum_rw_regions(maps: &str) -> u64 {
    maps.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let range = fields.next()?;
            let perms = fields.next()?;
            if !perms.contains("rw") {
                return None;
            }
            let (low, high) = range.split_once('-')?;
            let low = u64::from_str_radix(low, 16).ok()?;
            let high = u64::from_str_radix(high, 16).ok()?;
            Some(high.saturating_sub(low))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meminfo_lookup_with_sentinel() {
        let info = MemInfo::parse("MemTotal:  100 kB\nMemFree:    40 kB\n");
        assert_eq!(info.get("MemTotal"), "100 kB");
        assert_eq!(info.get("MemAvailable"), "n/a");
    }

    #[test]
    fn only_writable_regions_count() {
        let maps = "\
00400000-00452000 r-xp 00000000 08:02 173521 /usr/bin/dbus-daemon
00651000-00652000 rw-p 00051000 08:02 173521 /usr/bin/dbus-daemon
00e03000-00e24000 rw-p 00000000 00:00 0 [heap]
";
        assert_eq!(sum_rw_regions(maps), 0x1000 + 0x21000);
    }

    #[test]
    fn unreadable_maps_are_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(rw_mapped_bytes(dir.path(), 1), 0);
        assert_eq!(sample_memory(dir.path()).get("MemTotal"), "n/a");
    }
}
