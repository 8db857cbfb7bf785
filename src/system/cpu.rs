use std::fs;
use std::path::Path;

/// Cumulative tick counters from one `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounterSet {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuCounterSet {
    /// Parses the numeric fields following the `cpu`/`cpuN` label. Missing
    /// trailing fields (older kernels) read as zero.
    pub fn parse(fields: &str) -> Option<Self> {
        let mut values = [0u64; 10];
        for (slot, raw) in values.iter_mut().zip(fields.split_whitespace()) {
            *slot = raw.parse().ok()?;
        }
        let [
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        ] = values;
        Some(Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        })
    }

    /// Ticks since boot. Guest time is already included in user/nice.
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    pub fn idle_total(&self) -> u64 {
        self.idle + self.iowait
    }

    pub fn usage(&self) -> u64 {
        self.total().saturating_sub(self.idle_total())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuSnapshot {
    /// Seconds since boot.
    pub uptime: f64,
    pub total: CpuCounterSet,
    pub cores: Vec<CpuCounterSet>,
}

impl CpuSnapshot {
    pub fn parse(uptime_text: &str, stat_text: &str) -> Self {
        let uptime = uptime_text
            .split_whitespace()
            .next()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);

        let mut snapshot = CpuSnapshot {
            uptime,
            ..Default::default()
        };
        for line in stat_text.lines() {
            let Some((label, rest)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            if label == "cpu" {
                if let Some(counters) = CpuCounterSet::parse(rest) {
                    snapshot.total = counters;
                }
            } else if label.starts_with("cpu")
                && label[3..].bytes().all(|b| b.is_ascii_digit())
                && let Some(counters) = CpuCounterSet::parse(rest)
            {
                snapshot.cores.push(counters);
            }
        }
        snapshot
    }
}

/// Reads `<proc>/uptime` and `<proc>/stat`. Missing files give empty counters.
pub fn sample_cpu(proc_root: &Path) -> CpuSnapshot {
    let uptime = fs::read_to_string(proc_root.join("uptime")).unwrap_or_default();
    let stat = fs::read_to_string(proc_root.join("stat")).unwrap_or_default();
    CpuSnapshot::parse(&uptime, &stat)
}
