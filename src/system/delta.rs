use tracing::warn;

use super::cpu::{CpuCounterSet, CpuSnapshot};
use super::process::ProcessSnapshot;

const DEFAULT_CLOCK_TICKS: u64 = 100;

/// `sysconf(_SC_CLK_TCK)`, falling back to 100.
pub fn clock_ticks() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads a constant.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as u64
    } else {
        DEFAULT_CLOCK_TICKS
    }
}

fn usage_pct(before: &CpuCounterSet, after: &CpuCounterSet) -> f64 {
    let total = after.total() as f64 - before.total() as f64;
    if total <= 0.0 {
        return 0.0;
    }
    let usage = after.usage() as f64 - before.usage() as f64;
    100.0 * usage / total
}

pub fn cpu_total_pct(before: &CpuSnapshot, after: &CpuSnapshot) -> f64 {
    usage_pct(&before.total, &after.total)
}

/// Per-core usage over the cores present in both snapshots.
pub fn cpu_core_pct(before: &CpuSnapshot, after: &CpuSnapshot) -> Vec<f64> {
    if before.cores.len() != after.cores.len() {
        warn!(
            before = before.cores.len(),
            after = after.cores.len(),
            "core count changed between samples"
        );
    }
    before
        .cores
        .iter()
        .zip(&after.cores)
        .map(|(b, a)| usage_pct(b, a))
        .collect()
}

/// CPU share of one process between two snapshots. Zero when the process is
/// missing from either side or no time has passed.
pub fn process_cpu_pct(
    pid: u32,
    before: &ProcessSnapshot,
    after: &ProcessSnapshot,
    ticks_per_second: u64,
) -> f64 {
    let (Some(b), Some(a)) = (before.get(pid), after.get(pid)) else {
        return 0.0;
    };
    let elapsed = after.uptime - before.uptime;
    if elapsed <= 0.0 {
        return 0.0;
    }
    let ticks = (a.utime + a.stime) as f64 - (b.utime + b.stime) as f64;
    100.0 * (ticks / ticks_per_second.max(1) as f64) / elapsed
}

/// Tick differences of one process's CPU time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessTimes {
    pub utime: i64,
    pub stime: i64,
    pub cutime: i64,
    pub cstime: i64,
}

pub fn process_times(
    pid: u32,
    before: &ProcessSnapshot,
    after: &ProcessSnapshot,
) -> Option<ProcessTimes> {
    let b = before.get(pid)?;
    let a = after.get(pid)?;
    let diff = |x: u64, y: u64| x as i64 - y as i64;
    Some(ProcessTimes {
        utime: diff(a.utime, b.utime),
        stime: diff(a.stime, b.stime),
        cutime: diff(a.cutime, b.cutime),
        cstime: diff(a.cstime, b.cstime),
    })
}

/// Read-only view over two consecutive samples.
#[derive(Debug, Clone, Copy)]
pub struct Delta<'a> {
    pub cpu_before: &'a CpuSnapshot,
    pub cpu_after: &'a CpuSnapshot,
    pub before: &'a ProcessSnapshot,
    pub after: &'a ProcessSnapshot,
    pub ticks_per_second: u64,
}

impl Delta<'_> {
    pub fn cpu_total(&self) -> f64 {
        cpu_total_pct(self.cpu_before, self.cpu_after)
    }

    pub fn cpu_cores(&self) -> Vec<f64> {
        cpu_core_pct(self.cpu_before, self.cpu_after)
    }

    pub fn process_cpu(&self, pid: u32) -> f64 {
        process_cpu_pct(pid, self.before, self.after, self.ticks_per_second)
    }

    pub fn process_times(&self, pid: u32) -> Option<ProcessTimes> {
        process_times(pid, self.before, self.after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::process::tests::record;

    fn cpu(total: &str, cores: &[&str]) -> CpuSnapshot {
        let mut stat = format!("cpu  {total}\n");
        for (i, c) in cores.iter().enumerate() {
            stat.push_str(&format!("cpu{i} {c}\n"));
        }
        CpuSnapshot::parse("1.0", &stat)
    }

    #[test]
    fn identical_counters_are_idle() {
        let s = cpu("10 0 10 80 0 0 0 0 0 0", &["5 0 5 40 0 0 0 0 0 0"; 2]);
        assert_eq!(cpu_total_pct(&s, &s), 0.0);
        assert_eq!(cpu_core_pct(&s, &s), vec![0.0, 0.0]);
    }

    #[test]
    fn usage_over_total() {
        let a = cpu("10 0 10 80 0 0 0 0 0 0", &[]);
        let b = cpu("40 0 20 130 10 0 0 0 0 0", &[]);
        // usage 20 -> 60, total 100 -> 200
        assert_eq!(cpu_total_pct(&a, &b), 40.0);
    }

    #[test]
    fn core_mismatch_uses_shorter_list() {
        let a = cpu("0 0 0 0 0 0 0 0 0 0", &["0 0 0 0 0 0 0 0 0 0"; 3]);
        let b = cpu("0 0 0 0 0 0 0 0 0 0", &["50 0 0 50 0 0 0 0 0 0"; 2]);
        assert_eq!(cpu_core_pct(&a, &b), vec![50.0, 50.0]);
    }

    fn procs(uptime: f64, utime: u64, stime: u64) -> ProcessSnapshot {
        let mut r = record(7, 0, "worker");
        r.utime = utime;
        r.stime = stime;
        ProcessSnapshot::build(uptime, vec![r]).unwrap()
    }

    #[test]
    fn process_share_of_elapsed_time() {
        let before = procs(100.0, 100, 50);
        let after = procs(102.0, 200, 50);
        // 100 ticks = 1s over 2s
        assert_eq!(process_cpu_pct(7, &before, &after, 100), 50.0);
    }

    #[test]
    fn missing_or_no_elapsed_is_zero() {
        let before = procs(100.0, 0, 0);
        let after = procs(100.0, 500, 0);
        assert_eq!(process_cpu_pct(7, &before, &after, 100), 0.0);
        assert_eq!(process_cpu_pct(99, &before, &procs(200.0, 0, 0), 100), 0.0);
    }

    #[test]
    fn times_are_signed_differences() {
        let before = procs(1.0, 10, 20);
        let after = procs(2.0, 15, 18);
        let delta = Delta {
            cpu_before: &CpuSnapshot::default(),
            cpu_after: &CpuSnapshot::default(),
            before: &before,
            after: &after,
            ticks_per_second: 100,
        };
        let times = delta.process_times(7).unwrap();
        assert_eq!((times.utime, times.stime), (5, -2));
        assert!(delta.process_times(8).is_none());
        assert_eq!(delta.cpu_total(), 0.0);
    }

    #[test]
    fn clock_ticks_are_positive() {
        assert!(clock_ticks() > 0);
    }
}
