use super::cpu::CpuSnapshot;
use super::process::ProcessSnapshot;

/// CPU counters and the process table taken in the same tick.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub cpu: CpuSnapshot,
    pub processes: ProcessSnapshot,
}

impl Snapshot {
    pub fn uptime(&self) -> f64 {
        self.cpu.uptime
    }
}
