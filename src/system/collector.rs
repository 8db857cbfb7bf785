use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::debug;

use super::battery::{BatteryHistory, find_battery_paths, sample_battery};
use super::cpu::sample_cpu;
use super::delta::{Delta, clock_ticks};
use super::error::{SampleError, SampleResult};
use super::memory::{MemInfo, sample_memory};
use super::process::{CommandCache, ProcessSnapshot, sample_processes};
use super::security::{AppArmorStatus, SelinuxStatus};
use super::snapshot::Snapshot;
use super::thermal::{ThermalZone, sample_thermal};
use super::users::UserResolver;

#[derive(Debug, Clone)]
pub struct SamplerPaths {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
}

impl Default for SamplerPaths {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
        }
    }
}

/// Whether the SELinux status is asked from `sestatus` or fixed.
#[derive(Debug, Clone)]
pub enum SelinuxSource {
    Command,
    Fixed(SelinuxStatus),
}

/// A battery found at startup and its recent samples.
#[derive(Debug, Clone)]
pub struct Battery {
    pub name: String,
    pub history: BatteryHistory,
}

/// Owns every sampler cache and the two most recent snapshots.
pub struct Collector {
    paths: SamplerPaths,
    commands: CommandCache,
    users: UserResolver,
    selinux_source: SelinuxSource,
    ticks_per_second: u64,
    previous: Snapshot,
    current: Snapshot,
    memory: MemInfo,
    thermal: Vec<ThermalZone>,
    batteries: Vec<Battery>,
    selinux: SelinuxStatus,
    apparmor: Option<AppArmorStatus>,
}

impl Collector {
    pub fn new(paths: SamplerPaths, battery_history: usize) -> SampleResult<Self> {
        Self::with_sources(
            paths,
            UserResolver::new(),
            SelinuxSource::Command,
            battery_history,
        )
    }

    /// Takes the first snapshot, so the first delta covers the first tick.
    pub fn with_sources(
        paths: SamplerPaths,
        users: UserResolver,
        selinux_source: SelinuxSource,
        battery_history: usize,
    ) -> SampleResult<Self> {
        // Without a readable proc root there is nothing to show.
        std::fs::read_dir(&paths.proc_root).map_err(|source| SampleError::Io {
            path: paths.proc_root.clone(),
            source,
        })?;
        let batteries = find_battery_paths(&paths.sys_root)
            .into_iter()
            .map(|name| Battery {
                name,
                history: BatteryHistory::new(battery_history),
            })
            .collect();
        let apparmor = AppArmorStatus::module_loaded(&paths.sys_root)
            .then(|| AppArmorStatus::load(&paths.sys_root, &paths.proc_root));

        let mut collector = Collector {
            paths,
            commands: CommandCache::new(),
            users,
            selinux_source,
            ticks_per_second: clock_ticks(),
            previous: Snapshot::default(),
            current: Snapshot::default(),
            memory: MemInfo::default(),
            thermal: Vec::new(),
            batteries,
            selinux: SelinuxStatus::default(),
            apparmor,
        };
        collector.refresh()?;
        collector.previous = collector.current.clone();
        Ok(collector)
    }

    /// Samples everything once. On error the previous state is kept.
    pub fn refresh(&mut self) -> SampleResult<()> {
        let started = Instant::now();

        self.selinux = match &self.selinux_source {
            SelinuxSource::Command => SelinuxStatus::load(),
            SelinuxSource::Fixed(status) => status.clone(),
        };
        let cpu = sample_cpu(&self.paths.proc_root);
        let records = sample_processes(
            &self.paths.proc_root,
            &mut self.commands,
            &mut self.users,
            self.selinux.enabled(),
        )?;
        let processes = ProcessSnapshot::build(cpu.uptime, records)?;
        let snapshot = Snapshot { cpu, processes };
        self.previous = std::mem::replace(&mut self.current, snapshot);

        self.memory = sample_memory(&self.paths.proc_root);
        self.thermal = sample_thermal(&self.paths.sys_root);
        let now = Utc::now().timestamp_millis() as f64 / 1000.0;
        for battery in &mut self.batteries {
            if let Some(sample) = sample_battery(&self.paths.sys_root, &battery.name, now) {
                battery.history.push(sample);
            }
        }

        debug!(
            processes = self.current.processes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sampled"
        );
        Ok(())
    }

    pub fn delta(&self) -> Delta<'_> {
        Delta {
            cpu_before: &self.previous.cpu,
            cpu_after: &self.current.cpu,
            before: &self.previous.processes,
            after: &self.current.processes,
            ticks_per_second: self.ticks_per_second,
        }
    }

    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }

    pub fn memory(&self) -> &MemInfo {
        &self.memory
    }

    pub fn thermal(&self) -> &[ThermalZone] {
        &self.thermal
    }

    pub fn batteries(&self) -> &[Battery] {
        &self.batteries
    }

    pub fn selinux(&self) -> &SelinuxStatus {
        &self.selinux
    }

    pub fn apparmor(&self) -> Option<&AppArmorStatus> {
        self.apparmor.as_ref()
    }

    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }

    pub fn proc_root(&self) -> &Path {
        &self.paths.proc_root
    }

    pub fn command_cache_len(&self) -> usize {
        self.commands.len()
    }
}
