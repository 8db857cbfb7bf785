use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, TimeDelta};
use tracing::debug;

use super::error::{SampleError, SampleResult};
use super::procfs::{numeric_entries, read_single_line, split_stat_line};
use super::security::SelinuxContext;
use super::users::UserResolver;

/// Pid of the synthetic record every top-level process hangs off.
pub const ROOT_PID: u32 = 0;

const COMMAND_NOT_FOUND: &str = "** command not found **";

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    /// `None` only for the synthetic root.
    pub ppid: Option<u32>,
    pub uid: u32,
    pub owner: String,
    pub state: char,
    pub command: String,
    pub utime: u64,
    pub stime: u64,
    pub cutime: u64,
    pub cstime: u64,
    /// Clock ticks after boot.
    pub start_time: u64,
    /// Bytes.
    pub vsize: u64,
    pub selinux: Option<SelinuxContext>,
}

impl ProcessRecord {
    pub fn root() -> Self {
        Self {
            pid: ROOT_PID,
            ppid: None,
            uid: 0,
            owner: "root".to_string(),
            state: '0',
            command: "Root".to_string(),
            utime: 0,
            stime: 0,
            cutime: 0,
            cstime: 0,
            start_time: 0,
            vsize: 0,
            selinux: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.pid == ROOT_PID
    }

    pub fn state_text(&self) -> String {
        state_description(self.state)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown {}", self.state))
    }

    /// Seconds the process has been alive at `uptime`.
    pub fn running_seconds(&self, uptime: f64, ticks_per_second: u64) -> f64 {
        (uptime - self.start_time as f64 / ticks_per_second.max(1) as f64).max(0.0)
    }

    /// Wall-clock start, given the current time and uptime.
    pub fn started_at(
        &self,
        now: DateTime<Local>,
        uptime: f64,
        ticks_per_second: u64,
    ) -> DateTime<Local> {
        let running = self.running_seconds(uptime, ticks_per_second);
        now - TimeDelta::milliseconds((running * 1000.0) as i64)
    }
}

pub fn state_description(state: char) -> Option<&'static str> {
    Some(match state {
        'R' => "Running",
        'S' => "Sleeping",
        'D' => "Waiting in uninterruptible disk sleep",
        'Z' => "Zombie",
        'T' => "Stopped",
        't' => "Tracing stop",
        'W' => "Paging/Waking",
        'X' | 'x' => "Dead",
        'K' => "Wakekill",
        'P' => "Parked",
        'I' => "Idle",
        '0' => "Process Zero",
        _ => return None,
    })
}

/// All records captured at one instant, keyed by pid, with the children
/// lists derived from the ppid links.
#[derive(Debug, Clone, Default)]
pub struct ProcessSnapshot {
    pub uptime: f64,
    pub records: HashMap<u32, ProcessRecord>,
    children: HashMap<u32, Vec<u32>>,
}

impl ProcessSnapshot {
    /// Adds the synthetic root and links every record to its parent. Fails if
    /// a parent is missing from the listing.
    pub fn build(uptime: f64, records: Vec<ProcessRecord>) -> SampleResult<Self> {
        let mut by_pid: HashMap<u32, ProcessRecord> = HashMap::with_capacity(records.len() + 1);
        by_pid.insert(ROOT_PID, ProcessRecord::root());
        for record in records {
            by_pid.insert(record.pid, record);
        }

        let mut children: HashMap<u32, Vec<u32>> = HashMap::with_capacity(by_pid.len());
        for record in by_pid.values() {
            let Some(ppid) = record.ppid else {
                continue;
            };
            if !by_pid.contains_key(&ppid) {
                return Err(SampleError::OrphanedProcess {
                    pid: record.pid,
                    ppid,
                });
            }
            children.entry(ppid).or_default().push(record.pid);
        }
        for kids in children.values_mut() {
            kids.sort_unstable();
        }

        Ok(Self {
            uptime,
            records: by_pid,
            children,
        })
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessRecord> {
        self.records.get(&pid)
    }

    pub fn root(&self) -> Option<&ProcessRecord> {
        self.records.get(&ROOT_PID)
    }

    /// Children of `pid`, ascending.
    pub fn children(&self, pid: u32) -> &[u32] {
        self.children.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Command lines keyed by `(pid, start_time)`, so a recycled pid never shows
/// a stale command.
#[derive(Debug, Default)]
pub struct CommandCache {
    commands: HashMap<(u32, u64), String>,
}

impl CommandCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_read(&mut self, proc_root: &Path, pid: u32, start_time: u64) -> String {
        self.commands
            .entry((pid, start_time))
            .or_insert_with(|| read_command(proc_root, pid))
            .clone()
    }

    /// Drops entries for processes not in `alive`.
    pub fn retain_alive(&mut self, alive: &HashSet<u32>) {
        self.commands.retain(|(pid, _), _| alive.contains(pid));
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn sanitize_command(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .replace('\0', " ")
        .trim()
        .to_string()
}

fn read_command(proc_root: &Path, pid: u32) -> String {
    let dir = proc_root.join(pid.to_string());
    if let Ok(raw) = fs::read(dir.join("cmdline")) {
        let command = sanitize_command(&raw);
        if !command.is_empty() {
            return command;
        }
    }
    read_single_line(&dir.join("comm"))
        .map(|comm| comm.trim().to_string())
        .filter(|comm| !comm.is_empty())
        .unwrap_or_else(|| COMMAND_NOT_FOUND.to_string())
}

fn parse_uid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|uid| uid.parse().ok())
}

fn field<T: std::str::FromStr>(fields: &[&str], index: usize) -> Option<T> {
    fields.get(index)?.parse().ok()
}

/// Reads one process. `Ok(None)` when it vanished or its files are
/// unparseable.
fn read_process(
    proc_root: &Path,
    pid: u32,
    cache: &mut CommandCache,
    users: &mut UserResolver,
    selinux_enabled: bool,
) -> SampleResult<Option<ProcessRecord>> {
    let dir = proc_root.join(pid.to_string());
    let Ok(status) = fs::read_to_string(dir.join("status")) else {
        return Ok(None);
    };
    let Ok(stat) = fs::read_to_string(dir.join("stat")) else {
        return Ok(None);
    };
    let Some(uid) = parse_uid(&status) else {
        return Ok(None);
    };
    let Some(fields) = split_stat_line(stat.trim_end()) else {
        return Ok(None);
    };

    let Some(parsed) = field::<u32>(&fields, 0) else {
        return Ok(None);
    };
    if parsed != pid {
        return Err(SampleError::PidMismatch {
            requested: pid,
            parsed,
        });
    }

    let parsed_fields = (|| {
        Some((
            fields.get(2)?.chars().next()?,
            field::<u32>(&fields, 3)?,
            field::<u64>(&fields, 13)?,
            field::<u64>(&fields, 14)?,
            field::<u64>(&fields, 15)?,
            field::<u64>(&fields, 16)?,
            field::<u64>(&fields, 21)?,
            field::<u64>(&fields, 22)?,
        ))
    })();
    let Some((state, ppid, utime, stime, cutime, cstime, start_time, vsize)) = parsed_fields
    else {
        debug!(pid, "skipping unparseable stat line");
        return Ok(None);
    };

    Ok(Some(ProcessRecord {
        pid,
        ppid: Some(ppid),
        uid,
        owner: users.name(uid),
        state,
        command: cache.get_or_read(proc_root, pid, start_time),
        utime,
        stime,
        cutime,
        cstime,
        start_time,
        vsize,
        selinux: selinux_enabled.then(|| SelinuxContext::read(proc_root, pid)),
    }))
}

/// Reads every numeric entry of `proc_root`. Processes that exit while being
/// read are skipped.
pub fn sample_processes(
    proc_root: &Path,
    cache: &mut CommandCache,
    users: &mut UserResolver,
    selinux_enabled: bool,
) -> SampleResult<Vec<ProcessRecord>> {
    let pids = numeric_entries(proc_root);
    let mut records = Vec::with_capacity(pids.len());
    for pid in pids {
        if let Some(record) = read_process(proc_root, pid, cache, users, selinux_enabled)? {
            records.push(record);
        }
    }
    let alive: HashSet<u32> = records.iter().map(|r| r.pid).collect();
    cache.retain_alive(&alive);
    Ok(records)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(pid: u32, ppid: u32, command: &str) -> ProcessRecord {
        ProcessRecord {
            pid,
            ppid: Some(ppid),
            uid: 1000,
            owner: "alice".to_string(),
            state: 'S',
            command: command.to_string(),
            utime: 0,
            stime: 0,
            cutime: 0,
            cstime: 0,
            start_time: 0,
            vsize: 0,
            selinux: None,
        }
    }

    #[test]
    fn build_links_children_sorted() {
        let snap = ProcessSnapshot::build(
            10.0,
            vec![
                record(1, 0, "init"),
                record(30, 1, "c"),
                record(2, 1, "a"),
                record(9, 2, "b"),
            ],
        )
        .unwrap();
        assert_eq!(snap.children(ROOT_PID), &[1]);
        assert_eq!(snap.children(1), &[2, 30]);
        assert_eq!(snap.children(2), &[9]);
        assert!(snap.children(9).is_empty());
        assert!(snap.root().unwrap().is_root());
        assert_eq!(snap.len(), 5);
    }

    #[test]
    fn orphan_aborts_build() {
        let err = ProcessSnapshot::build(1.0, vec![record(5, 77, "lost")]).unwrap_err();
        assert!(matches!(
            err,
            SampleError::OrphanedProcess { pid: 5, ppid: 77 }
        ));
    }

    #[test]
    fn state_texts() {
        let mut r = record(1, 0, "x");
        assert_eq!(r.state_text(), "Sleeping");
        r.state = 'Q';
        assert_eq!(r.state_text(), "Unknown Q");
        assert_eq!(ProcessRecord::root().state_text(), "Process Zero");
    }

    #[test]
    fn running_time_uses_clock_ticks() {
        let mut r = record(1, 0, "x");
        r.start_time = 500;
        assert_eq!(r.running_seconds(100.0, 100), 95.0);
        assert_eq!(r.running_seconds(1.0, 100), 0.0);

        let now = Local::now();
        let started = r.started_at(now, 100.0, 100);
        assert_eq!((now - started).num_seconds(), 95);
    }

    #[test]
    fn commands_are_sanitized() {
        assert_eq!(sanitize_command(b"/bin/sh\0-c\0sleep 1\0"), "/bin/sh -c sleep 1");
        assert_eq!(sanitize_command(b""), "");
    }

    #[test]
    fn command_falls_back_to_comm_then_placeholder() {
        let proc_root = tempfile::tempdir().unwrap();
        let dir = proc_root.path().join("12");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("cmdline"), b"").unwrap();
        fs::write(dir.join("comm"), "kworker/0:1\n").unwrap();

        let mut cache = CommandCache::new();
        assert_eq!(cache.get_or_read(proc_root.path(), 12, 5), "kworker/0:1");
        assert_eq!(
            cache.get_or_read(proc_root.path(), 13, 5),
            "** command not found **"
        );

        cache.retain_alive(&HashSet::from([12]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn uid_comes_from_the_real_uid_column() {
        let status = "Name:\tbash\nUid:\t1000\t1000\t1000\t1000\nGid:\t100\n";
        assert_eq!(parse_uid(status), Some(1000));
        assert_eq!(parse_uid("Name: x\n"), None);
    }
}
