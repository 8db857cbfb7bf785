use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use super::procfs::{parse_key_values, read_single_line};

const NOT_AVAILABLE: &str = "n/a";

/// Output of `sestatus`, or `n/a` everywhere when it cannot be run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelinuxStatus {
    pub status: String,
    pub policy: String,
    pub mode: String,
    pub mls: String,
}

impl Default for SelinuxStatus {
    fn default() -> Self {
        Self::parse("")
    }
}

impl SelinuxStatus {
    pub fn load() -> Self {
        match Command::new("sestatus").output() {
            Ok(output) if output.status.success() => {
                Self::parse(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                warn!(status = ?output.status, "sestatus failed");
                Self::default()
            }
            Err(_) => Self::default(),
        }
    }

    pub fn parse(text: &str) -> Self {
        let values = parse_key_values(text, ':');
        let get = |key: &str| {
            values
                .get(key)
                .cloned()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        Self {
            status: get("SELinux status"),
            policy: get("Loaded policy name"),
            mode: get("Current mode"),
            mls: get("Policy MLS status"),
        }
    }

    pub fn enabled(&self) -> bool {
        self.status == "enabled"
    }
}

/// Security context of one process, `user:role:type`, level and categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelinuxContext {
    pub identity: String,
    pub level: String,
    pub categories: String,
}

impl SelinuxContext {
    pub fn unknown() -> Self {
        Self {
            identity: "?".to_string(),
            level: "?".to_string(),
            categories: "?".to_string(),
        }
    }

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim_end_matches(['\0', '\n']);
        let parts: Vec<&str> = raw.split(':').collect();
        let identity = parts[..parts.len().min(3)].join(":");
        let level = parts.get(3).copied().unwrap_or_default().to_string();
        let categories = if parts.len() > 4 {
            parts[4..].join(":")
        } else {
            String::new()
        };
        Self {
            identity,
            level,
            categories,
        }
    }

    pub fn read(proc_root: &Path, pid: u32) -> Self {
        read_attr_current(proc_root, pid)
            .map(|raw| Self::parse(&raw))
            .unwrap_or_else(Self::unknown)
    }
}

/// AppArmor label of a process, `?` when unreadable.
pub fn read_apparmor_label(proc_root: &Path, pid: u32) -> String {
    read_attr_current(proc_root, pid)
        .map(|raw| raw.trim_end_matches('\0').to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn read_attr_current(proc_root: &Path, pid: u32) -> Option<String> {
    read_single_line(&proc_root.join(pid.to_string()).join("attr").join("current"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppArmorStatus {
    /// `None` when the module parameter is unreadable.
    pub enabled: Option<bool>,
    pub mode: Option<String>,
    /// Profile counts; -1 when the profile list is not readable.
    pub enforce: i64,
    pub complain: i64,
}

impl AppArmorStatus {
    pub fn module_loaded(sys_root: &Path) -> bool {
        sys_root.join("module").join("apparmor").exists()
    }

    pub fn load(sys_root: &Path, proc_root: &Path) -> Self {
        let params = sys_root.join("module").join("apparmor").join("parameters");
        let enabled = read_single_line(&params.join("enabled")).map(|v| v == "Y");
        let mode = read_single_line(&params.join("mode")).filter(|m| !m.is_empty());

        let mut status = Self {
            enabled,
            mode,
            ..Default::default()
        };
        let Some(fs_root) = find_apparmorfs(proc_root) else {
            return status;
        };
        match fs::read_to_string(fs_root.join("profiles")) {
            Ok(text) => {
                let (enforce, complain) = count_profiles(&text);
                status.enforce = enforce;
                status.complain = complain;
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                status.enforce = -1;
                status.complain = -1;
            }
            Err(e) => warn!(error = %e, "failed to read apparmor profiles"),
        }
        status
    }

    pub fn counts_known(&self) -> bool {
        self.enforce >= 0 && self.complain >= 0
    }
}

/// Lines look like `/usr/bin/foo (enforce)`.
fn count_profiles(text: &str) -> (i64, i64) {
    let mut enforce = 0;
    let mut complain = 0;
    for line in text.lines().filter(|l| !l.is_empty()) {
        let Some((name, rest)) = line.rsplit_once(" (") else {
            warn!(line, "malformed apparmor profile line");
            continue;
        };
        let mode = rest.trim_end_matches(')');
        info!(profile = name, mode, "apparmor profile");
        match mode {
            "enforce" => enforce += 1,
            "complain" => complain += 1,
            other => warn!(profile = name, mode = other, "unexpected apparmor mode"),
        }
    }
    (enforce, complain)
}

/// Mount point of securityfs that carries an `apparmor` directory.
fn find_apparmorfs(proc_root: &Path) -> Option<PathBuf> {
    let mounts = fs::read_to_string(proc_root.join("mounts")).ok()?;
    mounts.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        let _device = fields.next()?;
        let mount_point = fields.next()?;
        let fs_type = fields.next()?;
        let candidate = Path::new(mount_point).join("apparmor");
        (fs_type == "securityfs" && candidate.exists()).then_some(candidate)
    })
}
