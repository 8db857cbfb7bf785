use std::collections::HashMap;
use std::process::Command;

use sysinfo::Users;
use tracing::{info, warn};

/// uid → user name, resolved once per uid.
///
/// The table is seeded from the system user list; uids missing from it are
/// looked up through `getent passwd`. If that also fails the decimal uid is
/// used as the name.
#[derive(Debug, Default)]
pub struct UserResolver {
    names: HashMap<u32, String>,
    use_getent: bool,
}

impl UserResolver {
    pub fn new() -> Self {
        let users = Users::new_with_refreshed_list();
        let names = users
            .list()
            .iter()
            .map(|user| (**user.id(), user.name().to_string()))
            .collect();
        Self {
            names,
            use_getent: true,
        }
    }

    /// Fixed table with no external lookups.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(|(uid, n)| (uid, n.into())).collect(),
            use_getent: false,
        }
    }

    pub fn name(&mut self, uid: u32) -> String {
        if let Some(name) = self.names.get(&uid) {
            return name.clone();
        }
        let name = if self.use_getent {
            getent_user(uid)
        } else {
            None
        };
        let name = match name {
            Some(name) => {
                info!(uid, %name, "resolved user through getent");
                name
            }
            None => {
                warn!(uid, "user not found");
                uid.to_string()
            }
        };
        self.names.insert(uid, name.clone());
        name
    }
}

fn getent_user(uid: u32) -> Option<String> {
    let output = Command::new("getent")
        .args(["passwd", &uid.to_string()])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout);
    parse_passwd_name(&text)
}

fn parse_passwd_name(line: &str) -> Option<String> {
    let name = line.split(':').next()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}
