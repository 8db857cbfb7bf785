use std::collections::{HashMap, HashSet};

use crate::glyphs::TreeGlyphs;

use super::process::{ProcessRecord, ProcessSnapshot, ROOT_PID};

pub const OWNER_KEY: &str = "UID";
pub const PID_KEY: &str = "PID";
pub const COMMAND_KEY: &str = "COMMAND";

/// Column name → substring. Empty values and unknown columns match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    values: HashMap<String, String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: &str) {
        self.values.insert(column.to_string(), value.to_string());
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.is_empty())
    }

    pub fn matches(&self, record: &ProcessRecord) -> bool {
        self.values.iter().all(|(column, wanted)| {
            if wanted.is_empty() {
                return true;
            }
            match column.as_str() {
                OWNER_KEY => record.owner.contains(wanted.as_str()),
                PID_KEY => record.pid.to_string().contains(wanted.as_str()),
                COMMAND_KEY => record.command.contains(wanted.as_str()),
                _ => true,
            }
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterCriteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Pids to display: every match, the ancestor chain of every match and the
/// whole subtree below every match. The root is always included but never
/// matched itself.
pub fn visible_pids(snapshot: &ProcessSnapshot, criteria: &FilterCriteria) -> HashSet<u32> {
    let mut visible = HashSet::with_capacity(snapshot.len());
    visible.insert(ROOT_PID);

    let mut matched: Vec<u32> = snapshot
        .records
        .values()
        .filter(|r| !r.is_root() && criteria.matches(r))
        .map(|r| r.pid)
        .collect();
    matched.sort_unstable();

    for &pid in &matched {
        let mut current = Some(pid);
        while let Some(p) = current {
            if p == ROOT_PID || !visible.insert(p) {
                break;
            }
            current = snapshot.get(p).and_then(|r| r.ppid);
        }
    }

    // A child may already be visible as some other match's ancestor, so the
    // descent tracks its own visited set.
    let mut expanded: HashSet<u32> = HashSet::new();
    let mut stack: Vec<u32> = Vec::new();
    for &pid in &matched {
        if !expanded.insert(pid) {
            continue;
        }
        stack.extend_from_slice(snapshot.children(pid));
        while let Some(child) = stack.pop() {
            visible.insert(child);
            if expanded.insert(child) {
                stack.extend_from_slice(snapshot.children(child));
            }
        }
    }
    visible
}

/// One printable row of the process tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLine<'a> {
    pub record: &'a ProcessRecord,
    /// For each ancestor, root first: was it the last visible sibling.
    pub parents_last: Vec<bool>,
    pub is_last: bool,
}

impl TreeLine<'_> {
    pub fn depth(&self) -> usize {
        self.parents_last.len()
    }

    pub fn prefix(&self, glyphs: &TreeGlyphs) -> String {
        let mut out = String::with_capacity((self.parents_last.len() + 1) * 4);
        for &last in &self.parents_last {
            out.push_str(if last {
                &glyphs.blank
            } else {
                &glyphs.continuing
            });
        }
        out.push_str(if self.is_last {
            &glyphs.branch_end
        } else {
            &glyphs.branch_mid
        });
        out
    }

    pub fn command_text(&self, glyphs: &TreeGlyphs) -> String {
        format!("{}{}", self.prefix(glyphs), self.record.command)
    }
}

/// Pre-order walk from the root over `visible`. Subtrees of invisible nodes
/// are skipped entirely.
pub fn tree_lines<'a>(
    snapshot: &'a ProcessSnapshot,
    visible: &HashSet<u32>,
) -> Vec<TreeLine<'a>> {
    let mut lines = Vec::with_capacity(visible.len());
    let Some(root) = snapshot.root() else {
        return lines;
    };
    lines.push(TreeLine {
        record: root,
        parents_last: Vec::new(),
        is_last: true,
    });

    // (pid, parents_last, is_last), pushed in reverse so pops come out in order
    let mut stack: Vec<(u32, Vec<bool>, bool)> = Vec::new();
    push_visible_children(snapshot, visible, ROOT_PID, &[true], &mut stack);
    while let Some((pid, parents_last, is_last)) = stack.pop() {
        let Some(record) = snapshot.get(pid) else {
            continue;
        };
        let mut below = parents_last.clone();
        below.push(is_last);
        lines.push(TreeLine {
            record,
            parents_last,
            is_last,
        });
        push_visible_children(snapshot, visible, pid, &below, &mut stack);
    }
    lines
}

fn push_visible_children(
    snapshot: &ProcessSnapshot,
    visible: &HashSet<u32>,
    pid: u32,
    parents_last: &[bool],
    stack: &mut Vec<(u32, Vec<bool>, bool)>,
) {
    let kids: Vec<u32> = snapshot
        .children(pid)
        .iter()
        .copied()
        .filter(|c| visible.contains(c))
        .collect();
    let count = kids.len();
    for (i, child) in kids.into_iter().enumerate().rev() {
        stack.push((child, parents_last.to_vec(), i + 1 == count));
    }
}

/// Filters and flattens in one go.
pub fn filtered_lines<'a>(
    snapshot: &'a ProcessSnapshot,
    criteria: &FilterCriteria,
) -> Vec<TreeLine<'a>> {
    let visible = visible_pids(snapshot, criteria);
    tree_lines(snapshot, &visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::Glyphs;
    use crate::system::process::tests::record;

    fn sample() -> ProcessSnapshot {
        ProcessSnapshot::build(
            5.0,
            vec![
                record(1, 0, "bash"),
                record(2, 1, "vim"),
                record(3, 1, "sleep"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn sleep_filter_keeps_chain_and_drops_sibling() {
        let snap = sample();
        let criteria = FilterCriteria::new().with(COMMAND_KEY, "sleep");
        let visible = visible_pids(&snap, &criteria);
        assert_eq!(visible, HashSet::from([0, 1, 3]));
    }

    #[test]
    fn match_pulls_in_descendants() {
        let snap = ProcessSnapshot::build(
            1.0,
            vec![
                record(1, 0, "init"),
                record(2, 1, "sshd"),
                record(3, 2, "sshd: alice"),
                record(4, 3, "bash"),
                record(5, 1, "cron"),
            ],
        )
        .unwrap();
        let visible = visible_pids(&snap, &FilterCriteria::new().with(PID_KEY, "2"));
        assert_eq!(visible, HashSet::from([0, 1, 2, 3, 4]));
    }

    #[test]
    fn empty_and_unknown_criteria_match_all() {
        let snap = sample();
        assert_eq!(visible_pids(&snap, &FilterCriteria::new()).len(), 4);
        let odd = FilterCriteria::new().with("PPID", "zzz").with(OWNER_KEY, "");
        assert_eq!(visible_pids(&snap, &odd).len(), 4);
    }

    #[test]
    fn nested_matches_still_expand_every_subtree() {
        let snap = ProcessSnapshot::build(
            1.0,
            vec![
                record(1, 0, "tmux"),
                record(2, 1, "zsh"),
                record(3, 2, "tmux attach"),
                record(4, 2, "htop"),
            ],
        )
        .unwrap();
        let visible = visible_pids(&snap, &FilterCriteria::new().with(COMMAND_KEY, "tmux"));
        assert_eq!(visible, HashSet::from([0, 1, 2, 3, 4]));
    }

    #[test]
    fn no_match_leaves_only_root() {
        let snap = sample();
        let criteria = FilterCriteria::new().with(OWNER_KEY, "bob");
        assert_eq!(visible_pids(&snap, &criteria), HashSet::from([0]));
    }

    #[test]
    fn lines_are_preorder_with_last_flags() {
        let snap = sample();
        let visible = visible_pids(&snap, &FilterCriteria::new());
        let lines = tree_lines(&snap, &visible);
        let order: Vec<u32> = lines.iter().map(|l| l.record.pid).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);

        let tree = TreeGlyphs::from_glyphs(&Glyphs::utf8());
        let texts: Vec<String> = lines.iter().map(|l| l.command_text(&tree)).collect();
        assert_eq!(texts[0], "└── Root");
        assert_eq!(texts[1], "    └── bash");
        assert_eq!(texts[2], "        ├── vim");
        assert_eq!(texts[3], "        └── sleep");
    }

    #[test]
    fn last_flag_uses_visible_siblings_only() {
        let snap = sample();
        let visible = visible_pids(&snap, &FilterCriteria::new().with(COMMAND_KEY, "vim"));
        let lines = tree_lines(&snap, &visible);
        let vim = lines.iter().find(|l| l.record.pid == 2).unwrap();
        assert!(vim.is_last);
        assert_eq!(vim.parents_last, vec![true, true]);
        assert_eq!(lines.len(), 3);
    }
}
