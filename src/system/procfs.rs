//! Small readers for `/proc` and `/sys` style files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// First line of a file without its newline. `None` if the file is missing,
/// unreadable or empty.
pub fn read_single_line(path: &Path) -> Option<String> {
    let contents = fs::read_to_string(path).ok()?;
    let line = contents.lines().next()?;
    Some(line.trim_end().to_string())
}

/// Splits a `/proc/<pid>/stat` line into `[pid, comm, state, ppid, ...]`.
///
/// The command name sits in parentheses and may itself contain spaces and
/// parentheses, so it spans from the first `(` to the last `)`.
pub fn split_stat_line(line: &str) -> Option<Vec<&str>> {
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    if close < open {
        return None;
    }
    let mut fields = Vec::with_capacity(52);
    fields.push(line[..open].trim());
    fields.push(&line[open + 1..close]);
    fields.extend(line[close + 1..].split_whitespace());
    Some(fields)
}

/// Parses `key<sep>value` lines, trimming both sides. Lines without the
/// separator are skipped.
pub fn parse_key_values(text: &str, separator: char) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(separator))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Entries of `dir` whose names are decimal numbers, ascending.
pub fn numeric_entries(dir: &Path) -> Vec<u32> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut pids: Vec<u32> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
        .collect();
    pids.sort_unstable();
    pids
}
