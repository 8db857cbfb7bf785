use std::fs;
use std::path::{Path, PathBuf};

fn rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

fn rel(path: &Path) -> String {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    rel.replace('\\', "/")
}

fn violations_in(dir: &str, forbidden: &[&str]) -> Vec<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join(dir);
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for needle in forbidden {
            if content.contains(needle) {
                violations.push(format!(
                    "{} imports forbidden dependency `{}`",
                    rel(&file),
                    needle
                ));
            }
        }
    }
    violations
}

#[test]
fn layout_module_is_pure() {
    let violations = violations_in(
        "src/layout",
        &["crate::ui", "crate::system", "ratatui", "crossterm", "std::fs"],
    );

    assert!(
        violations.is_empty(),
        "Layout layering violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn system_module_does_not_know_the_terminal() {
    let violations = violations_in("src/system", &["crate::ui", "ratatui", "crossterm"]);

    assert!(
        violations.is_empty(),
        "System/terminal boundary violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn widgets_do_not_read_procfs_directly() {
    // the shared test fixture writes a fake /proc
    let violations: Vec<String> = violations_in("src/ui", &["std::fs", "procfs::"])
        .into_iter()
        .filter(|v| !v.starts_with("src/ui/tests.rs"))
        .collect();

    assert!(
        violations.is_empty(),
        "UI/sampler boundary violations:\n{}",
        violations.join("\n")
    );
}
