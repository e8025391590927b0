use std::path::{Path, PathBuf};
use std::process::Command;

const MAX_LINES: usize = 750;

/// Hygiene checks cover the crate sources only.
const CHECKED_ROOT: &str = "src";

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/main");
    println!("cargo:rerun-if-changed=.git/packed-refs");

    let sha = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    println!("cargo:rustc-env=PANEWEAVE_VERSION={} ({})", pkg_version, sha);

    let root = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let sources = rust_sources(&root);
    for file in &sources {
        println!("cargo:rerun-if-changed={}", file.display());
    }

    enforce_line_limits(&root, &sources);
    enforce_no_dead_code_allows(&root, &sources);
    enforce_no_test_skips(&root, &sources);
    enforce_no_nested_runtimes(&root, &sources);
    enforce_serial_for_env_mutations(&root, &sources);
}

fn rust_sources(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_directory(&root.join(CHECKED_ROOT), &mut files);
    files.sort();
    files
}

fn walk_directory(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_directory(&path, files);
        } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
            files.push(path);
        }
    }
}

fn relative(root: &Path, file: &Path) -> String {
    file.strip_prefix(root).unwrap_or(file).display().to_string()
}

/// Prints a framed violation report and fails the build.
fn fail(title: &str, violations: &[(String, usize, String)], advice: &[&str]) {
    eprintln!("\n========================================");
    eprintln!("{}", title);
    eprintln!("========================================\n");
    for (path, line, detail) in violations {
        eprintln!("  {}:{}", path, line);
        eprintln!("    {}\n", detail.trim());
    }
    eprintln!("========================================");
    for line in advice {
        eprintln!("{}", line);
    }
    eprintln!("========================================\n");
    panic!("Build failed: {} ({} occurrence(s))", title, violations.len());
}

fn enforce_line_limits(root: &Path, sources: &[PathBuf]) {
    let mut violations = Vec::new();
    for file in sources {
        let Ok(content) = std::fs::read_to_string(file) else {
            println!("cargo:warning=Could not read file {}", relative(root, file));
            continue;
        };
        let count = content.lines().filter(|l| !l.trim().is_empty()).count();
        if count > MAX_LINES {
            violations.push((
                relative(root, file),
                count,
                format!("{} non-empty lines (exceeds by {})", count, count - MAX_LINES),
            ));
        }
    }
    if !violations.is_empty() {
        fail(
            &format!("FILE LINE LIMIT EXCEEDED (max {} lines)", MAX_LINES),
            &violations,
            &["Please split these files into smaller modules."],
        );
    }
}

fn enforce_no_dead_code_allows(root: &Path, sources: &[PathBuf]) {
    let mut violations = Vec::new();
    for file in sources {
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if (trimmed.starts_with("#[allow(") || trimmed.starts_with("#![allow("))
                && trimmed.contains("dead_code")
            {
                violations.push((relative(root, file), idx + 1, line.to_string()));
            }
        }
    }
    if !violations.is_empty() {
        fail(
            "#[allow(dead_code)] IS NOT ALLOWED",
            &violations,
            &[
                "Delete unused code instead of silencing the warning.",
                "Code used only by tests belongs behind #[cfg(test)].",
            ],
        );
    }
}

/// One `#[test]` function located in a source file.
struct TestFn<'a> {
    name: String,
    attr_line: usize,
    attrs: Vec<&'a str>,
    body: Vec<&'a str>,
}

/// Splits a source file into test functions using brace counting.
fn test_functions(content: &str) -> Vec<TestFn<'_>> {
    let lines: Vec<&str> = content.lines().collect();
    let mut found = Vec::new();
    let mut idx = 0;
    while idx < lines.len() {
        let trimmed = lines[idx].trim();
        if trimmed != "#[test]" && !trimmed.starts_with("#[tokio::test") {
            idx += 1;
            continue;
        }
        let attr_line = idx + 1;
        let mut attrs = vec![trimmed];
        let mut fn_idx = idx + 1;
        while fn_idx < lines.len() && !lines[fn_idx].contains("fn ") {
            attrs.push(lines[fn_idx].trim());
            fn_idx += 1;
        }
        // Attributes directly above `#[test]` count too.
        let mut above = idx;
        while above > 0 && lines[above - 1].trim().starts_with("#[") {
            above -= 1;
            attrs.push(lines[above].trim());
        }
        if fn_idx >= lines.len() {
            break;
        }

        let header = lines[fn_idx];
        let name = header
            .split("fn ")
            .nth(1)
            .and_then(|rest| rest.split('(').next())
            .unwrap_or("")
            .trim()
            .to_string();

        let mut depth = 0i32;
        let mut opened = false;
        let mut end = fn_idx;
        for (offset, line) in lines[fn_idx..].iter().enumerate() {
            for c in line.chars() {
                match c {
                    '{' => {
                        depth += 1;
                        opened = true;
                    }
                    '}' => depth -= 1,
                    _ => {}
                }
            }
            end = fn_idx + offset;
            if opened && depth <= 0 {
                break;
            }
        }
        found.push(TestFn {
            name,
            attr_line,
            attrs,
            body: lines[fn_idx..=end].to_vec(),
        });
        idx = end + 1;
    }
    found
}

/// Tests must fail when they cannot run, never return early and pass.
fn enforce_no_test_skips(root: &Path, sources: &[PathBuf]) {
    let skip_patterns = ["Skipping test", "skipping test", "Test skipped", "test skipped"];
    let mut violations = Vec::new();
    for file in sources {
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        for test in test_functions(&content) {
            let skips = test.body.iter().any(|line| {
                skip_patterns.iter().any(|p| line.contains(p)) || line.trim() == "return;"
            });
            if skips {
                violations.push((
                    relative(root, file),
                    test.attr_line,
                    format!("test `{}` silently skips", test.name),
                ));
            }
        }
    }
    if !violations.is_empty() {
        fail(
            "SILENT TEST SKIPS ARE NOT ALLOWED",
            &violations,
            &["Use assert!() on preconditions, or #[ignore] with a reason."],
        );
    }
}

/// Threads that build their own tokio runtime break clients owned by the main one.
fn enforce_no_nested_runtimes(root: &Path, sources: &[PathBuf]) {
    let mut violations = Vec::new();
    for file in sources {
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        let lines: Vec<&str> = content.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.starts_with("//") || !trimmed.contains("thread::spawn(") {
                continue;
            }
            let context = lines[idx..(idx + 20).min(lines.len())].join("\n");
            if context.contains("Runtime::new()") || context.contains("runtime::Builder") {
                violations.push((relative(root, file), idx + 1, line.to_string()));
            }
        }
    }
    if !violations.is_empty() {
        fail(
            "NESTED TOKIO RUNTIMES ARE NOT ALLOWED",
            &violations,
            &["Use tokio::spawn() or async functions on the main runtime."],
        );
    }
}

/// Environment variables are process-global; tests touching them run serially.
fn enforce_serial_for_env_mutations(root: &Path, sources: &[PathBuf]) {
    let mut violations = Vec::new();
    for file in sources {
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        for test in test_functions(&content) {
            let serial = test
                .attrs
                .iter()
                .any(|a| *a == "#[serial]" || *a == "#[serial_test::serial]");
            let mutates = test.body.iter().any(|line| {
                let t = line.trim();
                !t.starts_with("//") && (t.contains("env::set_var") || t.contains("env::remove_var"))
            });
            if mutates && !serial {
                violations.push((
                    relative(root, file),
                    test.attr_line,
                    format!("test `{}` mutates env without #[serial]", test.name),
                ));
            }
        }
    }
    if !violations.is_empty() {
        fail(
            "ENV MUTATIONS REQUIRE #[serial]",
            &violations,
            &["Add `use serial_test::serial;` and mark the test #[serial]."],
        );
    }
}
