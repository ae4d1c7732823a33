//! Feature-flag test coverage heuristics.
//!
//! This is textual proximity search, not execution coverage: a flag counts
//! as tested in a state when a test file mentions the flag name within a
//! few lines of a marker for that state (`true`/`enabled`/`on` or
//! `false`/`disabled`/`off`).

use crate::config::Config;
use crate::error::{MarketError, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;
use walkdir::WalkDir;

const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "rs", "go"];
const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec"];

fn flag_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"\b(?:isEnabled|isFeatureEnabled|useFlag|useFeatureFlag|getFlag|getFeatureFlag|variation|flagEnabled|is_enabled|feature_enabled)\s*\(\s*['"`]([A-Za-z0-9_.:\-]+)['"`]"#,
        )
        .unwrap()
    })
}

fn enabled_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(true|enabled|on)\b").unwrap())
}

fn disabled_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(false|disabled|off)\b").unwrap())
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    FullyTested,
    PartiallyTested,
    Untested,
}

impl std::fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CoverageStatus::FullyTested => "fully tested",
            CoverageStatus::PartiallyTested => "partially tested",
            CoverageStatus::Untested => "untested",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagCoverage {
    pub name: String,
    pub status: CoverageStatus,
    pub enabled_tested: bool,
    pub disabled_tested: bool,
    /// Non-test files that reference the flag, relative to the scan root.
    pub sources: Vec<String>,
    /// Test files that mention the flag.
    pub tests: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub total: usize,
    pub fully_tested: usize,
    pub partially_tested: usize,
    pub untested: usize,
    pub coverage_percent: u32,
    pub flags: Vec<FlagCoverage>,
}

impl CoverageReport {
    fn from_flags(flags: Vec<FlagCoverage>) -> Self {
        let count = |s: CoverageStatus| flags.iter().filter(|f| f.status == s).count();
        let total = flags.len();
        let fully_tested = count(CoverageStatus::FullyTested);
        Self {
            total,
            fully_tested,
            partially_tested: count(CoverageStatus::PartiallyTested),
            untested: count(CoverageStatus::Untested),
            coverage_percent: percent(fully_tested, total),
            flags,
        }
    }

    /// Whether the report satisfies the requested gates.
    pub fn passes(&self, fail_on_missing: bool, threshold: Option<u32>) -> bool {
        if fail_on_missing && self.fully_tested < self.total {
            return false;
        }
        threshold.map_or(true, |t| self.coverage_percent >= t)
    }
}

/// `fully / total` as a whole percentage, halves rounded away from zero.
/// No flags at all counts as full coverage.
fn percent(fully: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    (fully as f64 * 100.0 / total as f64).round() as u32
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

pub fn is_test_file(rel: &Path) -> bool {
    let Some(name) = rel.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.contains(".test.") || name.contains(".spec.") || name.contains("_test.") || name.starts_with("test_") {
        return true;
    }
    rel.parent()
        .map(|p| {
            p.components().any(|c| {
                c.as_os_str()
                    .to_str()
                    .is_some_and(|s| TEST_DIRS.contains(&s))
            })
        })
        .unwrap_or(false)
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}

/// Flag names referenced by flag-evaluation calls in `content`.
pub fn find_flags(content: &str) -> BTreeSet<String> {
    flag_call_re()
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// (enabled context seen, disabled context seen) for `flag` in one file.
pub fn test_contexts(lines: &[&str], flag: &str, window: usize) -> (bool, bool) {
    let mut enabled = false;
    let mut disabled = false;
    for (i, line) in lines.iter().enumerate() {
        if !line.contains(flag) {
            continue;
        }
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(lines.len());
        for nearby in &lines[start..end] {
            enabled |= enabled_re().is_match(nearby);
            disabled |= disabled_re().is_match(nearby);
        }
        if enabled && disabled {
            break;
        }
    }
    (enabled, disabled)
}

struct ScannedFile {
    rel: String,
    content: String,
}

pub fn scan(path: &Path, config: &Config) -> Result<CoverageReport> {
    if !path.is_dir() {
        return Err(MarketError::PathNotFound(path.display().to_string()));
    }

    let mut sources: Vec<ScannedFile> = Vec::new();
    let mut tests: Vec<ScannedFile> = Vec::new();

    let walker = WalkDir::new(path).sort_by_file_name().into_iter().filter_entry(|e| {
        e.depth() == 0
            || !e.file_type().is_dir()
            || !e
                .file_name()
                .to_str()
                .is_some_and(|n| config.scan.is_excluded(n))
    });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_source_extension(entry.path()) {
            continue;
        }
        let rel_path = entry.path().strip_prefix(path).unwrap_or(entry.path());
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            debug!(file = %entry.path().display(), "skipping unreadable file");
            continue;
        };
        let file = ScannedFile {
            rel: rel_path.to_string_lossy().replace('\\', "/"),
            content,
        };
        if is_test_file(rel_path) {
            tests.push(file);
        } else {
            sources.push(file);
        }
    }

    let mut flags: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for file in &sources {
        for flag in find_flags(&file.content) {
            flags.entry(flag).or_default().push(file.rel.clone());
        }
    }
    debug!(
        sources = sources.len(),
        tests = tests.len(),
        flags = flags.len(),
        "scanned for feature flags"
    );

    let test_lines: Vec<(&str, Vec<&str>)> = tests
        .iter()
        .map(|t| (t.rel.as_str(), t.content.lines().collect()))
        .collect();

    let coverage = flags
        .into_iter()
        .map(|(name, flag_sources)| {
            let mut enabled_tested = false;
            let mut disabled_tested = false;
            let mut both_in_one_file = false;
            let mut mentioned_in = Vec::new();
            for (rel, lines) in &test_lines {
                if !lines.iter().any(|l| l.contains(name.as_str())) {
                    continue;
                }
                mentioned_in.push(rel.to_string());
                let (on, off) = test_contexts(lines, &name, config.flags.window_lines);
                enabled_tested |= on;
                disabled_tested |= off;
                both_in_one_file |= on && off;
            }
            // Both contexts must appear in the same test file.
            let status = if both_in_one_file {
                CoverageStatus::FullyTested
            } else if enabled_tested || disabled_tested {
                CoverageStatus::PartiallyTested
            } else {
                CoverageStatus::Untested
            };
            FlagCoverage {
                name,
                status,
                enabled_tested,
                disabled_tested,
                sources: flag_sources,
                tests: mentioned_in,
            }
        })
        .collect();

    Ok(CoverageReport::from_flags(coverage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        io::atomic_write(&root.join(rel), body.as_bytes()).unwrap();
    }

    #[test]
    fn test_file_detection() {
        for p in [
            "src/checkout.test.ts",
            "src/checkout.spec.tsx",
            "pkg/flags_test.go",
            "test_flags.py",
            "tests/integration.rs",
            "src/__tests__/Checkout.tsx",
        ] {
            assert!(is_test_file(Path::new(p)), "{p}");
        }
        for p in ["src/checkout.ts", "src/testing.ts", "contest/app.py"] {
            assert!(!is_test_file(Path::new(p)), "{p}");
        }
    }

    #[test]
    fn finds_flags_across_call_styles() {
        let src = r#"
            if (flags.isEnabled('new-checkout')) {}
            const v = useFeatureFlag("dark_mode");
            client.variation(`pricing.v2`, user, false);
            if feature_enabled("beta-search"):
            isEnabled(someVariable);
        "#;
        let found: Vec<_> = find_flags(src).into_iter().collect();
        assert_eq!(found, vec!["beta-search", "dark_mode", "new-checkout", "pricing.v2"]);
    }

    #[test]
    fn context_window_limits_markers() {
        let lines = vec![
            "it('new-checkout on', () => {",
            "  mock('new-checkout', true);",
            "});",
            "",
            "",
            "const off = false;",
        ];
        assert_eq!(test_contexts(&lines, "new-checkout", 2), (true, false));
        assert_eq!(test_contexts(&lines, "new-checkout", 4), (true, true));
        assert_eq!(test_contexts(&lines, "missing", 10), (false, false));
    }

    #[test]
    fn percent_rounds_half_away_from_zero() {
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn scan_classifies_flags() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/checkout.ts", "if (isEnabled('new-checkout')) { go(); }\n");
        write(root, "src/theme.ts", "const d = useFlag('dark-mode');\n");
        write(root, "src/search.py", "if is_enabled(\"beta-search\"):\n    pass\n");
        write(
            root,
            "src/checkout.test.ts",
            "setFlag('new-checkout', true);\nexpect(a).toBe(1);\nsetFlag('new-checkout', false);\n",
        );
        write(root, "tests/theme_test.py", "set_flag('dark-mode', enabled=True)\n");
        write(root, "node_modules/lib/index.js", "isEnabled('vendored-flag')\n");

        let report = scan(root, &Config::default()).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.fully_tested, 1);
        assert_eq!(report.partially_tested, 1);
        assert_eq!(report.untested, 1);
        assert_eq!(report.coverage_percent, 33);

        let by_name: BTreeMap<_, _> = report.flags.iter().map(|f| (f.name.as_str(), f)).collect();
        assert_eq!(by_name["new-checkout"].status, CoverageStatus::FullyTested);
        assert_eq!(by_name["new-checkout"].sources, vec!["src/checkout.ts"]);
        assert_eq!(by_name["new-checkout"].tests, vec!["src/checkout.test.ts"]);
        assert_eq!(by_name["dark-mode"].status, CoverageStatus::PartiallyTested);
        assert!(by_name["dark-mode"].enabled_tested);
        assert_eq!(by_name["beta-search"].status, CoverageStatus::Untested);
        assert!(!by_name.contains_key("vendored-flag"));

        assert!(!report.passes(true, None));
        assert!(report.passes(false, Some(30)));
        assert!(!report.passes(false, Some(50)));
    }

    #[test]
    fn empty_tree_is_fully_covered() {
        let dir = TempDir::new().unwrap();
        let report = scan(dir.path(), &Config::default()).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.coverage_percent, 100);
        assert!(report.passes(true, Some(100)));
    }

    #[test]
    fn contexts_split_across_test_files_are_partial() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/a.ts", "if (isEnabled('new-checkout')) {}\n");
        write(dir.path(), "src/a_on.test.ts", "setFlag('new-checkout', true);\n");
        write(dir.path(), "src/a_off.test.ts", "setFlag('new-checkout', false);\n");

        let report = scan(dir.path(), &Config::default()).unwrap();
        let flag = &report.flags[0];
        assert_eq!(flag.status, CoverageStatus::PartiallyTested);
        assert!(flag.enabled_tested && flag.disabled_tested);
        assert_eq!(flag.tests.len(), 2);
        assert_eq!(report.coverage_percent, 0);
        assert!(!report.passes(true, None));
    }
}
