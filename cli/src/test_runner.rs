use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use funcmark::{Block, ErrorCode, Parser, SchemaRegistry};

const FIXTURE_SUFFIX: &str = ".test.fm";

#[derive(Debug, Deserialize)]
pub struct ExpectedError {
    /// Error code name (`UNCLOSED_PAREN`) or id (`FM003`).
    pub code: String,

    /// If set, the error block must sit on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,

    /// Substring that must appear in the error message.
    #[serde(default)]
    pub contains: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Block type tags in document order.
    #[serde(default)]
    pub expect_types: Option<Vec<String>>,

    /// Error blocks in document order. When absent, any error block fails the test.
    #[serde(default)]
    pub expect_errors: Option<Vec<ExpectedError>>,

    /// Text that must appear in the rendered HTML (surrounding whitespace ignored).
    #[serde(default)]
    pub expect_html: Option<String>,
}

/// Split a fixture into its TOML frontmatter and markup source.
fn split_fixture(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let body = content
        .strip_prefix("---\r\n")
        .or_else(|| content.strip_prefix("---\n"))
        .ok_or("missing opening --- frontmatter delimiter")?;

    let (frontmatter, rest) = match body.strip_prefix("---") {
        Some(rest) => ("", rest),
        None => {
            let close = body
                .find("\n---")
                .ok_or("missing closing --- frontmatter delimiter")?;
            (body[..close].trim_end_matches('\r'), &body[close + "\n---".len()..])
        }
    };
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config = toml::from_str(frontmatter).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(FIXTURE_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path, registry: &SchemaRegistry) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };
    let (config, source) = match split_fixture(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let blocks = Parser::new(registry).parse(source);
    log::debug!("{}: {} block(s)", path.display(), blocks.len());

    TestResult {
        path: path.to_path_buf(),
        outcome: match check_expectations(&config, &blocks) {
            Some(reason) => TestOutcome::Fail(reason),
            None => TestOutcome::Pass,
        },
        description: config.description,
    }
}

/// Returns `Some(reason)` on the first mismatch.
fn check_expectations(config: &TestConfig, blocks: &[Block]) -> Option<String> {
    let errors: Vec<_> = blocks.iter().filter_map(Block::as_error).collect();

    match &config.expect_errors {
        Some(expected) => {
            if let Some(reason) = check_errors(&errors, expected) {
                return Some(reason);
            }
        }
        None if !errors.is_empty() => {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Some(format!("unexpected error block(s): {}", msgs.join("; ")));
        }
        None => {}
    }

    if let Some(expected) = &config.expect_types {
        let actual: Vec<&str> = blocks.iter().map(Block::type_tag).collect();
        if actual != *expected {
            return Some(format!(
                "block types mismatch\n  expected: [{}]\n  actual:   [{}]",
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    if let Some(expected) = &config.expect_html {
        let html = funcmark::render::to_html(blocks);
        if !html.contains(expected.trim()) {
            return Some(format!(
                "html mismatch\n  expected to contain: {}\n  actual: {}",
                expected.trim(),
                html.trim()
            ));
        }
    }

    None
}

fn check_errors(actual: &[&funcmark::ErrorBlock], expected: &[ExpectedError]) -> Option<String> {
    if actual.len() != expected.len() {
        let listed: Vec<String> = actual.iter().map(|e| format!("  - {}", e)).collect();
        return Some(format!(
            "expected {} error(s), got {}\n  actual errors:\n{}",
            expected.len(),
            actual.len(),
            if listed.is_empty() {
                "    (none)".to_string()
            } else {
                listed.join("\n")
            }
        ));
    }

    for (i, (err, want)) in actual.iter().zip(expected).enumerate() {
        let Some(code) = ErrorCode::from_name(&want.code) else {
            return Some(format!("error[{}]: unknown error code \"{}\"", i, want.code));
        };
        if err.code != code {
            return Some(format!("error[{}]: expected {}, got {}", i, code, err.code));
        }
        if let Some(text) = &want.contains {
            if !err.message.contains(text.as_str()) {
                return Some(format!(
                    "error[{}]: expected message containing \"{}\", got: {}",
                    i, text, err.message
                ));
            }
        }
        if let Some(line) = want.line {
            let actual_line = err.location.map(|l| l.line);
            if actual_line != Some(line) {
                return Some(format!(
                    "error[{}]: expected on line {}, got {}",
                    i,
                    line,
                    actual_line.map_or("no location".to_string(), |l| format!("line {}", l))
                ));
            }
        }
    }
    None
}

/// Fixture files grouped by subfolder relative to `root`; files directly in
/// `root` get the empty category.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_fixtures(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_fixtures(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fixtures(&path, root, out);
            continue;
        }
        let is_fixture = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(FIXTURE_SUFFIX));
        if is_fixture {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(cat: &str) -> &str {
    if cat.is_empty() { "(root)" } else { cat }
}

/// Print the categories found under `path`.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(cat), files.len());
    }
}

/// Keep the categories equal to, or nested under, one of `requested`.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }
    let mut selected = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let prefix = format!("{}/", req);
        let before = selected.len();
        for (cat, files) in all {
            if cat == req || cat.starts_with(&prefix) {
                selected.insert(cat.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                available.join(", ")
            );
        }
    }
    selected
}

struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, code: &str, s: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, s)
        } else {
            s.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }

    fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }
}

#[derive(Default)]
struct Summary {
    passed: usize,
    failures: Vec<TestResult>,
}

impl Summary {
    fn record(&mut self, result: TestResult, style: &Style) {
        match result.outcome {
            TestOutcome::Pass => {
                self.passed += 1;
                eprintln!("  {}  {}", style.pass(), result.label());
            }
            TestOutcome::Fail(_) => {
                eprintln!("  {}  {}", style.fail(), result.label());
                self.failures.push(result);
            }
        }
    }

    /// Print failure details and the result line; returns the exit code.
    fn finish(self, style: &Style) -> i32 {
        if !self.failures.is_empty() {
            eprintln!();
            eprintln!("failures:");
            for failure in &self.failures {
                eprintln!();
                eprintln!("  --- {} ---", failure.path.display());
                if let TestOutcome::Fail(reason) = &failure.outcome {
                    for line in reason.lines() {
                        eprintln!("  {}", line);
                    }
                }
            }
        }

        eprintln!();
        let failed = self.failures.len();
        if failed == 0 {
            eprintln!("test result: {}. {} passed, 0 failed", style.paint("32", "ok"), self.passed);
            0
        } else {
            eprintln!(
                "test result: {}. {} passed, {} failed (of {})",
                style.paint("31", "FAILED"),
                self.passed,
                failed,
                self.passed + failed
            );
            1
        }
    }
}

/// Run every fixture under `path` (or the single file `path`), optionally
/// restricted to `categories`. Returns 0 when all pass, 1 otherwise.
pub fn run_tests(path: &Path, registry: &SchemaRegistry, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { color: !no_color };
    let mut summary = Summary::default();

    if path.is_file() {
        summary.record(run_single_test(path, registry), &style);
        return summary.finish(&style);
    }

    let all = discover_categorized(path);
    if all.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return 1;
    }
    let selected = select_categories(&all, categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    for (cat, files) in selected {
        eprintln!();
        eprintln!("{}", style.bold(category_label(cat)));
        for file in files {
            summary.record(run_single_test(file, registry), &style);
        }
    }
    summary.finish(&style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn outcome(path: &Path) -> Result<(), String> {
        match run_single_test(path, &SchemaRegistry::builtin()).outcome {
            TestOutcome::Pass => Ok(()),
            TestOutcome::Fail(reason) => Err(reason),
        }
    }

    #[test]
    fn splits_frontmatter_from_source() {
        let (config, source) =
            split_fixture("---\ndescription = \"d\"\nexpect_types = [\"head\"]\n---\n@head(text=\"T\")\n").unwrap();
        assert_eq!(config.description.as_deref(), Some("d"));
        assert_eq!(config.expect_types, Some(vec!["head".to_string()]));
        assert_eq!(source, "@head(text=\"T\")\n");
    }

    #[test]
    fn missing_delimiters_are_reported() {
        assert!(split_fixture("@head(text=\"T\")").is_err());
        assert!(split_fixture("---\ndescription = \"d\"\n").is_err());
    }

    #[test]
    fn passing_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "ok.test.fm",
            "---\nexpect_types = [\"head\", \"paragraph\"]\nexpect_html = \"<h1>T</h1>\\n<p>body</p>\"\n---\n@head(text=\"T\")\nbody\n",
        );
        assert_eq!(outcome(&path), Ok(()));
    }

    #[test]
    fn expected_errors_match_code_line_and_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "err.test.fm",
            "---\n[[expect_errors]]\ncode = \"FM001\"\nline = 2\ncontains = \"nope\"\n---\nintro\n@nope()\n",
        );
        assert_eq!(outcome(&path), Ok(()));
    }

    #[test]
    fn unexpected_error_blocks_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "bad.test.fm", "---\n---\n@head(text=\"oops\"\n");
        let reason = outcome(&path).unwrap_err();
        assert!(reason.contains("unexpected error block"), "{}", reason);
    }

    #[test]
    fn wrong_line_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(
            dir.path(),
            "line.test.fm",
            "---\n[[expect_errors]]\ncode = \"UNKNOWN_FUNCTION\"\nline = 5\n---\n@nope()\n",
        );
        let reason = outcome(&path).unwrap_err();
        assert!(reason.contains("expected on line 5, got line 1"), "{}", reason);
    }

    #[test]
    fn discovers_fixtures_by_category() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "top.test.fm", "---\n---\n");
        write_fixture(dir.path(), "errors/a.test.fm", "---\n---\n");
        write_fixture(dir.path(), "errors/nested/b.test.fm", "---\n---\n");
        write_fixture(dir.path(), "errors/readme.md", "not a fixture");

        let all = discover_categorized(dir.path());
        let keys: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["", "errors", "errors/nested"]);

        let selected = select_categories(&all, &["errors".to_string()]);
        assert_eq!(selected.len(), 2);
        assert!(!selected.contains_key(""));
    }

    #[test]
    fn bundled_fixtures_pass() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        assert_eq!(run_tests(&dir, &SchemaRegistry::builtin(), true, &[]), 0);
    }

    #[test]
    fn run_tests_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "ok.test.fm", "---\nexpect_types = [\"paragraph\"]\n---\nhello\n");
        let registry = SchemaRegistry::builtin();
        assert_eq!(run_tests(dir.path(), &registry, true, &[]), 0);

        write_fixture(dir.path(), "fail.test.fm", "---\nexpect_types = [\"head\"]\n---\nhello\n");
        assert_eq!(run_tests(dir.path(), &registry, true, &[]), 1);
    }
}
