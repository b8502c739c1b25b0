use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use moonshine::{Document, ParseError, ParserOptions};

const FIXTURE_SUFFIX: &str = ".test.moon";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    /// Human-readable fixture description.
    #[serde(default)]
    pub description: Option<String>,

    /// Parse with strict keyword checking.
    #[serde(default)]
    pub strict: bool,

    /// If true, the fixture expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// The error's Display string must contain this substring. Implies a parse error.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// The error must be reported on this 1-based source line. Implies a parse error.
    #[serde(default)]
    pub expect_error_line: Option<usize>,

    /// Names of the units the document must contain, in order.
    #[serde(default)]
    pub expect_units: Option<Vec<String>>,
}

impl FixtureConfig {
    fn expects_failure(&self) -> bool {
        self.expect_parse_error || self.expect_error.is_some() || self.expect_error_line.is_some()
    }
}

/// Split a `.test.moon` file into its TOML front matter and moonshine source.
fn parse_fixture(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let body = content
        .strip_prefix("---")
        .ok_or("missing opening --- front matter delimiter")?;

    // the newline ending the opening delimiter is still in `body`, so an
    // empty front matter is found at offset 0
    let close = body
        .find("\n---")
        .ok_or("missing closing --- front matter delimiter")?;

    let front_matter = body[..close].trim();
    let rest = &body[close + "\n---".len()..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: FixtureConfig =
        toml::from_str(front_matter).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum Outcome {
    Pass,
    Fail(String),
}

pub struct FixtureResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: Outcome,
}

impl FixtureResult {
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

fn run_fixture(path: &Path) -> FixtureResult {
    let fail = |description: Option<String>, reason: String| FixtureResult {
        path: path.to_path_buf(),
        description,
        outcome: Outcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };
    let (config, source) = match parse_fixture(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("front matter error: {}", e)),
    };

    let parser = moonshine::Parser::with_options(
        source.to_string(),
        ParserOptions {
            strict: config.strict,
        },
    );
    let outcome = match check_outcome(&config, parser.parse()) {
        None => Outcome::Pass,
        Some(reason) => Outcome::Fail(reason),
    };

    FixtureResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

/// Compare a parse result against the fixture's expectations.
/// Returns `Some(reason)` on mismatch.
fn check_outcome(config: &FixtureConfig, result: Result<Document, ParseError>) -> Option<String> {
    match result {
        Err(err) if config.expects_failure() => {
            let rendered = err.to_string();
            if let Some(expected) = &config.expect_error {
                if !rendered.contains(expected.as_str()) {
                    return Some(format!(
                        "expected error containing \"{}\", got: {}",
                        expected, rendered
                    ));
                }
            }
            if let Some(line) = config.expect_error_line {
                if err.line_number() != line {
                    return Some(format!(
                        "expected error on line {}, got line {}: {}",
                        line,
                        err.line_number(),
                        rendered
                    ));
                }
            }
            None
        }
        Err(err) => Some(format!("unexpected parse error: {}", err)),
        Ok(_) if config.expects_failure() => {
            Some("expected parse error, but parsing succeeded".to_string())
        }
        Ok(document) => {
            let expected = config.expect_units.as_ref()?;
            let actual: Vec<&str> = document.units.iter().map(|u| u.name.as_str()).collect();
            if actual == *expected {
                None
            } else {
                Some(format!(
                    "unit mismatch\n  expected: {:?}\n  actual:   {:?}",
                    expected, actual
                ))
            }
        }
    }
}

/// Discover fixtures grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
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

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given fixture path.
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
        eprintln!("  {} ({} fixtures)", category_label(cat), files.len());
    }
}

/// Terminal styling for runner output.
struct Style {
    color: bool,
}

impl Style {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }
}

/// Keep only the requested categories, or all of them when none are requested.
fn select_categories<'c>(
    all: &'c BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'c str, &'c [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }

    let mut selected = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let prefix = format!("{}/", req);
        let mut found = false;
        for (cat, files) in all {
            if cat == req || cat.starts_with(&prefix) {
                selected.insert(cat.as_str(), files.as_slice());
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

/// Run every fixture under `path` (or a single file).
/// If `categories` is non-empty, only fixtures in those categories run.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { color: !no_color };

    let all = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover_categorized(path)
    };
    if all.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return 1;
    }

    let selected = if path.is_file() {
        select_categories(&all, &[])
    } else {
        select_categories(&all, categories)
    };
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<FixtureResult> = Vec::new();

    for (cat, files) in &selected {
        eprintln!();
        eprintln!("{}", style.bold(category_label(cat)));

        for file in *files {
            let result = run_fixture(file);
            match &result.outcome {
                Outcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", style.pass(), result.label());
                }
                Outcome::Fail(_) => {
                    eprintln!("  {}  {}", style.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let Outcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", style.paint("32", "ok"), passed);
        0
    } else {
        let failed = failures.len();
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("31", "FAILED"),
            passed,
            failed,
            passed + failed
        );
        1
    }
}
