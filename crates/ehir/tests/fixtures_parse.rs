use std::fs;
use std::path::{Path, PathBuf};

use ehir::{diagnostics_have_errors, format_module, parse, render_diagnostics};
use walkdir::WalkDir;

fn fixtures_dir(kind: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(kind)
}

fn fixture_files(kind: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(fixtures_dir(kind))
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("ehir"))
        .collect();
    files.sort();
    assert!(!files.is_empty(), "no fixtures under {kind}");
    files
}

fn display(path: &Path) -> String {
    path.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(path)
        .display()
        .to_string()
}

#[test]
fn valid_fixtures_parse_without_errors() {
    let mut report = String::new();
    for path in fixture_files("valid") {
        let source = fs::read_to_string(&path).expect("read fixture");
        let (module, diags) = parse(&source);
        if !diags.is_empty() {
            report.push_str(&render_diagnostics(&display(&path), &source, &diags));
            report.push('\n');
        }
        assert!(
            !module.has_error_nodes(),
            "{} produced error nodes",
            display(&path)
        );
    }
    assert!(report.is_empty(), "fixtures contain diagnostics:\n{report}");
}

#[test]
fn valid_fixtures_format_to_a_fixed_point() {
    for path in fixture_files("valid") {
        let source = fs::read_to_string(&path).expect("read fixture");
        let (module, _) = parse(&source);
        let formatted = format_module(&module);
        let (reparsed, diags) = parse(&formatted);
        assert!(
            diags.is_empty(),
            "{} formatted output has diagnostics:\n{}",
            display(&path),
            render_diagnostics("formatted", &formatted, &diags)
        );
        assert_eq!(format_module(&reparsed), formatted, "{}", display(&path));
    }
}

#[test]
fn invalid_fixtures_report_errors_and_keep_going() {
    for path in fixture_files("invalid") {
        let source = fs::read_to_string(&path).expect("read fixture");
        let (module, diags) = parse(&source);
        assert!(
            diagnostics_have_errors(&diags),
            "{} parsed without errors",
            display(&path)
        );
        assert!(!module.items.is_empty(), "{} lost every item", display(&path));
    }
}

#[test]
fn invalid_fixture_codes() {
    let expected = [
        ("bad_instruction.ehir", vec!["E1500", "E1506"]),
        ("missing_default.ehir", vec!["E1503"]),
        ("unterminated.ehir", vec!["E1502"]),
    ];
    for (name, codes) in expected {
        let path = fixtures_dir("invalid").join(name);
        let source = fs::read_to_string(&path).expect("read fixture");
        let (_, diags) = parse(&source);
        let mut actual: Vec<&str> = diags.iter().map(|d| d.code.as_str()).collect();
        actual.sort();
        assert_eq!(actual, codes, "{name}");
    }
}
