//! Integration tests for depver

use std::path::{Path, PathBuf};

use depver::config::Config;
use depver::modfile;
use depver::{ManifestExtractor, ManifestRecord, SENTINEL, extract_dependencies};
use walkdir::WalkDir;

fn fixtures(kind: &str) -> Vec<PathBuf> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(kind);
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "mod"))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn fixture(name: &str) -> String {
    read(
        &Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/valid")
            .join(name),
    )
}

/// Every valid fixture yields a parseable record
#[test]
fn test_valid_fixtures_extract() {
    let files = fixtures("valid");
    assert!(!files.is_empty());

    for path in files {
        let json = extract_dependencies(&read(&path));
        assert_ne!(json, SENTINEL, "{} should extract", path.display());
        let record: Result<ManifestRecord, _> = serde_json::from_str(&json);
        assert!(record.is_ok(), "{} produced invalid JSON", path.display());
    }
}

/// Every invalid fixture collapses to the sentinel
#[test]
fn test_invalid_fixtures_return_sentinel() {
    let files = fixtures("invalid");
    assert!(!files.is_empty());

    for path in files {
        assert_eq!(
            extract_dependencies(&read(&path)),
            SENTINEL,
            "{} should fail",
            path.display()
        );
    }
}

/// Test extracting a realistic go.mod with pseudo-versions and gopkg.in paths
#[test]
fn test_extract_realistic_go_mod() {
    let json = extract_dependencies(&fixture("example.mod"));
    let record: ManifestRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(record.module_path, "github.com/example/webapp");
    assert_eq!(record.min_go_version, "");
    assert_eq!(
        record.dependencies,
        vec![
            "github.com/alecthomas/template;v0.0.0-20160405071501-a0175ee3bccc",
            "github.com/alecthomas/units;v0.0.0-20151022065526-2efee857e7cf",
            "github.com/gorilla/mux;v1.6.2",
            "github.com/sirupsen/logrus;v1.2.0",
            "gopkg.in/alecthomas/kingpin.v2;v2.2.6",
        ]
    );
}

#[test]
fn test_extract_deprecated_module() {
    let json = extract_dependencies(&fixture("deprecated.mod"));
    let record: ManifestRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(record.module_path, "example.com/oldlib");
    assert_eq!(record.min_go_version, "1.19");
    assert_eq!(
        record.deprecation_notice,
        "use example.com/newlib instead."
    );
    assert!(record.dependencies.is_empty());
}

/// Replace, exclude, retract and tool directives do not leak into the record
#[test]
fn test_extract_modern_go_mod() {
    let content = fixture("modern.mod");
    let record = ManifestExtractor::new().extract(&content).unwrap();

    assert_eq!(record.module_path, "example.com/service/v3");
    assert_eq!(record.module_version, "");
    assert_eq!(record.min_go_version, "1.22.0");
    assert_eq!(
        record.dependencies,
        vec![
            "github.com/google/uuid;v1.6.0",
            "golang.org/x/sync;v0.7.0",
            "github.com/davecgh/go-spew;v1.1.1",
            "golang.org/x/sys;v0.20.0",
        ]
    );

    let file = modfile::parse(&content).unwrap();
    assert_eq!(file.toolchain.unwrap().name, "go1.22.4");
    assert_eq!(file.godebug.len(), 2);
    assert_eq!(file.exclude.len(), 1);
    assert_eq!(file.replace.len(), 2);
    assert_eq!(file.retract.len(), 2);
    assert_eq!(file.retract[0].rationale, "Published with a broken API.");
    assert_eq!(file.tool.len(), 1);
    assert_eq!(file.ignore.len(), 1);
}

#[test]
fn test_skip_indirect_from_options() {
    let config = Config::from_init_options(Some(serde_json::json!({
        "output": { "skip_indirect": true }
    })));
    let record = ManifestExtractor::from_config(&config)
        .extract(&fixture("modern.mod"))
        .unwrap();
    assert_eq!(
        record.dependencies,
        vec!["github.com/google/uuid;v1.6.0", "golang.org/x/sync;v0.7.0"]
    );
}

/// A dependency's go.mod with directives the strict parser rejects
#[test]
fn test_lax_mode_reads_dependency_manifests() {
    let content = "module example.com/dep\n\ngo 1.21-experimental\n\nfuture-directive on\n\nrequire a.com/x v1.0.0\n";
    assert_eq!(extract_dependencies(content), SENTINEL);

    let config = Config::from_init_options(Some(serde_json::json!({
        "parse": { "mode": "lax" }
    })));
    let record = ManifestExtractor::from_config(&config)
        .extract(content)
        .unwrap();
    assert_eq!(record.min_go_version, "1.21");
    assert_eq!(record.dependencies, vec!["a.com/x;v1.0.0"]);
}

#[test]
fn test_path_major_check_from_options() {
    let content = "module example.com/app\n\nrequire b.com/y v2.1.3\n";
    assert_ne!(extract_dependencies(content), SENTINEL);

    let config = Config::from_init_options(Some(serde_json::json!({
        "parse": { "check_path_major": true }
    })));
    let extractor = ManifestExtractor::from_config(&config);
    assert_eq!(extractor.extract_or_sentinel(content), SENTINEL);
    assert_ne!(
        extractor.extract_or_sentinel("require b.com/y/v2 v2.1.3\n"),
        SENTINEL
    );
}

/// Manifests read from disk behave the same as in-memory text
#[test]
fn test_manifest_from_temp_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("go.mod");
    std::fs::write(
        &path,
        "module example.com/tmp\r\n\r\ngo 1.21\r\n\r\nrequire a.com/x v1.0.0\r\n",
    )
    .unwrap();

    let record = ManifestExtractor::new().extract(&read(&path)).unwrap();
    assert_eq!(record.module_path, "example.com/tmp");
    assert_eq!(record.min_go_version, "1.21");
    assert_eq!(record.dependencies, vec!["a.com/x;v1.0.0"]);
}

#[test]
fn test_shared_extractor_across_threads() {
    let extractor = ManifestExtractor::new();
    let expected = extractor.extract_or_sentinel(&fixture("example.mod"));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..25 {
                    assert_eq!(
                        extractor.extract_or_sentinel(&fixture("example.mod")),
                        expected
                    );
                }
            });
        }
    });
}
