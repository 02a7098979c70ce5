//! End-to-end tests for the export pipeline over real temp directories.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use treesnap::bundle::UNSORTED_BUNDLE;
use treesnap::config::SnapConfig;
use treesnap::engine::{
    assemble_snapshot, export_snapshot, list_directory, list_projects, write_snapshot,
};
use treesnap::error::SnapError;
use treesnap::models::{SnapshotDocument, SnapshotMode};

const SCENARIO_B: &str = "import os\n\ndef f():\n    return 1\n";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn paths(doc: &SnapshotDocument) -> Vec<&str> {
    doc.files.iter().map(|f| f.path.as_str()).collect()
}

fn sample_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "main.py", SCENARIO_B);
    write(root, "random_util.py", "x = 1\n");
    write(root, "README.md", "# Title\n");
    write(root, "lib/app.dart", "import 'x.dart';\nclass App {}\n");
    write(root, "lib/Widgets/button.dart", "void main() {}\n");
    write(root, "node_modules/pkg/index.py", "import pkg\n");
    write(root, ".git/hooks/hook.py", "print('x')\n");
    write(root, "build/out.md", "generated\n");
    write(root, "logo.png", "not really a png");
    write(root, "Makefile", "all:\n");
    dir
}

#[test]
fn ignored_directory_is_excluded_with_its_subtree() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".git/inside.py", "a = 1\n");
    write(dir.path(), "outside.py", "b = 2\n");

    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &SnapConfig::default()).unwrap();
    assert_eq!(paths(&asm.document), vec!["outside.py"]);
}

#[test]
fn skeleton_mode_moves_imports_out() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "util.py", SCENARIO_B);

    let asm =
        assemble_snapshot(dir.path(), SnapshotMode::Skeleton, &SnapConfig::default()).unwrap();
    let rec = &asm.document.files[0];
    assert_eq!(rec.content, "\ndef f():\n");
    assert_eq!(rec.imports, vec!["import os"]);
    assert_eq!(rec.language, "py");
}

#[test]
fn full_mode_is_verbatim_without_imports_key() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "util.py", SCENARIO_B);
    let out = dir.path().join("out").join("snap.json");

    export_snapshot(dir.path(), &out, SnapshotMode::Full, &SnapConfig::default()).unwrap();

    let json: serde_json::Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
    let rec = &json["files"][0];
    assert_eq!(rec["content"], SCENARIO_B);
    assert!(rec.get("imports").is_none());
    assert_eq!(json["metadata"]["mode"], "full");
}

#[test]
fn bundles_come_from_the_map_or_default() {
    let dir = sample_tree();
    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &SnapConfig::default()).unwrap();
    let bundle_of = |p: &str| {
        asm.document
            .files
            .iter()
            .find(|f| f.path == p)
            .map(|f| f.bundle.clone())
            .unwrap()
    };
    assert_eq!(bundle_of("main.py"), "01_main.json");
    assert_eq!(bundle_of("README.md"), "30_docs.json");
    assert_eq!(bundle_of("lib/app.dart"), "21_flutter_app.json");
    assert_eq!(bundle_of("random_util.py"), UNSORTED_BUNDLE);
}

#[test]
fn traversal_order_is_dirs_first_case_insensitive() {
    let dir = sample_tree();
    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &SnapConfig::default()).unwrap();
    assert_eq!(
        paths(&asm.document),
        vec![
            "lib/Widgets/button.dart",
            "lib/app.dart",
            "main.py",
            "random_util.py",
            "README.md",
        ]
    );
}

#[test]
fn stats_match_records() {
    let dir = sample_tree();
    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &SnapConfig::default()).unwrap();
    let doc = &asm.document;

    assert_eq!(doc.stats.total_files, doc.files.len());
    for (lang, count) in &doc.stats.by_language {
        let actual = doc.files.iter().filter(|f| &f.language == lang).count();
        assert_eq!(*count, actual, "language {lang}");
    }
    assert_eq!(doc.stats.by_language.get("dart"), Some(&2));
    assert_eq!(doc.stats.by_language.get("py"), Some(&2));
    assert_eq!(doc.stats.by_language.get("md"), Some(&1));
    assert!(doc.stats.by_language.get("png").is_none());
}

#[test]
fn only_allowed_extensions_appear() {
    let dir = sample_tree();
    let cfg = SnapConfig::default();
    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &cfg).unwrap();
    for rec in &asm.document.files {
        let ext = format!(".{}", rec.language);
        assert!(cfg.filters.allowed_extensions.contains(&ext), "{}", rec.path);
        assert_eq!(rec.language, rec.language.to_lowercase());
        assert!(rec.path.to_lowercase().ends_with(&ext));
    }
}

#[test]
fn uppercase_extension_is_lowercased() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Notes.MD", "hi\n");
    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &SnapConfig::default()).unwrap();
    assert_eq!(asm.document.files[0].language, "md");
    assert_eq!(asm.document.files[0].path, "Notes.MD");
}

#[test]
fn denylisted_files_are_never_exported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "secrets.json", "{\"key\": \"hunter2\"}");
    write(dir.path(), "settings.json", "{}");

    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &SnapConfig::default()).unwrap();
    assert_eq!(paths(&asm.document), vec!["settings.json"]);
}

#[test]
fn exclusion_globs_drop_matching_paths() {
    let dir = sample_tree();
    let mut cfg = SnapConfig::default();
    cfg.filters.exclusions = vec!["lib/*".into()];

    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &cfg).unwrap();
    assert_eq!(paths(&asm.document), vec!["main.py", "random_util.py", "README.md"]);
}

#[test]
fn unreadable_file_is_skipped_and_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.py"), [0xffu8, 0xfe, 0x00, 0x80]).unwrap();
    write(dir.path(), "good.py", "def ok():\n");

    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &SnapConfig::default()).unwrap();
    assert_eq!(paths(&asm.document), vec!["good.py"]);
    assert_eq!(asm.skipped.len(), 1);
    assert_eq!(asm.skipped[0].path, "bad.py");
    assert!(!asm.skipped[0].reason.is_empty());
}

#[test]
fn exports_are_byte_identical() {
    let dir = sample_tree();
    let out = TempDir::new().unwrap();
    let a = out.path().join("a.json");
    let b = out.path().join("b.json");
    let cfg = SnapConfig::default();

    export_snapshot(dir.path(), &a, SnapshotMode::Blueprint, &cfg).unwrap();
    export_snapshot(dir.path(), &b, SnapshotMode::Blueprint, &cfg).unwrap();
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn output_keeps_non_ascii_text_and_layout() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "notes.txt", "こんにちは ✓\n");
    let out = dir.path().join("Debug").join("x.json");

    let report = export_snapshot(dir.path(), &out, SnapshotMode::Full, &SnapConfig::default()).unwrap();
    assert_eq!(report.stats.total_files, 1);
    assert_eq!(report.output, out);

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("こんにちは ✓"));
    assert!(text.starts_with("{\n  \"metadata\": {"));
    let metadata_at = text.find("\"metadata\"").unwrap();
    let files_at = text.find("\"files\"").unwrap();
    let stats_at = text.find("\"stats\"").unwrap();
    assert!(metadata_at < files_at && files_at < stats_at);

    let doc: SnapshotDocument = serde_json::from_str(&text).unwrap();
    assert_eq!(doc.metadata.project_name, dir.path().file_name().unwrap().to_string_lossy());
}

#[test]
fn missing_root_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    assert!(assemble_snapshot(&missing, SnapshotMode::Full, &SnapConfig::default()).is_err());
}

#[test]
fn project_listing_skips_hidden_and_output_dirs() {
    let dir = TempDir::new().unwrap();
    for name in ["zeta", "Alpha", ".hidden", "Debug"] {
        fs::create_dir_all(dir.path().join(name)).unwrap();
    }
    write(dir.path(), "loose.txt", "x");

    let projects = list_projects(dir.path(), "Debug").unwrap();
    let names: Vec<String> = projects
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["Alpha", "zeta"]);
}

#[test]
fn directory_listing_hides_ignored_dirs() {
    let dir = sample_tree();
    let rules = SnapConfig::default().filter_rules();
    let listing = list_directory(dir.path(), &rules).unwrap();

    let dirs: Vec<String> = listing
        .dirs
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(dirs, vec!["lib"]);
    // every file shows, filtered or not
    assert_eq!(listing.files.len(), 5);
}

#[cfg(unix)]
#[test]
fn unreadable_directory_is_skipped_with_its_subtree() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "locked/inner.py", "a = 1\n");
    write(dir.path(), "visible.py", "b = 2\n");
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // root ignores permission bits
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &SnapConfig::default());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let asm = asm.unwrap();

    assert_eq!(paths(&asm.document), vec!["visible.py"]);
    assert_eq!(asm.skipped.len(), 1);
    assert_eq!(asm.skipped[0].path, "locked");
    assert!(!asm.skipped[0].reason.is_empty());
}

#[test]
fn write_fails_when_parent_is_a_file() {
    let src = TempDir::new().unwrap();
    write(src.path(), "a.py", "x = 1\n");
    let asm = assemble_snapshot(src.path(), SnapshotMode::Full, &SnapConfig::default()).unwrap();

    let out = TempDir::new().unwrap();
    let blocker = out.path().join("blocker");
    fs::write(&blocker, "not a dir").unwrap();

    let result = write_snapshot(&asm.document, &blocker.join("o.json"));
    assert!(matches!(result, Err(SnapError::Io { .. })), "{result:?}");
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a dir");
    assert!(!out.path().join("blocker.tmp").exists());
}

#[test]
fn write_fails_when_destination_is_a_directory() {
    let src = TempDir::new().unwrap();
    write(src.path(), "a.py", "x = 1\n");
    let asm = assemble_snapshot(src.path(), SnapshotMode::Full, &SnapConfig::default()).unwrap();

    let out = TempDir::new().unwrap();
    let dest = out.path().join("dest");
    fs::create_dir(&dest).unwrap();

    let result = write_snapshot(&asm.document, &dest);
    assert!(matches!(result, Err(SnapError::Io { .. })), "{result:?}");
    assert!(dest.is_dir());
    assert!(!out.path().join("dest.tmp").exists());
}

#[test]
fn output_inside_the_tree_is_not_exported_again() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.py", SCENARIO_B);
    let out = dir.path().join("out.json");
    let cfg = SnapConfig::default();

    export_snapshot(dir.path(), &out, SnapshotMode::Full, &cfg).unwrap();
    let first = fs::read(&out).unwrap();
    let report = export_snapshot(dir.path(), &out, SnapshotMode::Full, &cfg).unwrap();
    assert_eq!(report.stats.total_files, 1);
    assert_eq!(fs::read(&out).unwrap(), first);

    let doc: SnapshotDocument = serde_json::from_slice(&first).unwrap();
    assert_eq!(paths(&doc), vec!["main.py"]);
}

#[cfg(unix)]
#[test]
fn directory_symlinks_are_not_followed() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "real/x.md", "# x\n");
    write(dir.path(), "target.txt", "t\n");
    symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
    symlink(dir.path().join("target.txt"), dir.path().join("alias.txt")).unwrap();

    let asm = assemble_snapshot(dir.path(), SnapshotMode::Full, &SnapConfig::default()).unwrap();
    let got = paths(&asm.document);
    assert!(got.contains(&"real/x.md"));
    assert!(!got.iter().any(|p| p.starts_with("link/")));
    assert!(got.contains(&"alias.txt"));
    assert!(got.contains(&"target.txt"));
}
