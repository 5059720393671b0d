use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;
use tmplmerge::merge::{MergeConfig, Merger, MergeStats};
use tmplmerge::scanner::{Collector, CollectorConfig};

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn merge_roots(roots: Vec<PathBuf>, target: &Path) -> MergeStats {
    let collector = Collector::new(
        roots,
        CollectorConfig::with_extensions(["yaml", "yml"]).excluding(target.to_path_buf()),
    );
    Merger::new(MergeConfig::new(target.to_path_buf()).with_io_threads(2))
        .merge(collector.walk())
        .unwrap()
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_identical_name_and_content_merges_once() {
    let tmp = tempdir().unwrap();
    let (a, b, target) = (tmp.path().join("a"), tmp.path().join("b"), tmp.path().join("m"));
    write(&a.join("x.yaml"), "A");
    write(&b.join("x.yaml"), "A");

    let stats = merge_roots(vec![a, b.clone()], &target);

    assert_eq!(names_in(&target), vec!["x.yaml"]);
    assert_eq!(stats.moved, 1);
    assert_eq!(stats.duplicates, 1);
    // Duplicates stay where they were
    assert!(b.join("x.yaml").exists());
}

#[test]
fn test_same_name_different_content_both_survive() {
    let tmp = tempdir().unwrap();
    let (a, b, target) = (tmp.path().join("a"), tmp.path().join("b"), tmp.path().join("m"));
    write(&a.join("x.yaml"), "A");
    write(&b.join("x.yaml"), "B");

    let stats = merge_roots(vec![a, b], &target);

    assert_eq!(names_in(&target), vec!["x.yaml", "x_1.yaml"]);
    assert_eq!(fs::read_to_string(target.join("x.yaml")).unwrap(), "A");
    assert_eq!(fs::read_to_string(target.join("x_1.yaml")).unwrap(), "B");
    assert_eq!(stats.duplicates, 0);
}

#[test]
fn test_missing_root_does_not_stop_run() {
    let tmp = tempdir().unwrap();
    let good = tmp.path().join("good");
    let missing = tmp.path().join("missing");
    let target = tmp.path().join("m");
    write(&good.join("one.yaml"), "1");
    write(&good.join("deep/two.yaml"), "2");
    write(&good.join("deep/er/three.yml"), "3");

    let stats = merge_roots(vec![missing.clone(), good], &target);

    assert_eq!(stats.moved, 3);
    assert_eq!(stats.missing_roots, vec![missing]);
    assert_eq!(stats.error_count(), 0);
    assert_eq!(names_in(&target), vec!["one.yaml", "three.yml", "two.yaml"]);
}

#[test]
fn test_overlapping_roots_move_each_file_once() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("root");
    let sub = root.join("sub");
    let target = tmp.path().join("m");
    write(&sub.join("a.yaml"), "a");
    write(&root.join("b.yaml"), "b");

    let stats = merge_roots(vec![sub.clone(), root], &target);

    assert_eq!(stats.moved, 2);
    assert_eq!(names_in(&target), vec!["a.yaml", "b.yaml"]);
}

#[test]
fn test_names_in_target_are_unique() {
    let tmp = tempdir().unwrap();
    let mut roots = Vec::new();
    for i in 0..5 {
        let root = tmp.path().join(format!("src{i}"));
        write(&root.join("rule.yaml"), &format!("content {i}"));
        write(&root.join("nested/rule.yaml"), &format!("nested {i}"));
        roots.push(root);
    }
    let target = tmp.path().join("m");

    let stats = merge_roots(roots, &target);

    let names = names_in(&target);
    let unique: HashSet<_> = names.iter().collect();
    assert_eq!(stats.moved, 10);
    assert_eq!(names.len(), 10);
    assert_eq!(unique.len(), names.len());
    assert!(names.contains(&"rule_9.yaml".to_string()));
}

#[test]
fn test_other_extensions_are_left_alone() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    let target = tmp.path().join("m");
    write(&src.join("a.YAML"), "upper");
    write(&src.join("b.json"), "json");
    write(&src.join("noext"), "none");
    write(&src.join("c.tar.yml"), "double");

    let stats = merge_roots(vec![src.clone()], &target);

    assert_eq!(stats.candidates, 2);
    assert_eq!(names_in(&target), vec!["a.YAML", "c.tar.yml"]);
    assert!(src.join("b.json").exists());
    assert!(src.join("noext").exists());
}

#[test]
fn test_rerun_after_partial_merge() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    let target = tmp.path().join("m");
    write(&src.join("a.yaml"), "a");

    let first = merge_roots(vec![src.clone()], &target);
    assert_eq!(first.moved, 1);

    // New file with the same name arrives later; the corpus copy is never overwritten
    write(&src.join("a.yaml"), "a");
    let second = merge_roots(vec![src], &target);

    assert_eq!(second.moved, 1);
    assert_eq!(names_in(&target), vec!["a.yaml", "a_1.yaml"]);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    let target = tmp.path().join("m");
    let locked = src.join("locked.yaml");
    write(&locked, "secret");
    write(&src.join("open.yaml"), "open");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits
    if fs::read(&locked).is_ok() {
        return;
    }

    let stats = merge_roots(vec![src], &target);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(stats.moved, 1);
    assert_eq!(stats.error_count(), 1);
    assert!(locked.exists());
}
