use std::fs;
use std::path::Path;

use clap::Parser;
use tempfile::{tempdir, TempDir};
use tmplmerge::cli::Cli;
use tmplmerge::error::ExitCode;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Run the app with an isolated (absent) config file.
fn run(tmp: &TempDir, args: &[&str]) -> anyhow::Result<ExitCode> {
    let config = tmp.path().join("no-config.toml");
    let mut argv = vec![
        "tmplmerge".to_string(),
        "-q".to_string(),
        "--config".to_string(),
        config.to_string_lossy().into_owned(),
    ];
    argv.extend(args.iter().map(|s| (*s).to_string()));
    tmplmerge::run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_run_success() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    let target = tmp.path().join("master");
    write(&src.join("a/x.yaml"), "A");
    write(&src.join("b/x.yaml"), "A");
    write(&src.join("b/y.yaml"), "Y");

    let code = run(
        &tmp,
        &[
            "run",
            "-s",
            src.to_str().unwrap(),
            "-t",
            target.to_str().unwrap(),
            "-c",
            "1",
        ],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(target.join("chunk_1").is_dir());
    assert!(target.join("chunk_2").is_dir());
    assert!(!target.join("chunk_3").exists());
}

#[test]
fn test_run_with_nothing_found() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    write(&src.join("notes.txt"), "not a template");
    let target = tmp.path().join("master");

    let code = run(
        &tmp,
        &["run", "-s", src.to_str().unwrap(), "-t", target.to_str().unwrap()],
    )
    .unwrap();

    assert_eq!(code, ExitCode::NothingToDo);
}

#[test]
fn test_missing_source_with_valid_source() {
    let tmp = tempdir().unwrap();
    let good = tmp.path().join("good");
    let missing = tmp.path().join("missing");
    let target = tmp.path().join("master");
    write(&good.join("1.yaml"), "1");
    write(&good.join("2.yaml"), "2");
    write(&good.join("3.yaml"), "3");

    let code = run(
        &tmp,
        &[
            "merge",
            "-s",
            missing.to_str().unwrap(),
            "-s",
            good.to_str().unwrap(),
            "-t",
            target.to_str().unwrap(),
        ],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read_dir(&target).unwrap().count(), 3);
}

#[test]
fn test_target_that_is_a_file_fails() {
    let tmp = tempdir().unwrap();
    let src = tmp.path().join("src");
    write(&src.join("a.yaml"), "a");
    let target = tmp.path().join("master");
    fs::write(&target, "file").unwrap();

    let result = run(
        &tmp,
        &["merge", "-s", src.to_str().unwrap(), "-t", target.to_str().unwrap()],
    );

    assert!(result.is_err());
}

#[test]
fn test_chunk_subcommand_json_output() {
    let tmp = tempdir().unwrap();
    let target = tmp.path().join("master");
    for i in 0..5 {
        write(&target.join(format!("{i}.yaml")), &i.to_string());
    }

    let code = run(
        &tmp,
        &["chunk", "-t", target.to_str().unwrap(), "-c", "2", "-o", "json"],
    )
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read_dir(target.join("chunk_3")).unwrap().count(), 1);
}

#[test]
fn test_invalid_config_file_fails() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("bad.toml");
    fs::write(&config, "chunk_size = [1, 2]").unwrap();

    let cli = Cli::try_parse_from([
        "tmplmerge",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "chunk",
    ])
    .unwrap();

    assert!(tmplmerge::run_app(cli).is_err());
}
