use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const AUTHOR_NAME: &str = "fake_user";
pub const AUTHOR_EMAIL: &str = "fake_email@email.com";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Initialised repository with three files (`1.txt`, `a/2.txt`,
/// `a/b/3.txt`) committed once
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_minigit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "one".into()));
    write_file(FileSpec::new(repository_dir.path().join("a/2.txt"), "two".into()));
    write_file(FileSpec::new(repository_dir.path().join("a/b/3.txt"), "three".into()));

    run_minigit_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();
    minigit_commit(repository_dir.path(), "Initial commit", 0)
        .assert()
        .success();

    repository_dir
}

/// Linear history of three commits, each changing `1.txt`
#[fixture]
pub fn repository_with_multiple_commits(init_repository_dir: TempDir) -> TempDir {
    let repository_dir = init_repository_dir;

    for (i, content) in ["uno", "eins"].into_iter().enumerate() {
        write_file(FileSpec::new(repository_dir.path().join("1.txt"), content.into()));
        run_minigit_command(repository_dir.path(), &["add", "1.txt"])
            .assert()
            .success();
        minigit_commit(repository_dir.path(), &format!("Change {}", i + 1), i + 1)
            .assert()
            .success();
    }

    repository_dir
}

pub fn run_minigit_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("minigit").expect("Failed to find minigit binary");
    cmd.current_dir(dir)
        .env_remove("GIT_DIR")
        .env_remove("MINIGIT_DEFAULT_BRANCH")
        .env_remove("GIT_COMMITTER_NAME")
        .env_remove("GIT_COMMITTER_EMAIL")
        .env_remove("GIT_COMMITTER_DATE")
        .env("RUST_LOG", "off");
    cmd.args(args);
    cmd
}

/// Commit with a fixed author; `minute` spaces commits apart in time so
/// history order is deterministic
pub fn minigit_commit(dir: &Path, message: &str, minute: usize) -> Command {
    let mut cmd = run_minigit_command(dir, &["commit", "-m", message]);
    with_identity(&mut cmd, minute);
    cmd
}

pub fn with_identity(cmd: &mut Command, minute: usize) {
    cmd.envs([
        ("GIT_AUTHOR_NAME", AUTHOR_NAME.to_string()),
        ("GIT_AUTHOR_EMAIL", AUTHOR_EMAIL.to_string()),
        ("GIT_AUTHOR_DATE", format!("2023-01-01 12:{minute:02}:00 +0000")),
    ]);
}

/// stdout of a successful command, trimmed
pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output)
        .expect("stdout is not UTF-8")
        .trim()
        .to_string()
}

pub fn rev_parse(dir: &Path, revision: &str) -> String {
    stdout_of(&mut run_minigit_command(dir, &["rev-parse", revision]))
}
