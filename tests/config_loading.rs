use std::error::Error;
use std::io::Write;

use tempfile::NamedTempFile;

use onchange::config::{ConfigFile, load_and_validate};
use onchange::run::WaitPolicy;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

#[test]
fn full_config_parses() -> TestResult {
    let file = write_config(
        r#"
        [watch]
        dir = "app"
        extensions = ["rs", ".toml"]
        ignore = ["target/**", "dist/**"]

        [task.build]
        cmd = "cargo build"

        [task.assets]
        cmd = "npm run bundle"
        nowait = true
        "#,
    )?;

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.watch.dir, "app");
    assert_eq!(cfg.watch.extensions, vec!["rs", ".toml"]);
    assert_eq!(cfg.watch.ignore, vec!["target/**", "dist/**"]);
    assert_eq!(cfg.task.len(), 2);
    assert!(cfg.task["assets"].nowait);
    assert!(!cfg.task["build"].nowait);
    Ok(())
}

#[test]
fn defaults_cover_the_watch_section() -> TestResult {
    let file = write_config(
        r#"
        [task.build]
        cmd = "cargo build"
        "#,
    )?;

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.watch.dir, ".");
    assert!(cfg.watch.extensions.iter().any(|ext| ext == "rs"));
    assert!(cfg.watch.ignore.iter().any(|pat| pat == "target/**"));
    Ok(())
}

#[test]
fn tasks_are_ordered_by_name() -> TestResult {
    let file = write_config(
        r#"
        [task.zeta]
        cmd = "echo z"

        [task.alpha]
        cmd = "echo a"
        "#,
    )?;

    let cfg = load_and_validate(file.path())?;
    let tasks = cfg.tasks();
    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert!(
        tasks
            .iter()
            .all(|t| t.wait_policy == WaitPolicy::MustComplete)
    );
    Ok(())
}

#[test]
fn empty_task_table_is_rejected() -> TestResult {
    let file = write_config("[watch]\ndir = \".\"\n")?;
    assert!(load_and_validate(file.path()).is_err());
    Ok(())
}

#[test]
fn blank_command_is_rejected() -> TestResult {
    let file = write_config(
        r#"
        [task.build]
        cmd = "   "
        "#,
    )?;
    assert!(load_and_validate(file.path()).is_err());
    Ok(())
}

#[test]
fn broken_ignore_glob_is_rejected() -> TestResult {
    let file = write_config(
        r#"
        [watch]
        ignore = ["{"]

        [task.build]
        cmd = "cargo build"
        "#,
    )?;
    assert!(load_and_validate(file.path()).is_err());
    Ok(())
}

#[test]
fn missing_config_file_is_an_error() {
    assert!(load_and_validate("/definitely/not/a/config.toml").is_err());
}

#[test]
fn legacy_command_string_splits_on_double_ampersand() -> TestResult {
    let cfg = ConfigFile::from_command_string("cargo build && cargo test")?;
    let tasks = cfg.tasks();

    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["cmd-1", "cmd-2"]);

    let cmds: Vec<&str> = tasks.iter().map(|t| t.cmd.as_str()).collect();
    assert_eq!(cmds, vec!["cargo build", "cargo test"]);

    assert!(
        tasks
            .iter()
            .all(|t| t.wait_policy == WaitPolicy::MustComplete)
    );
    Ok(())
}

#[test]
fn legacy_command_string_without_commands_is_rejected() {
    assert!(ConfigFile::from_command_string("").is_err());
    assert!(ConfigFile::from_command_string(" && ").is_err());
}
