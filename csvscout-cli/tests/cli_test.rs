use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

fn create_test_files(dir: &TempDir, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
    }
    Ok(())
}

// Isolated from any configuration on the machine running the tests
fn csvscout(dir: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("csvscout")?;
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env("RUST_LOG", "warn");
    Ok(cmd)
}

#[test]
fn test_search_file() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("people.csv", "name,age\nAlpha,1\nbravo,2\nCharlie,3\n")])?;

    csvscout(&dir)?
        .args(["search", "people.csv", "-c", "name", "-t", "BRAVO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"bravo\""))
        .stdout(predicate::str::contains("Alpha").not())
        .stderr(predicate::str::contains("Found"));
    Ok(())
}

#[test]
fn test_parallel_directory_search() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[
            ("data/a.csv", "city\nParis\nRome\n"),
            ("data/b.csv", "city\nParma\n"),
            ("data/c.csv", "city\nOslo\n"),
        ],
    )?;

    csvscout(&dir)?
        .args([
            "search",
            "data",
            "-c",
            "city",
            "-t",
            "par",
            "--parallel",
            "--files-per-group",
            "1",
            "--stats",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("3 partitions"));
    Ok(())
}

#[test]
fn test_search_invalid_column() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("people.csv", "name\nAlpha\n")])?;

    csvscout(&dir)?
        .args(["search", "people.csv", "-c", "height"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid search header: height"));
    Ok(())
}

#[test]
fn test_search_missing_file() -> Result<()> {
    let dir = tempdir()?;

    csvscout(&dir)?
        .args(["search", "nope.csv", "-c", "name"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
    Ok(())
}

#[test]
fn test_query_through_config() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[
            ("pop.csv", "\"Data Source\",\"WDI\"\nCountry Name,1960\nAruba,54608\nAngola,5357195\n"),
            (
                "scout.yaml",
                "log_level: warn\ndatasets:\n  data1:\n    path: pop.csv\n    header_offset: 1\n",
            ),
        ],
    )?;

    csvscout(&dir)?
        .args([
            "--config",
            "scout.yaml",
            "query",
            "/search/data1?algorithm=serial&search_header=Country+Name&search_term=ang",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Angola"))
        .stdout(predicate::str::contains("Time taken is"));

    csvscout(&dir)?
        .args(["--config", "scout.yaml", "query", "/search/data1?algorithm=quick"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("400"))
        .stdout(predicate::str::contains("Invalid algorithm"));
    Ok(())
}

#[test]
fn test_missing_config_file() -> Result<()> {
    let dir = tempdir()?;

    csvscout(&dir)?
        .args(["--config", "absent.yaml", "query", "/search/x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
    Ok(())
}
