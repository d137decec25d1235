use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn check_reports_errors_with_positions() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("bad.ahk");
    fs::write(&script, "x := 1\ny := (2\n")?;

    let mut cmd = Command::cargo_bin("ahk2")?;
    cmd.args(["check", script.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("2:6: error: Missing closing \")\""))
        .stderr(predicate::str::contains("1 error(s)"));

    Ok(())
}

#[test]
fn check_passes_clean_script_with_library_include() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let lib = dir.path().join("lib");
    fs::create_dir(&lib)?;
    fs::write(lib.join("Json.ahk"), "Dump(v) => v\n")?;
    let script = dir.path().join("main.ahk");
    fs::write(&script, "#include <Json>\nout := Dump(1)\n")?;

    let mut cmd = Command::cargo_bin("ahk2")?;
    cmd.args(["check", script.to_str().unwrap(), "--lib", lib.to_str().unwrap()]);
    cmd.assert().success().stdout(predicate::str::is_empty());

    Ok(())
}

#[test]
fn check_missing_include_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("main.ahk");
    fs::write(&script, "#include nowhere.ahk\n")?;

    let mut cmd = Command::cargo_bin("ahk2")?;
    cmd.args(["check", script.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("File not found"));

    Ok(())
}

#[test]
fn symbols_prints_json_tree() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("main.ahk");
    fs::write(&script, "class Greeter {\n    Hello() => \"hi\"\n}\n")?;

    let mut cmd = Command::cargo_bin("ahk2")?;
    cmd.args(["symbols", script.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"name\":\"Greeter\""))
        .stdout(predicate::str::contains("\"kind\":\"Class\""))
        .stdout(predicate::str::contains("\"name\":\"Hello\""));

    Ok(())
}

#[test]
fn infer_prints_shapes() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let script = dir.path().join("main.ahk");
    fs::write(&script, "class Box {\n    Get() => [1]\n}\nb := Box()\n")?;

    let mut cmd = Command::cargo_bin("ahk2")?;
    cmd.args(["infer", script.to_str().unwrap(), "5:1", "b.Get()"]);
    cmd.assert().success().stdout(predicate::str::diff("Array\n"));

    Ok(())
}

#[test]
fn config_file_is_used() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let config = dir.path().join("ahk2.json");
    fs::write(&config, r#"{"maxDiagnostics": 1}"#)?;
    let script = dir.path().join("bad.ahk");
    fs::write(&script, "a := (1\nb := [2\n")?;

    let mut cmd = Command::cargo_bin("ahk2")?;
    cmd.args(["check", script.to_str().unwrap(), "--config", config.to_str().unwrap()]);
    cmd.assert().failure().stderr(predicate::str::contains("1 error(s)"));

    Ok(())
}

#[test]
fn rejects_parent_dir_paths() -> Result<(), Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("ahk2")?;
    cmd.args(["check", "../main.ahk"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Parent directory components"));

    Ok(())
}
