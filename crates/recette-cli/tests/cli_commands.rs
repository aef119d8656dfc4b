#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const GOOD_RECIPE: &str = "\
# Mousse au chocolat
## ingrédients
chocolat
oeufs
## étapes
fondre chocolat
incorporer oeufs
dans saladier
";

const BAD_RECIPE: &str = "\
# Mousse
## ingrédients
chocolat
chocolat
## étapes
verser lait
sauter
";

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn recette() -> Command {
    Command::cargo_bin("recette").unwrap()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_clean_recipe() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "mousse.rct", GOOD_RECIPE);

    recette()
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("All checks passed"));
}

#[test]
fn check_reports_errors_and_fails() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "mousse.rct", BAD_RECIPE);

    recette()
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicated ingredient"))
        .stderr(predicate::str::contains("unknown ingredient"))
        .stderr(predicate::str::contains("unknown verb or adverb"))
        .stderr(predicate::str::contains("3 errors"));
}

#[test]
fn check_warnings_do_not_fail() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "plat.rct", "# t\n## étapes\ndans plat four\n");

    recette()
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stderr(predicate::str::contains("too many tools"))
        .stderr(predicate::str::contains("1 warning"));
}

#[test]
fn check_picks_assembler_grammar_from_extension() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "hello.mac", "START: MOV #1, R0\nADD ,\n");

    recette()
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2: expected"));
}

#[test]
fn check_grammar_flag_overrides_extension() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "hello.txt", "START: MOV #1, R0\n.END START\n");

    recette()
        .args(["check", "--grammar", "asm"])
        .arg(&file)
        .assert()
        .success();
}

#[test]
fn check_with_custom_vocabulary() {
    let dir = TempDir::new().unwrap();
    let vocabulary = write(&dir, "vocab.json", r#"{ "verbs": ["sauter"], "ingredientVerbs": [] }"#);
    let file = write(&dir, "poele.rct", "# t\n## étapes\nsauter\n");

    recette()
        .arg("check")
        .arg(&file)
        .arg("--vocabulary")
        .arg(&vocabulary)
        .assert()
        .success();
}

#[test]
fn check_rejects_invalid_vocabulary() {
    let dir = TempDir::new().unwrap();
    let vocabulary = write(&dir, "vocab.json", r#"{ "ingredientVerbs": ["hacher"] }"#);
    let file = write(&dir, "mousse.rct", GOOD_RECIPE);

    recette()
        .arg("check")
        .arg(&file)
        .arg("--vocabulary")
        .arg(&vocabulary)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid vocabulary"));
}

#[test]
fn check_missing_file() {
    recette()
        .args(["check", "/nonexistent/recette.rct"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// symbols
// ---------------------------------------------------------------------------

#[test]
fn symbols_table() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "mousse.rct", BAD_RECIPE);

    recette()
        .arg("symbols")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("INGREDIENT"))
        .stdout(predicate::str::contains("chocolat"))
        .stdout(predicate::str::contains("duplicated"))
        .stdout(predicate::str::contains("undeclared"));
}

#[test]
fn symbols_json() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "mousse.rct", GOOD_RECIPE);

    let output = recette()
        .args(["symbols", "--json"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success());

    let symbols: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let symbols = symbols.as_array().unwrap();
    assert_eq!(symbols.len(), 2);
    assert_eq!(symbols[0]["name"], "chocolat");
    assert_eq!(symbols[0]["status"], "ok");
    assert_eq!(symbols[0]["definition"]["line"], 2);
    assert_eq!(symbols[1]["usages"], 1);
}

#[test]
fn symbols_lists_assembler_labels() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "hello.asm", "START: MOV #MSG, R1\nMSG: .ASCIZ /hi/\n");

    recette()
        .arg("symbols")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("START"))
        .stdout(predicate::str::contains("2:1"));
}

// ---------------------------------------------------------------------------
// misc
// ---------------------------------------------------------------------------

#[test]
fn help_lists_commands() {
    recette()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("symbols"))
        .stdout(predicate::str::contains("lsp"));
}
