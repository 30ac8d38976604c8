//! CLI integration tests for the jsv binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("jsv"))
}

fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_instance_exits_zero() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{"type": "object", "required": ["name"]}"#,
        );
        let instance = write_temp_file(&dir, "instance.json", r#"{"name": "x"}"#);

        cmd()
            .args(["validate", "--schema", schema.to_str().unwrap()])
            .arg(&instance)
            .assert()
            .success()
            .stdout(predicate::str::contains("valid"));
    }

    #[test]
    fn invalid_instance_exits_one() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{"type": "object", "required": ["name"]}"#,
        );
        let instance = write_temp_file(&dir, "instance.json", r#"{}"#);

        cmd()
            .args(["validate", "--schema", schema.to_str().unwrap()])
            .arg(&instance)
            .assert()
            .code(1)
            .stdout(predicate::str::contains("missing properties"));
    }

    #[test]
    fn flag_output_is_json() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", r#"{"type": "string"}"#);
        let instance = write_temp_file(&dir, "instance.json", "42");

        cmd()
            .args([
                "validate",
                "--schema",
                schema.to_str().unwrap(),
                "--output",
                "flag",
            ])
            .arg(&instance)
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#"{"valid":false}"#));
    }

    #[test]
    fn basic_output_lists_locations() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{"properties": {"age": {"type": "integer"}}}"#,
        );
        let instance = write_temp_file(&dir, "instance.json", r#"{"age": "old"}"#);

        cmd()
            .args([
                "validate",
                "--schema",
                schema.to_str().unwrap(),
                "--output",
                "basic",
            ])
            .arg(&instance)
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""instanceLocation": "/age""#));
    }

    #[test]
    fn assert_format_flag_enables_format_checks() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{"type": "string", "format": "ipv4"}"#,
        );
        let instance = write_temp_file(&dir, "instance.json", r#""999.1.1.1""#);

        // annotation only without the flag
        cmd()
            .args(["validate", "--schema", schema.to_str().unwrap()])
            .arg(&instance)
            .assert()
            .success();

        cmd()
            .args([
                "validate",
                "--schema",
                schema.to_str().unwrap(),
                "--assert-format",
            ])
            .arg(&instance)
            .assert()
            .code(1);
    }

    #[test]
    fn draft_flag_selects_default_draft() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{"items": [{"type": "string"}], "additionalItems": false}"#,
        );
        let ok = write_temp_file(&dir, "ok.json", r#"["a"]"#);
        let bad = write_temp_file(&dir, "bad.json", r#"["a", "b"]"#);

        cmd()
            .args([
                "validate",
                "--schema",
                schema.to_str().unwrap(),
                "--draft",
                "7",
            ])
            .args([&ok, &bad])
            .assert()
            .code(1);

        cmd()
            .args([
                "validate",
                "--schema",
                schema.to_str().unwrap(),
                "--draft",
                "7",
            ])
            .arg(&ok)
            .assert()
            .success();
    }

    #[test]
    fn missing_instance_file_exits_three() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", r#"{"type": "string"}"#);

        cmd()
            .args(["validate", "--schema", schema.to_str().unwrap()])
            .arg(dir.path().join("nope.json"))
            .assert()
            .code(3);
    }

    #[test]
    fn multiple_instances_report_worst_exit() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", r#"{"type": "number"}"#);
        let good = write_temp_file(&dir, "good.json", "3");
        let bad = write_temp_file(&dir, "bad.json", r#""s""#);

        cmd()
            .args(["validate", "--schema", schema.to_str().unwrap()])
            .args([&good, &bad])
            .assert()
            .code(1);
    }
}

mod compile_command {
    use super::*;

    #[test]
    fn valid_schema_compiles() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", r#"{"type": "object"}"#);

        cmd()
            .args(["compile", schema.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("compiled"));
    }

    #[test]
    fn bad_regex_exits_two() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", r#"{"pattern": "["}"#);

        cmd()
            .args(["compile", schema.to_str().unwrap()])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid regex"));
    }

    #[test]
    fn missing_schema_file_exits_three() {
        let dir = TempDir::new().unwrap();

        cmd()
            .args(["compile", dir.path().join("nope.json").to_str().unwrap()])
            .assert()
            .code(3);
    }

    #[test]
    fn unresolvable_ref_exits_two() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(&dir, "schema.json", r##"{"$ref": "#/nope"}"##);

        cmd()
            .args(["compile", schema.to_str().unwrap()])
            .assert()
            .code(2);
    }

    #[test]
    fn assert_vocabs_validates_against_metaschema() {
        let dir = TempDir::new().unwrap();
        let schema = write_temp_file(
            &dir,
            "schema.json",
            r#"{"$schema": "https://json-schema.org/draft/2020-12/schema", "type": 12}"#,
        );

        cmd()
            .args(["compile", schema.to_str().unwrap(), "--assert-vocabs"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("metaschema"));
    }
}
