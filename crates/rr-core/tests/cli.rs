//! CLI tests for rr-core.
//!
//! Help output, configuration errors, exit codes and the font-free
//! `render --html` path.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

/// Get a Command for the rr-core binary with a clean relay environment.
fn rr_core() -> Command {
    let mut cmd = Command::cargo_bin("rr-core").expect("rr-core binary should exist");
    cmd.env_remove("BOT_TOKEN")
        .env_remove("CHAT_ID")
        .env_remove("RR_REPORT_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Help and version
// ============================================================================

mod help {
    use super::*;

    #[test]
    fn help_lists_commands() {
        rr_core()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"))
            .stdout(predicate::str::contains("render"))
            .stdout(predicate::str::contains("send"));
    }

    #[test]
    fn version_command() {
        rr_core()
            .arg("version")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "rr-core {}",
                env!("CARGO_PKG_VERSION")
            )));
    }

    #[test]
    fn unknown_command_fails() {
        rr_core()
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }
}

// ============================================================================
// Configuration errors
// ============================================================================

mod config_errors {
    use super::*;

    #[test]
    fn send_without_token_exits_10() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.json");
        fs::write(&input, r#"{"department":"IT"}"#).unwrap();

        rr_core()
            .env("CHAT_ID", "1")
            .args(["send", "--input"])
            .arg(&input)
            .assert()
            .code(10)
            .stderr(predicate::str::contains("BOT_TOKEN"));
    }

    #[test]
    fn serve_without_chat_id_exits_10() {
        rr_core()
            .env("BOT_TOKEN", "123:abc")
            .arg("serve")
            .assert()
            .code(10)
            .stderr(predicate::str::contains("CHAT_ID"));
    }

    #[test]
    fn default_command_is_serve() {
        rr_core()
            .assert()
            .code(10)
            .stderr(predicate::str::contains("BOT_TOKEN"));
    }

    #[test]
    fn invalid_port_exits_10() {
        rr_core()
            .env("BOT_TOKEN", "123:abc")
            .env("CHAT_ID", "1")
            .env("PORT", "eighty")
            .arg("serve")
            .assert()
            .code(10)
            .stderr(predicate::str::contains("PORT"));
    }

    #[test]
    fn bad_report_config_exits_10() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("report.json");
        fs::write(&config, "{ not json").unwrap();
        let input = dir.path().join("input.json");
        fs::write(&input, "{}").unwrap();

        rr_core()
            .arg("--report-config")
            .arg(&config)
            .args(["render", "--input"])
            .arg(&input)
            .arg("--html")
            .arg(dir.path().join("out.html"))
            .assert()
            .code(10)
            .stderr(predicate::str::contains("invalid report config"));
    }

    #[test]
    fn out_of_range_limits_exit_10() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("report.json");
        fs::write(&config, r#"{"placeholder":"","limits":{"max_rows":0}}"#).unwrap();
        let input = dir.path().join("input.json");
        fs::write(&input, "{}").unwrap();

        rr_core()
            .arg("--report-config")
            .arg(&config)
            .args(["render", "--input"])
            .arg(&input)
            .arg("--html")
            .arg(dir.path().join("out.html"))
            .assert()
            .code(10)
            .stderr(predicate::str::contains("placeholder"));
    }

    #[test]
    fn unknown_timezone_exits_10() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("report.json");
        fs::write(&config, r#"{"timezone":"Mars/Olympus_Mons"}"#).unwrap();
        let input = dir.path().join("input.json");
        fs::write(&input, "{}").unwrap();

        rr_core()
            .arg("--report-config")
            .arg(&config)
            .args(["render", "--input"])
            .arg(&input)
            .arg("--html")
            .arg(dir.path().join("out.html"))
            .assert()
            .code(10)
            .stderr(predicate::str::contains("timezone"));
    }
}

// ============================================================================
// Local rendering
// ============================================================================

mod render {
    use super::*;

    #[test]
    fn render_html_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.json");
        fs::write(
            &input,
            r#"{"department":"Net<b>work</b>","kpis":{},"open_rows":[{"threat_key":"high","host":"10.0.0.1"}]}"#,
        )
        .unwrap();
        let html_path = dir.path().join("report.html");

        rr_core()
            .args(["render", "--input"])
            .arg(&input)
            .arg("--html")
            .arg(&html_path)
            .assert()
            .success()
            .stdout(predicate::str::is_match(r#""filename":"netbworkb_\d{4}-\d{2}-\d{2}\.pdf""#).unwrap())
            .stdout(predicate::str::contains(r#""pdf":null"#));

        let html = fs::read_to_string(&html_path).unwrap();
        assert!(html.contains("Net&lt;b&gt;work&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
        assert!(html.contains(r#"<span class="badge threat-high">"#));
        assert_eq!(html.matches(r#"<tr class="row">"#).count(), 1);
    }

    #[test]
    fn render_reads_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let html_path = dir.path().join("report.html");

        rr_core()
            .args(["render", "--input", "-", "--html"])
            .arg(&html_path)
            .write_stdin(r#"{"title":"Сводка","text":"строка 1\n  строка 2"}"#)
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""kind":"freeform""#));

        let html = fs::read_to_string(&html_path).unwrap();
        assert!(html.contains("<h1>Сводка</h1>"));
        assert!(html.contains("строка 1\n  строка 2"));
    }

    #[test]
    fn missing_input_exits_21() {
        let dir = tempfile::tempdir().unwrap();
        rr_core()
            .args(["render", "--input"])
            .arg(dir.path().join("missing.json"))
            .arg("--html")
            .arg(dir.path().join("out.html"))
            .assert()
            .code(21)
            .stderr(predicate::str::contains("cannot read"))
            .stdout(predicate::str::contains(r#""ok":false"#))
            .stdout(predicate::str::contains(r#""code":"ERR_IO""#))
            .stdout(predicate::str::contains(r#""exit_code":21"#));
    }

    #[test]
    fn serve_errors_are_not_json() {
        rr_core()
            .arg("serve")
            .assert()
            .code(10)
            .stdout(predicate::str::is_empty());
    }
}
