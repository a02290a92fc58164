use assert_cmd::{Command, cargo_bin_cmd};
use tempfile::TempDir;

fn takenote() -> Command {
    cargo_bin_cmd!("takenote")
}

/// Command bound to a scratch data directory with a clean environment.
fn in_dir(dir: &TempDir) -> Command {
    let mut cmd = takenote();
    for key in [
        "TN_CONFIG",
        "TN_USER",
        "TN_PRO",
        "TN_DATA_DIR",
        "TN_STORAGE_BACKEND",
        "TN_TIMEZONE",
        "TN_DEFAULT_FPS"
    ] {
        cmd.env_remove(key);
    }
    cmd.env("TN_LOG_LEVEL", "warn")
        .env("NO_COLOR", "1")
        .arg("--data-dir")
        .arg(dir.path());
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn first_note_id(dir: &TempDir) -> String {
    let json = stdout_of(in_dir(dir).args(["session", "show", "--json"]));
    let session: serde_json::Value = serde_json::from_str(&json).unwrap();
    session["notes"][0]["id"].as_str().unwrap().to_string()
}

mod help_and_version {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_help_flag() {
        takenote()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"))
            .stdout(predicate::str::contains("Commands:"))
            .stdout(predicate::str::contains("export"));
    }

    #[test]
    fn test_version_flag() {
        takenote()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("takenote"));
    }

    #[test]
    fn test_no_args_shows_help() {
        takenote()
            .assert()
            .failure()
            .stderr(predicate::str::contains("Usage:"));
    }

    #[test]
    fn test_note_help_lists_subcommands() {
        takenote()
            .args(["note", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom"))
            .stdout(predicate::str::contains("long"));
    }
}

mod sessions {
    use super::*;
    use predicates::prelude::PredicateBooleanExt;
    use predicates::prelude::predicate;

    #[test]
    fn test_list_empty() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["session", "list", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn test_new_then_list() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["session", "new", "Day 1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created Day 1"));

        in_dir(&dir)
            .args(["session", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Day 1"));
    }

    #[test]
    fn test_free_user_limited_to_one_session() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir).args(["session", "new", "Day 1"]).assert().success();

        in_dir(&dir)
            .args(["session", "new", "Day 2"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Upgrade required"));

        in_dir(&dir)
            .args(["--pro", "session", "new", "Day 2"])
            .assert()
            .success();
    }

    #[test]
    fn test_show_unknown_session() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["session", "show", "session_missing"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Session not found"));
    }

    #[test]
    fn test_sessions_are_per_user() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["--user", "alice", "session", "new", "Alice day"])
            .assert()
            .success();

        in_dir(&dir)
            .args(["--user", "bob", "session", "list", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Alice day").not());
    }
}

mod notes {
    use super::*;
    use predicates::prelude::PredicateBooleanExt;
    use predicates::prelude::predicate;

    #[test]
    fn test_first_note_creates_session() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["note", "add", "Slate 1A"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Slate 1A"));

        in_dir(&dir)
            .args(["session", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Slate 1A"));
    }

    #[test]
    fn test_custom_note_at_given_timecode() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["note", "custom", "10:30:00:12", "Late slate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("10:30:00:12"));
    }

    #[test]
    fn test_custom_note_rejects_bad_timecode() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["note", "custom", "25:00:00:00", "Nope"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid timecode"));
    }

    #[test]
    fn test_empty_note_rejected() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["note", "add", "   "])
            .assert()
            .failure()
            .stderr(predicate::str::contains("must not be empty"));
    }

    #[test]
    fn test_edit_then_delete() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir).args(["note", "add", "Boom in frame"]).assert().success();
        let id = first_note_id(&dir);

        in_dir(&dir)
            .args(["note", "edit", &id, "Boom dipped at end"])
            .assert()
            .success();
        in_dir(&dir).args(["note", "delete", &id]).assert().success();

        in_dir(&dir)
            .args(["session", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Boom").not());

        in_dir(&dir)
            .args(["session", "show", "--all"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Boom dipped at end"))
            .stdout(predicate::str::contains("(deleted)"));

        in_dir(&dir)
            .args(["note", "edit", &id, "Too late"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Note not found"));
    }

    #[test]
    fn test_long_note_reads_text_from_stdin() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["note", "long"])
            .write_stdin("Wide shot, lens flare\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("Wide shot, lens flare"));
    }

    #[test]
    fn test_free_note_limit() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .env("TN_FREE_NOTE_LIMIT", "1")
            .args(["note", "add", "one"])
            .assert()
            .success();

        in_dir(&dir)
            .env("TN_FREE_NOTE_LIMIT", "1")
            .args(["note", "add", "two"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Upgrade required"));
    }

}

mod clock {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_jam_persists_offset_for_notes() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["tc", "--set", "01:00:00:00"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Clock jammed to 01:00:00:00"));

        let json = stdout_of(in_dir(&dir).args(["tc", "--json"]));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["timecode"].as_str().unwrap().starts_with("01:00:"));

        in_dir(&dir)
            .args(["note", "add", "After jam"])
            .assert()
            .success()
            .stdout(predicate::str::contains("01:00:"));
    }

    #[test]
    fn test_tc_json() {
        let dir = TempDir::new().unwrap();
        let json = stdout_of(in_dir(&dir).args(["tc", "--json"]));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["fps"].as_f64(), Some(25.0));
        assert_eq!(value["timecode"].as_str().unwrap().len(), 11);
    }

    #[test]
    fn test_rate_change_on_new_session() {
        let dir = TempDir::new().unwrap();
        let json = stdout_of(in_dir(&dir).args(["tc", "--rate", "29.97", "--json"]));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dropFrame"].as_bool(), Some(true));
        assert!(value["timecode"].as_str().unwrap().contains(';'));
    }

    #[test]
    fn test_rejects_bad_jam() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["tc", "--set", "10:61:00:00"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid timecode"));
    }
}

mod export_and_merge {
    use super::*;
    use predicates::prelude::predicate;

    #[test]
    fn test_csv_export_for_free_user() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["note", "custom", "10:00:00:00", "Mark"])
            .assert()
            .success();

        in_dir(&dir)
            .args(["export", "csv"])
            .assert()
            .success()
            .stdout(predicate::str::contains("10:00:00:00"))
            .stdout(predicate::str::contains("Mark"));
    }

    #[test]
    fn test_edl_export_requires_pro() {
        let dir = TempDir::new().unwrap();
        in_dir(&dir)
            .args(["note", "custom", "10:00:00:00", "Mark"])
            .assert()
            .success();

        in_dir(&dir)
            .args(["export", "edl"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Upgrade required"));

        in_dir(&dir)
            .args(["--pro", "export", "edl"])
            .assert()
            .success()
            .stdout(predicate::str::contains("TITLE:"));
    }

    #[test]
    fn test_export_to_directory_uses_session_name() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        in_dir(&dir).args(["session", "new", "Day 1"]).assert().success();
        in_dir(&dir)
            .args(["--pro", "export", "ale", "--out"])
            .arg(out.path())
            .assert()
            .success();
        assert!(out.path().join("Day 1.ale").exists());
    }

    #[test]
    fn test_merge_files() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("local.json");
        let remote = dir.path().join("remote.json");
        std::fs::write(
            &local,
            r#"{"id":"session_1","name":"Shoot","createdAt":"2025-05-20T09:00:00Z",
                "updatedAt":"2025-05-20T10:05:00Z","fps":25,
                "notes":[{"id":"note_a","timecodeIn":"10:00:00:00","timecodeOut":"10:00:00:00",
                          "text":"A","timestamp":"2025-05-20T10:00:00Z"}]}"#
        )
        .unwrap();
        std::fs::write(
            &remote,
            r#"{"id":"session_1","name":"Shoot","createdAt":"2025-05-20T09:00:00Z",
                "updatedAt":"2025-05-20T10:01:00Z","fps":25,
                "notes":[{"id":"note_c","timecodeIn":"10:02:00:00","timecodeOut":"10:02:00:00",
                          "text":"C","timestamp":"2025-05-20T10:02:00Z"}]}"#
        )
        .unwrap();

        let json = stdout_of(takenote().arg("merge").arg(&local).arg(&remote));
        let merged: serde_json::Value = serde_json::from_str(&json).unwrap();
        let ids: Vec<&str> = merged["notes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["note_a", "note_c"]);
    }

    #[test]
    fn test_merge_needs_one_input() {
        let dir = TempDir::new().unwrap();
        takenote()
            .arg("merge")
            .arg(dir.path().join("a.json"))
            .arg(dir.path().join("b.json"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Neither session file exists"));
    }
}
