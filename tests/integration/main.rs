//! Integration tests for labelcache

mod library_tests {
    use chrono::{Duration, TimeZone, Utc};
    use labelcache::cache::{Cache, Liveness, ManualClock};
    use labelcache::storage::Labels;
    use tempfile::TempDir;

    #[test]
    fn entries_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let labels = Labels::new().with("type", "consensus").with("flavor", "ns");

        let mut cache = Cache::open(temp.path(), 10).unwrap();
        let id = cache.add(&labels, b"network-status-version 3\n").unwrap();
        cache.decref(id).unwrap();
        cache.close();

        let mut cache = Cache::open(temp.path(), 10).unwrap();
        assert_eq!(cache.len(), 1);

        let id = cache.find_first("flavor", "ns").expect("entry reloaded");
        assert_eq!(cache.label(id, "type"), Some("consensus"));
        let body = cache.get_body(id).unwrap();
        assert_eq!(&*body, b"network-status-version 3\n");
    }

    #[test]
    fn idle_entries_unmap_after_cutoff() {
        let temp = TempDir::new().unwrap();
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start);

        let mut cache = Cache::open(temp.path(), 10).unwrap().with_clock(clock.clone());
        let ids: Vec<_> = (0..3)
            .map(|i| {
                let labels = Labels::new().with("n", i.to_string());
                cache.add(&labels, format!("body {i}").as_bytes()).unwrap()
            })
            .collect();

        let target = ids[1];
        cache.get_body(target).unwrap();
        assert_eq!(cache.decref(target).unwrap(), Liveness::Alive(1));
        assert_eq!(cache.entry(target).unwrap().unused_since(), Some(start));

        let report = cache.unmap_lazy(start - Duration::seconds(1));
        assert_eq!(report.unmapped, 0);
        assert!(cache.entry(target).unwrap().is_mapped());

        let report = cache.unmap_lazy(start + Duration::seconds(1));
        assert_eq!(report.unmapped, 1);
        assert!(!cache.entry(target).unwrap().is_mapped());

        // Entries the caller still holds are never unmapped.
        for id in [ids[0], ids[2]] {
            cache.get_body(id).unwrap();
        }
        clock.advance(Duration::hours(1));
        let report = cache.unmap_lazy(Utc::now() + Duration::days(365 * 100));
        assert_eq!(report.unmapped, 0);
        assert!(cache.entry(ids[0]).unwrap().is_mapped());
    }

    #[test]
    fn marked_entries_are_hidden_then_deleted() {
        let temp = TempDir::new().unwrap();
        let mut cache = Cache::open(temp.path(), 10).unwrap();

        let mut ids = Vec::new();
        for digest in ["aa", "bb", "cc"] {
            let labels = Labels::new().with("flavor", "microdesc").with("digest", digest);
            let id = cache.add(&labels, digest.as_bytes()).unwrap();
            cache.decref(id).unwrap();
            ids.push(id);
        }
        cache.mark_for_removal(ids[1]).unwrap();

        let found = cache.find_all(Some("flavor"), "microdesc");
        assert_eq!(found, vec![ids[0], ids[2]]);

        let report = cache.delete_pending(false);
        assert_eq!(report.deleted, 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.backend().file_count(), 2);
        cache.close();

        let cache = Cache::open(temp.path(), 10).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.find_first("digest", "bb").is_none());
    }
}

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command bound to a private object directory and a missing config file
    fn labelcache(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("labelcache");
        cmd.env("LABELCACHE_CONFIG", temp.path().join("config.toml"))
            .env("LABELCACHE_DIR", temp.path().join("objects"))
            .env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("labeled"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("labelcache"));
    }

    #[test]
    fn add_then_cat() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .args(["add", "-l", "type=consensus", "-l", "flavor=ns"])
            .write_stdin("network-status-version 3\n")
            .assert()
            .success()
            .stdout(predicate::str::diff("0\n"));

        labelcache(&temp)
            .args(["cat", "--key", "flavor", "--value", "ns"])
            .assert()
            .success()
            .stdout(predicate::str::diff("network-status-version 3\n"));
    }

    #[test]
    fn add_from_file() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("doc.txt");
        std::fs::write(&input, "hello").unwrap();

        labelcache(&temp)
            .args(["add", "-l", "kind=greeting"])
            .arg(&input)
            .assert()
            .success();

        labelcache(&temp)
            .args(["cat", "-k", "kind", "--value", "greeting"])
            .assert()
            .success()
            .stdout(predicate::str::diff("hello"));
    }

    #[test]
    fn cat_missing_entry_fails() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .args(["cat", "--key", "flavor", "--value", "ns"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("flavor=ns"));
    }

    #[test]
    fn add_rejects_bad_label() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .args(["add", "-l", "novalue"])
            .write_stdin("x")
            .assert()
            .failure();
    }

    #[test]
    fn add_rejects_label_key_with_space() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .args(["add", "-l", "a b=c"])
            .write_stdin("x")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid argument"))
            .stderr(predicate::str::contains("capacity_hint").not());
    }

    #[test]
    fn list_json() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .args(["add", "-l", "flavor=microdesc"])
            .write_stdin("abc")
            .assert()
            .success();

        let output = labelcache(&temp)
            .args(["list", "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["filename"], "0");
        assert_eq!(rows[0]["labels"]["flavor"], "microdesc");
        assert_eq!(rows[0]["size"], 3);
    }

    #[test]
    fn list_empty_json() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .args(["list", "-f", "json"])
            .assert()
            .success()
            .stdout(predicate::str::diff("[]\n"));
    }

    #[test]
    fn remove_deletes_matches() {
        let temp = TempDir::new().unwrap();
        for body in ["one", "two"] {
            labelcache(&temp)
                .args(["add", "-l", "flavor=microdesc"])
                .write_stdin(body)
                .assert()
                .success();
        }
        labelcache(&temp)
            .args(["add", "-l", "flavor=ns"])
            .write_stdin("three")
            .assert()
            .success();

        labelcache(&temp)
            .args(["remove", "-k", "flavor", "--value", "microdesc"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 2 object(s)"));

        labelcache(&temp)
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("2\n"));
    }

    #[test]
    fn stats_runs() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .arg("stats")
            .assert()
            .success()
            .stdout(predicate::str::contains("entries"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("objects"));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        labelcache(&temp)
            .args(["config", "init"])
            .assert()
            .success();
        assert!(temp.path().join("config.toml").exists());
    }
}
