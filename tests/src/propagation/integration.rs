#![cfg(test)]
use std::fs;

use ipsync_common::config::{Config, MatchPolicy, CONFIG_FILE_NAME};
use ipsync_common::network::Address;
use ipsync_core::{FixedResolver, PatchResult, PropagationRunner, RouteProbeResolver};
use tempfile::TempDir;

use super::util::{addr, config, target, write};

/// Mixed batch: one stale endpoint, one missing file, one file without an
/// endpoint. Outcomes must come back in configured order and the batch must
/// not stop at the missing file.
#[test]
fn run_reports_outcomes_in_configured_order() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = write(dir.path(), "a.js", "fetch('http://9.9.9.9:5000/api/questions')");
    let b = dir.path().join("b.js");
    let c = write(dir.path(), "c.js", "no endpoint here");

    let cfg = config(vec![target(&a, None), target(&b, None), target(&c, None)]);
    let report = PropagationRunner::new(cfg, FixedResolver(addr("10.0.0.5")))?.run();

    let statuses: Vec<&str> = report.files.iter().map(|f| f.result.kind()).collect();
    assert_eq!(statuses, vec!["updated", "not-found", "unchanged"]);
    assert_eq!(
        fs::read_to_string(&a)?,
        "fetch('http://10.0.0.5:5000/api/questions')"
    );
    assert!(!b.exists(), "missing target must not be created");
    assert_eq!(fs::read_to_string(&c)?, "no endpoint here");
    assert!(!report.is_total_failure());
    Ok(())
}

#[test]
fn rerun_with_same_address_changes_nothing() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = write(dir.path(), "a.js", "x http://1.2.3.4:5000 y");
    let runner = PropagationRunner::new(
        config(vec![target(&a, None)]),
        FixedResolver(addr("192.168.1.20")),
    )?;

    let first = runner.run();
    let after_first = fs::read_to_string(&a)?;
    let second = runner.run();

    assert!(matches!(first.files[0].result, PatchResult::Updated { replacements: 1 }));
    assert!(matches!(second.files[0].result, PatchResult::Unchanged));
    assert_eq!(fs::read_to_string(&a)?, after_first);
    Ok(())
}

#[test]
fn address_change_is_followed_on_next_run() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = write(dir.path(), "a.js", "const API = 'http://10.10.182.2:5000';");
    let cfg = config(vec![target(&a, None)]);

    PropagationRunner::new(cfg.clone(), FixedResolver(addr("192.168.1.20")))?.run();
    PropagationRunner::new(cfg, FixedResolver(addr("172.16.0.3")))?.run();

    assert_eq!(fs::read_to_string(&a)?, "const API = 'http://172.16.0.3:5000';");
    Ok(())
}

#[test]
fn bare_policy_rewrites_more_than_scoped_policy() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let text = "ip: 192.168.1.5 other: 10.0.0.9";
    let bare = write(dir.path(), "bare.txt", text);
    let scoped = write(dir.path(), "scoped.txt", text);

    let cfg = config(vec![
        target(&bare, Some(MatchPolicy::BareAddress)),
        target(&scoped, Some(MatchPolicy::ScopedUrl)),
    ]);
    let report = PropagationRunner::new(cfg, FixedResolver(addr("1.1.1.1")))?.run();

    assert_eq!(fs::read_to_string(&bare)?, "ip: 1.1.1.1 other: 1.1.1.1");
    assert_eq!(fs::read_to_string(&scoped)?, text);
    assert!(matches!(report.files[0].result, PatchResult::Updated { replacements: 2 }));
    assert!(matches!(report.files[1].result, PatchResult::Unchanged));
    Ok(())
}

#[test]
fn dry_run_leaves_files_untouched() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = write(dir.path(), "a.js", "http://9.9.9.9:5000");

    let report = PropagationRunner::new(config(vec![target(&a, None)]), FixedResolver(addr("10.0.0.5")))?
        .dry_run(true)
        .run();

    assert!(report.dry_run);
    assert_eq!(report.updated(), 1);
    assert_eq!(fs::read_to_string(&a)?, "http://9.9.9.9:5000");
    Ok(())
}

#[test]
fn all_missing_targets_is_total_failure() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let cfg = config(vec![
        target(&dir.path().join("a.js"), None),
        target(&dir.path().join("b.js"), None),
    ]);

    let report = PropagationRunner::new(cfg, FixedResolver(addr("10.0.0.5")))?.run();

    assert!(report.is_total_failure());
    assert_eq!(report.failures().count(), 2);
    Ok(())
}

#[test]
fn config_file_drives_a_run() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    fs::create_dir(dir.path().join("frontend"))?;
    let script = write(
        &dir.path().join("frontend"),
        "script.js",
        "fetch('http://10.10.182.2:8080/api/score')",
    );
    let legacy = write(dir.path(), "legacy.cfg", "server=10.10.182.2\n");
    let cfg_path = write(
        dir.path(),
        CONFIG_FILE_NAME,
        r#"
            port = 8080

            [[targets]]
            path = "frontend/script.js"

            [[targets]]
            path = "legacy.cfg"
            policy = "bare-address"
        "#,
    );

    let cfg = Config::load(&cfg_path)?;
    let report = PropagationRunner::new(cfg, FixedResolver(addr("10.0.0.5")))?.run();

    assert_eq!(report.updated(), 2);
    assert_eq!(report.endpoint.to_string(), "http://10.0.0.5:8080");
    assert_eq!(fs::read_to_string(&script)?, "fetch('http://10.0.0.5:8080/api/score')");
    assert_eq!(fs::read_to_string(&legacy)?, "server=10.0.0.5\n");
    Ok(())
}

#[test]
fn report_serializes_in_order() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = write(dir.path(), "a.js", "http://9.9.9.9:5000");
    let b = dir.path().join("b.js");

    let report = PropagationRunner::new(
        config(vec![target(&a, None), target(&b, None)]),
        FixedResolver(addr("10.0.0.5")),
    )?
    .run();
    let json = serde_json::to_value(&report)?;

    assert_eq!(json["address"], "10.0.0.5");
    assert_eq!(json["endpoint"], "http://10.0.0.5:5000");
    assert_eq!(json["fallback"], false);
    assert_eq!(json["files"][0]["result"]["status"], "updated");
    assert_eq!(json["files"][0]["policy"], "scoped-url");
    assert_eq!(json["files"][1]["result"]["status"], "not-found");
    Ok(())
}

/// An IPv4-mapped override is announced in its IPv4 form, so a bare-address
/// target settles after one run.
#[test]
fn mapped_override_keeps_bare_targets_stable() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = write(dir.path(), "legacy.cfg", "server=10.10.182.2\n");
    let runner = PropagationRunner::new(
        config(vec![target(&a, Some(MatchPolicy::BareAddress))]),
        FixedResolver(addr("::ffff:10.0.0.5")),
    )?;

    let first = runner.run();
    let second = runner.run();

    assert_eq!(first.endpoint.to_string(), "http://10.0.0.5:5000");
    assert!(matches!(first.files[0].result, PatchResult::Updated { replacements: 1 }));
    assert!(matches!(second.files[0].result, PatchResult::Unchanged));
    assert_eq!(fs::read_to_string(&a)?, "server=10.0.0.5\n");
    Ok(())
}

/// Live route lookup. Offline sandboxes are expected to land on the loopback
/// fallback rather than fail the run.
#[test]
fn live_route_lookup_run_always_completes() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = write(dir.path(), "a.js", "http://9.9.9.9:5000");

    let report = PropagationRunner::new(config(vec![target(&a, None)]), RouteProbeResolver::default())?
        .run();

    assert!(!report.address.ip().is_unspecified());
    if report.fallback {
        assert_eq!(report.address, Address::fallback());
    } else {
        assert!(!report.address.is_loopback());
    }
    assert_eq!(
        fs::read_to_string(&a)?,
        format!("http://{}:5000", report.address)
    );
    Ok(())
}
