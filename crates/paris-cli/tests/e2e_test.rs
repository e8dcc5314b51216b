//! End-to-end tests for the paris-traceroute binary.
//!
//! Each test writes a simulated path to a temporary file, runs the binary
//! against it and checks the JSON printed on stdout.

use serde::Deserialize;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::{Command, Output};

const DESTINATION: &str = "10.0.0.9";

/// Run structure matching the JSON output.
#[derive(Debug, Deserialize)]
struct TracerouteRun {
    run_id: String,
    destination: String,
    outcome: Option<String>,
    error: Option<String>,
    probes_sent: usize,
    hops: Vec<TracerouteHop>,
}

#[derive(Debug, Deserialize)]
struct TracerouteHop {
    ttl: u8,
    replies: Vec<HopReply>,
}

#[derive(Debug, Deserialize)]
struct HopReply {
    ip_address: Option<IpAddr>,
    reachable: bool,
}

/// Writes `json` to a file unique to `name`.
fn write_path(name: &str, json: &str) -> PathBuf {
    let file = std::env::temp_dir().join(format!(
        "paris-traceroute-{}-{}.json",
        name,
        std::process::id()
    ));
    std::fs::write(&file, json).expect("failed to write path file");
    file
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_paris-traceroute"))
        .args(args)
        .output()
        .expect("failed to spawn paris-traceroute")
}

fn parse_run(output: &Output) -> TracerouteRun {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| {
        panic!(
            "invalid JSON output: {}\nstdout: {}\nstderr: {}",
            e,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

#[test]
fn test_cli_reaches_destination() {
    let path = write_path(
        "reach",
        r#"{"hops": ["10.0.0.1", null, "10.0.0.3"], "latency_ms": 1}"#,
    );
    let output = run_cli(&[
        DESTINATION,
        "-q",
        "2",
        "--timeout",
        "50",
        "--path",
        path.to_str().unwrap(),
    ]);
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success());
    let run = parse_run(&output);
    assert!(!run.run_id.is_empty());
    assert_eq!(run.destination, DESTINATION);
    assert_eq!(run.outcome.as_deref(), Some("succeeded"));
    assert_eq!(run.error, None);
    assert_eq!(run.probes_sent, 8);

    let ttls: Vec<u8> = run.hops.iter().map(|h| h.ttl).collect();
    assert_eq!(ttls, vec![1, 2, 3, 4]);
    for hop in &run.hops {
        assert_eq!(hop.replies.len(), 2, "hop {}", hop.ttl);
    }
    assert!(run.hops[1].replies.iter().all(|r| !r.reachable));
    assert!(run.hops[1].replies.iter().all(|r| r.ip_address.is_none()));
    assert_eq!(
        run.hops[2].replies[0].ip_address,
        Some("10.0.0.3".parse().unwrap())
    );
    assert_eq!(
        run.hops[3].replies[0].ip_address,
        Some(DESTINATION.parse().unwrap())
    );
}

#[test]
fn test_cli_stops_at_max_hops() {
    let path = write_path(
        "exhaust",
        r#"{"hops": ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"]}"#,
    );
    let output = run_cli(&[
        DESTINATION,
        "-m",
        "3",
        "-q",
        "1",
        "--path",
        path.to_str().unwrap(),
    ]);
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success());
    let run = parse_run(&output);
    assert_eq!(run.outcome.as_deref(), Some("exhausted"));
    assert_eq!(run.hops.len(), 3);
    assert_eq!(run.probes_sent, 3);
}

#[test]
fn test_cli_gives_up_after_silent_hops() {
    let path = write_path("silent", r#"{"hops": [null, null, null, null, null]}"#);
    let output = run_cli(&[
        DESTINATION,
        "-q",
        "1",
        "--timeout",
        "20",
        "--path",
        path.to_str().unwrap(),
    ]);
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success());
    let run = parse_run(&output);
    assert_eq!(run.outcome.as_deref(), Some("given_up"));
    assert_eq!(run.hops.len(), 3);
}

#[test]
fn test_cli_starts_at_first_ttl() {
    let output = run_cli(&[DESTINATION, "-f", "4", "-q", "1"]);

    assert!(output.status.success());
    let run = parse_run(&output);
    assert_eq!(run.outcome.as_deref(), Some("succeeded"));
    assert_eq!(run.hops.len(), 1);
    assert_eq!(run.hops[0].ttl, 4);
}

#[test]
fn test_cli_rejects_invalid_ttl_range() {
    let output = run_cli(&[DESTINATION, "-f", "5", "-m", "2"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid TTL range"), "stderr: {}", stderr);
}

#[test]
fn test_cli_rejects_invalid_destination() {
    let output = run_cli(&["not-an-address"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_cli_rejects_missing_path_file() {
    let output = run_cli(&[DESTINATION, "--path", "/nonexistent/path.json"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read path file"), "stderr: {}", stderr);
}
