//! End-to-end snapshot runs against a scripted REST node.

use chrono::{TimeZone, Utc};
use cw20_holders::mock::MockLcd;
use cw20_holders::{Coin, HolderRecord};
use cw20_holders_export::config::{Config, Settings};
use cw20_holders_export::snapshot;
use serde_json::json;

const DENOM: &str = "udenom";

fn settings(output: std::path::PathBuf) -> Settings {
    Config {
        output: Some(output),
        denom: Some(DENOM.to_owned()),
        ..Config::default()
    }
    .resolve()
    .unwrap()
}

fn two_holder_chain() -> MockLcd {
    let time = Utc.with_ymd_and_hms(2024, 11, 5, 10, 0, 0).unwrap();
    MockLcd::new()
        .with_block("unicorn-69", 1_000, time)
        .with_page(None, &["addr1", "addr2"])
        .with_balances(
            "addr1",
            vec![Coin::new("uother", 3), Coin::new(DENOM, 500)],
        )
        .with_balances("addr2", vec![Coin::new("uother", 7)])
}

#[tokio::test]
async fn two_holders_single_page() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("token_holders.json");
    let lcd = two_holder_chain();

    let report = snapshot::run(lcd.clone(), &settings(out.clone())).await.unwrap();

    assert_eq!(report.status.height, 1_000, "connectivity checked");
    assert_eq!(lcd.smart_queries(), 1, "short page ends enumeration");
    assert_eq!(
        report.snapshot.holders,
        vec![HolderRecord::new("addr1", 500), HolderRecord::new("addr2", 0)],
        "records"
    );

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(
        written,
        json!([
            {"address": "addr1", "balance": 500},
            {"address": "addr2", "balance": 0}
        ]),
        "file content"
    );
}

#[tokio::test]
async fn repeated_runs_write_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");

    snapshot::run(two_holder_chain(), &settings(first.clone())).await.unwrap();
    snapshot::run(two_holder_chain(), &settings(second.clone())).await.unwrap();

    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap(),
        "byte-identical output"
    );
}

#[tokio::test]
async fn unreachable_chain_aborts_before_querying() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("token_holders.json");
    let lcd = MockLcd::new().with_page(None, &["addr1"]);

    let err = snapshot::run(lcd.clone(), &settings(out.clone())).await.unwrap_err();

    assert!(format!("{err:#}").contains("failed to connect"), "context: {err:#}");
    assert_eq!(lcd.smart_queries(), 0, "no contract query");
    assert!(!out.exists(), "no file written");
}

#[tokio::test]
async fn failed_first_page_exports_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("token_holders.json");
    let time = Utc.with_ymd_and_hms(2024, 11, 5, 10, 0, 0).unwrap();
    let lcd = MockLcd::new()
        .with_block("unicorn-69", 7, time)
        .with_failing_page(None, 500);

    let report = snapshot::run(lcd, &settings(out.clone())).await.unwrap();

    assert!(!report.snapshot.completion.is_complete(), "truncated");
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "[]", "empty snapshot");
}
