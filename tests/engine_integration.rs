//! Filter engine integration tests
//!
//! End-to-end tests driving the public engine API the way an interception
//! transport would. Covers both filtering channels, pass-through, rule
//! mutation while traffic flows, escape predicates, and concurrency.

use a3s_filter::{
    Channel, ChannelCounts, EngineConfig, FilterEngine, FilterError, FrameVerdict, MinMarketCap,
    ResponseVerdict, RuleChange, RuleConfig, RuleSource, RuleStore,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn pulse_item(dev: &str, funder: Option<&str>) -> Value {
    let mut slots = vec![Value::Null; 43];
    slots[0] = json!(format!("pair-{}", dev));
    slots[1] = json!(format!("token-{}", dev));
    slots[2] = json!(dev);
    slots[3] = json!("Token");
    slots[19] = json!(42.5);
    slots[28] = json!(120);
    if let Some(funder) = funder {
        slots[39] = json!({
            "walletAddress": dev,
            "fundingWalletAddress": funder,
            "signature": "sig",
            "amountSol": 1.5,
            "fundedAt": "2025-01-01T00:00:00Z"
        });
    }
    Value::Array(slots)
}

fn pulse_entry(dev: &str, funder: Option<&str>) -> Value {
    let mut entry = json!({
        "pairAddress": format!("pair-{}", dev),
        "tokenAddress": format!("token-{}", dev),
        "devAddress": dev,
        "tokenName": "Token",
        "marketCapSol": 42.5,
        "numHolders": 120
    });
    if let Some(funder) = funder {
        entry["devWalletFunding"] = json!({"fundingWalletAddress": funder});
    }
    entry
}

fn strict_store() -> Arc<RuleStore> {
    Arc::new(RuleStore::new(
        RuleConfig::permissive()
            .with_dev_filter(true)
            .with_funding_filter(true)
            .with_dev_addresses(["Addr1"])
            .with_funder_addresses(["Addr9"]),
    ))
}

fn test_engine(store: &Arc<RuleStore>) -> FilterEngine {
    FilterEngine::new(store.clone(), EngineConfig::default()).unwrap()
}

fn batch_frame(records: Vec<Value>) -> String {
    let n = records.len();
    format!(
        r#"{{"room":"update_pulse_v2","content":{}}}"#,
        json!([records, n])
    )
}

// ─── Array Batch ─────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_keeps_only_allow_listed_pair() {
    let store = strict_store();
    let engine = test_engine(&store);
    let rec_a = pulse_item("Addr1", Some("Addr9"));
    let rec_b = pulse_item("Addr2", Some("Addr9"));

    let out = engine.filter_batch(json!([[rec_a.clone(), rec_b], 2])).unwrap();

    assert_eq!(out, json!([[rec_a], 1]));
    assert_eq!(engine.snapshot().array_batch, ChannelCounts { seen: 2, kept: 1 });
}

#[tokio::test]
async fn test_batch_short_record_dropped_others_kept() {
    let store = strict_store();
    let engine = test_engine(&store);
    let good = pulse_item("Addr1", Some("Addr9"));

    let out = engine
        .filter_batch(json!([[good.clone(), ["short"], good.clone()], 3]))
        .unwrap();

    assert_eq!(out, json!([[good.clone(), good], 2]));
    assert_eq!(engine.snapshot().array_batch, ChannelCounts { seen: 3, kept: 2 });
}

#[tokio::test]
async fn test_batch_default_rules_keep_known_exchange_funding() {
    let store = Arc::new(RuleStore::default());
    let engine = test_engine(&store);
    let kucoin = a3s_filter::config::wallets::KUCOIN;
    let binance = a3s_filter::config::wallets::BINANCE;

    let out = engine
        .filter_batch(json!([
            [
                pulse_item("AnyDev", Some(kucoin)),
                pulse_item("AnyDev", Some(binance)),
                pulse_item("AnyDev", None)
            ],
            3
        ]))
        .unwrap();

    assert_eq!(out[1], 1);
    assert_eq!(out[0][0][39]["fundingWalletAddress"], kucoin);
}

// ─── Object Response ─────────────────────────────────────────────

#[tokio::test]
async fn test_response_funding_only_unchanged() {
    let store = Arc::new(RuleStore::new(
        RuleConfig::permissive()
            .with_funding_filter(true)
            .with_funder_addresses(["Y"]),
    ));
    let engine = test_engine(&store);
    let body = json!({
        "pairs": [{"devAddress": "X", "devWalletFunding": {"fundingWalletAddress": "Y"}}],
        "count": 1
    });

    assert_eq!(engine.filter_response(body.clone()).unwrap(), body);
    assert_eq!(engine.snapshot().object_response, ChannelCounts { seen: 1, kept: 1 });
}

#[tokio::test]
async fn test_response_shape_preserved() {
    let store = strict_store();
    let engine = test_engine(&store);
    let body = json!({
        "pairs": [pulse_entry("Addr1", Some("Addr9")), pulse_entry("Addr2", Some("Addr9"))],
        "count": 2,
        "page": 3,
        "hasMore": true
    });

    let out = engine.filter_response(body).unwrap();

    let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 4);
    assert_eq!(out["count"], 1);
    assert_eq!(out["page"], 3);
    assert_eq!(out["hasMore"], true);
    assert_eq!(out["pairs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_response_custom_list_path() {
    let store = strict_store();
    let config = EngineConfig::from_json(
        r#"{"response": {"listPath": ["data", "items"], "countFields": ["size"]}}"#,
    )
    .unwrap();
    let engine = FilterEngine::new(store, config).unwrap();

    let out = engine
        .filter_response(json!({
            "data": {"items": [pulse_entry("Addr2", None)], "size": 1, "count": 1}
        }))
        .unwrap();

    assert_eq!(out["data"]["items"], json!([]));
    assert_eq!(out["data"]["size"], 0);
    assert_eq!(out["data"]["count"], 1);
}

// ─── Interception ────────────────────────────────────────────────

#[tokio::test]
async fn test_ws_routing_by_room() {
    let store = strict_store();
    let engine = test_engine(&store);

    let filtered = engine
        .handle_ws_text(&batch_frame(vec![
            pulse_item("Addr1", Some("Addr9")),
            pulse_item("Addr2", None),
        ]))
        .unwrap();
    assert!(matches!(filtered, FrameVerdict::Replace(_)));

    let new_pair = r#"{"room":"new_pairs","content":{"token_name":"Fresh"}}"#;
    assert_eq!(engine.handle_ws_text(new_pair).unwrap(), FrameVerdict::Untouched);
    assert_eq!(engine.handle_ws_bytes(new_pair.as_bytes()).unwrap(), FrameVerdict::Untouched);

    let other = r#"{"room":"sol_price","content":181.2}"#;
    assert_eq!(engine.handle_ws_text(other).unwrap(), FrameVerdict::Untouched);

    let s = engine.snapshot();
    assert_eq!(s.array_batch, ChannelCounts { seen: 2, kept: 1 });
    assert_eq!(s.pass_through, ChannelCounts { seen: 2, kept: 2 });
    assert_eq!(s.object_response, ChannelCounts::default());
}

#[tokio::test]
async fn test_http_pulse_endpoint_only() {
    let store = strict_store();
    let engine = test_engine(&store);
    let body = serde_json::to_vec(&json!({
        "pairs": [pulse_entry("Addr2", Some("Addr9"))],
        "count": 1
    }))
    .unwrap();

    assert!(engine.is_target_host("api3.axiom.trade"));
    assert_eq!(
        engine.handle_http_response("POST", "/new-pairs", &body).unwrap(),
        ResponseVerdict::Untouched
    );

    let ResponseVerdict::Replace(out) = engine.handle_http_response("POST", "/pulse", &body).unwrap()
    else {
        panic!("expected the /pulse body to be rewritten");
    };
    let value: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value, json!({"pairs": [], "count": 0}));
}

// ─── Rules ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_rule_mutation_applies_to_next_call() {
    let store = strict_store();
    let engine = test_engine(&store);
    let batch = json!([[pulse_item("Addr2", Some("Addr9"))], 1]);

    assert_eq!(engine.filter_batch(batch.clone()).unwrap()[1], 0);

    store.add_dev_address("Addr2").unwrap();
    assert_eq!(engine.filter_batch(batch.clone()).unwrap()[1], 1);

    store.set_dev_filter(false).unwrap();
    store.set_funding_filter(false).unwrap();
    let out = engine
        .filter_batch(json!([[pulse_item("Anyone", None)], 1]))
        .unwrap();
    assert_eq!(out[1], 1);
}

#[tokio::test]
async fn test_rule_changes_broadcast() {
    let store = strict_store();
    let mut rx = store.subscribe();

    store.add_funder_address(" Addr8 ").unwrap();
    store.set_dev_filter(false).unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        RuleChange::FunderAddressAdded {
            address: "Addr8".to_string()
        }
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        RuleChange::DevFilterToggled { enabled: false }
    );
}

#[tokio::test]
async fn test_unconfigured_store_until_installed() {
    let store = Arc::new(RuleStore::unconfigured());
    let engine = test_engine(&store);

    let err = engine.filter_response(json!({"pairs": []})).unwrap_err();
    assert!(matches!(err, FilterError::ConfigurationUnavailable(_)));

    store.install(RuleConfig::permissive());
    let out = engine
        .filter_response(json!({"pairs": [pulse_entry("X", None)], "count": 1}))
        .unwrap();
    assert_eq!(out["count"], 1);
}

#[tokio::test]
async fn test_escape_predicate_keeps_large_pairs() {
    let store = strict_store();
    let mut engine = test_engine(&store);
    engine.add_predicate(MinMarketCap(40.0));

    let out = engine
        .filter_batch(json!([[pulse_item("Nobody", None)], 1]))
        .unwrap();
    assert_eq!(out[1], 1);
}

// ─── Concurrency ─────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_batches_50_tasks() {
    let store = strict_store();
    let engine = Arc::new(test_engine(&store));

    let mut handles = Vec::new();
    for _ in 0..50 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..20 {
                engine
                    .filter_batch(json!([
                        [
                            pulse_item("Addr1", Some("Addr9")),
                            pulse_item("Addr2", Some("Addr9")),
                            pulse_item("Addr1", None)
                        ],
                        3
                    ]))
                    .unwrap();
                engine.pass_through(json!({"room": "new_pairs"}));
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let s = engine.snapshot();
    assert_eq!(s.get(Channel::ArrayBatch), ChannelCounts { seen: 3_000, kept: 1_000 });
    assert_eq!(s.get(Channel::PassThrough), ChannelCounts { seen: 1_000, kept: 1_000 });
    assert_eq!(s.total().seen, 4_000);
}

#[tokio::test]
async fn test_concurrent_mutation_never_tears_snapshot() {
    let store = strict_store();
    let engine = Arc::new(test_engine(&store));

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..200 {
                store.add_dev_address(&format!("Dev{}", i)).unwrap();
                store.remove_dev_address(&format!("Dev{}", i)).unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..100 {
                let out = engine
                    .filter_batch(json!([[pulse_item("Addr1", Some("Addr9"))], 1]))
                    .unwrap();
                assert_eq!(out[1], 1);
                tokio::task::yield_now().await;
            }
        }));
    }

    writer.await.unwrap();
    for r in readers {
        r.await.unwrap();
    }

    assert_eq!(engine.snapshot().array_batch, ChannelCounts { seen: 800, kept: 800 });
    assert_eq!(store.snapshot().unwrap().dev_addresses.len(), 1);
}
