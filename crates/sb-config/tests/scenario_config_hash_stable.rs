//! The config hash is a pure function of the merged content: stable across
//! calls and source key order, sensitive to values.

use sb_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
backtest:
  capital: "1000000000"
  buy_fee: "0.00035"
  sell_fee: "0.00035"
sample:
  in_sample: { from: "2016-01-01", to: "2021-12-31" }
selection:
  pe: [5.0, 12.0]
  dy: [-0.2, -0.01]
"#;

const BASE_YAML_REORDERED: &str = r#"
selection:
  dy: [-0.2, -0.01]
  pe: [5.0, 12.0]
sample:
  in_sample: { to: "2021-12-31", from: "2016-01-01" }
backtest:
  sell_fee: "0.00035"
  buy_fee: "0.00035"
  capital: "1000000000"
"#;

const OVERLAY_YAML: &str = r#"
backtest:
  buy_fee: "0.001"
selection:
  pe: [0.0, 8.0]
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(
        a.config_hash, b.config_hash,
        "reordering keys in YAML must not change the hash"
    );
}

#[test]
fn overlay_overrides_and_changes_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(base.config_hash, merged.config_hash);

    let fee = merged
        .config_json
        .pointer("/backtest/buy_fee")
        .and_then(|v| v.as_str())
        .unwrap();
    assert_eq!(fee, "0.001");
    // sibling keys survive the merge
    assert_eq!(
        merged.config_json.pointer("/backtest/sell_fee").and_then(|v| v.as_str()),
        Some("0.00035")
    );
    // sequences are replaced, not concatenated
    assert_eq!(
        merged.config_json.pointer("/selection/pe").unwrap(),
        &serde_json::json!([0.0, 8.0])
    );
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}
