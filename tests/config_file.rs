// tests/config_file.rs
use keyword_sentinel::config::{load_config_from, StrategyConfig};
use keyword_sentinel::extract::Extractor;
use keyword_sentinel::{IdentityBasis, Monitor};
use std::fs;
use std::path::Path;

#[test]
fn shipped_config_builds_a_monitor() {
    let cfg = load_config_from(Path::new("config/sentinel.toml")).expect("shipped config parses");

    assert_eq!(cfg.source.locations.len(), 2);
    assert_eq!(cfg.history.identity, IdentityBasis::TitleLink);
    assert_eq!(cfg.keywords.groups.len(), 2);
    assert!(matches!(
        cfg.extraction.strategies.last(),
        Some(StrategyConfig::Container { .. })
    ));

    let ex = Extractor::from_config(&cfg.extraction, cfg.source.origin_url().unwrap()).unwrap();
    assert_eq!(ex.strategy_names().len(), cfg.extraction.strategies.len());
    assert!(Monitor::from_config(&cfg).is_ok());
}

#[test]
fn invalid_regex_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("broken.toml");
    fs::write(
        &p,
        r#"
[[extraction.strategies]]
kind = "script_payload"
pattern = '(?P<title>['
"#,
    )
    .unwrap();
    let cfg = load_config_from(&p).unwrap();
    assert!(Monitor::from_config(&cfg).is_err());
}

#[test]
fn unknown_strategy_kind_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("unknown.json");
    fs::write(&p, r#"{"extraction": {"strategies": [{"kind": "xpath"}]}}"#).unwrap();
    assert!(load_config_from(&p).is_err());
}
