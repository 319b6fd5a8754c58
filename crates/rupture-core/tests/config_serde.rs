// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON form of the merger configuration.
#![cfg(feature = "serde")]
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
use rupture_core::{MergerConfig, RuptureKind};

#[test]
fn partial_config_falls_back_to_defaults() {
    let cfg: MergerConfig = serde_json::from_str(r#"{ "workers": 3 }"#).unwrap();
    assert_eq!(
        cfg,
        MergerConfig {
            workers: 3,
            ..MergerConfig::default()
        }
    );
    let empty: MergerConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, MergerConfig::default());
}

#[test]
fn config_survives_json() {
    let cfg = MergerConfig {
        workers: 2,
        progress_interval: 0,
        verbose: true,
    };
    let text = serde_json::to_string(&cfg).unwrap();
    assert_eq!(serde_json::from_str::<MergerConfig>(&text).unwrap(), cfg);
}

#[test]
fn rupture_kind_uses_variant_names() {
    assert_eq!(
        serde_json::to_string(&RuptureKind::MultiCluster).unwrap(),
        "\"MultiCluster\""
    );
}
