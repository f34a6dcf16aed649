//! Integration tests for the aggregation engine

#[cfg(test)]
mod tests {
    use betlab::engine::{aggregate, evaluate, Decision, RejectReason, RollupStats};
    use betlab::metrics::project;
    use betlab::store::RecordStore;
    use betlab::thresholds::{defaults, MarketField, ThresholdConfig, ThresholdPreset};
    use betlab::types::Market;

    const SCENARIO: &str = r#"[
        {"l":"ligue_1","c":"optimal","b":[
            {"m":"home","p":0.50,"e":8,"k":2,"w":1,"pnl":1.5}
        ]}
    ]"#;

    /// Several leagues, two variants, every market, one unknown key
    const MIXED: &str = r#"[
        {"l":"ligue_1","c":"optimal","b":[
            {"m":"home","p":0.55,"e":11,"k":3.2,"w":1,"pnl":0.9,"o":1.9},
            {"m":"draw","p":0.29,"e":10,"k":1.0,"w":0,"pnl":-1,"o":3.9},
            {"m":"over_2_5","p":0.58,"e":6,"k":2.4,"w":1,"pnl":0.85,"o":1.85},
            {"m":"ah_home","p":0.51,"e":7,"k":1.8,"w":0,"pnl":-1,"o":2.1}
        ]},
        {"l":"ligue_1","c":"optimal","b":[
            {"m":"away","p":0.36,"e":9.5,"k":1.2,"w":1,"pnl":2.2,"o":3.2},
            {"m":"under_2_5","p":0.53,"e":5,"k":1.1,"w":1,"pnl":0.95,"o":1.95},
            {"m":"corners","p":0.8,"e":30,"k":9,"w":1,"pnl":0.3}
        ]},
        {"l":"premier_league","c":"optimal","b":[
            {"m":"home","p":0.47,"e":8.5,"k":1.5,"w":0,"pnl":-1,"o":2.3},
            {"m":"ah_away","p":0.49,"e":6.5,"k":1.7,"w":1,"pnl":1.05,"o":2.05},
            {"m":"over_2_5","p":0.51,"e":4,"k":1.9,"w":1,"pnl":0.9,"o":1.9}
        ]},
        {"l":"la_liga","c":"optimal","b":[
            {"m":"draw","p":0.31,"e":14,"k":2.2,"w":1,"pnl":2.4,"o":3.4},
            {"m":"away","p":0.30,"e":12,"k":2.0,"w":0,"pnl":-1,"o":3.5}
        ]},
        {"l":"serie_a","c":"ml_stack","b":[
            {"m":"home","p":0.62,"e":13,"k":4.1,"w":1,"pnl":0.7,"o":1.7}
        ]}
    ]"#;

    fn mixed() -> RecordStore {
        RecordStore::from_json_str(MIXED).unwrap()
    }

    fn assert_partitions(store: &RecordStore, cfg: &ThresholdConfig) {
        let result = aggregate(store, cfg);

        let market_bets: u64 = result.by_market.values().map(|s| s.bet_count()).sum();
        let market_wins: u64 = result.by_market.values().map(|s| s.win_count()).sum();
        assert_eq!(result.global.bet_count(), market_bets);
        assert_eq!(result.global.win_count(), market_wins);

        let league_bets: u64 = result
            .by_league
            .values()
            .flat_map(|markets| markets.values())
            .map(|s| s.bet_count())
            .sum();
        assert_eq!(result.global.bet_count(), league_bets);

        let market_pnl: f64 = result.by_market.values().map(|s| s.total_pnl()).sum();
        assert!((result.global.total_pnl() - market_pnl).abs() < 1e-9);

        for stats in result.by_market.values() {
            assert!(stats.win_count() <= stats.bet_count());
        }
        assert_eq!(
            result.considered,
            result.global.bet_count() + result.skipped.total()
        );
    }

    // ============================================================================
    // Scenario tests
    // ============================================================================

    #[test]
    fn test_single_record_accepted_under_defaults() {
        let store = RecordStore::from_json_str(SCENARIO).unwrap();
        let result = aggregate(&store, &defaults());

        let expected = RollupStats::from_counts(1, 1, 1.5).unwrap();
        assert_eq!(result.global, expected);
        assert_eq!(result.market(Market::Home), expected);
        assert_eq!(
            result.league_market("ligue_1", Market::Home),
            Some(expected)
        );

        let metrics = project(&result.global);
        assert_eq!(metrics.win_rate_percent, Some(100.0));
        assert_eq!(metrics.roi_percent, Some(150.0));
    }

    #[test]
    fn test_single_record_rejected_by_kelly_floor() {
        let store = RecordStore::from_json_str(SCENARIO).unwrap();
        let cfg = defaults().set_kelly_floor(3.0).unwrap();
        let result = aggregate(&store, &cfg);

        assert_eq!(result.global.bet_count(), 0);
        assert!(result.by_market.values().all(|s| s.bet_count() == 0));
        assert!(result
            .by_league
            .values()
            .flat_map(|m| m.values())
            .all(|s| s.bet_count() == 0));
        assert_eq!(result.skipped.below_kelly_floor, 1);

        let metrics = project(&result.global);
        assert_eq!(metrics.win_rate_percent, None);
        assert_eq!(metrics.roi_percent, None);
    }

    #[test]
    fn test_single_record_rejected_when_market_disabled() {
        let store = RecordStore::from_json_str(SCENARIO).unwrap();
        let cfg = defaults()
            .set_market_field(Market::Home, MarketField::Enabled(false))
            .unwrap()
            .set_market_field(Market::Home, MarketField::EdgeFloor(-10.0))
            .unwrap()
            .set_market_field(Market::Home, MarketField::ProbabilityFloor(0.0))
            .unwrap()
            .set_kelly_floor(0.0)
            .unwrap();

        let result = aggregate(&store, &cfg);
        assert_eq!(result.global.bet_count(), 0);
        assert_eq!(result.market(Market::Home).bet_count(), 0);
        assert!(result.by_market.contains_key(&Market::Home));
    }

    // ============================================================================
    // Partition invariants
    // ============================================================================

    #[test]
    fn test_global_equals_sum_of_markets_and_leagues() {
        let store = mixed();
        assert_partitions(&store, &defaults());
        assert_partitions(&store, &defaults().set_kelly_floor(0.0).unwrap());
        assert_partitions(&store, &defaults().set_kelly_floor(2.0).unwrap());
        assert_partitions(&store, &defaults().set_strategy_variant("ml_stack"));
        assert_partitions(&store, &defaults().set_strategy_variant("unknown"));
        assert_partitions(
            &store,
            &defaults()
                .set_market_field(Market::Draw, MarketField::Enabled(false))
                .unwrap()
                .set_market_field(Market::Over25, MarketField::ProbabilityFloor(0.0))
                .unwrap(),
        );
    }

    #[test]
    fn test_mixed_dataset_default_totals() {
        let result = aggregate(&mixed(), &defaults());

        // Rejected: corners (unknown), pl over_2_5 (edge 4 < 5), liga away (30% < 35%)
        assert_eq!(result.considered, 12);
        assert_eq!(result.skipped.unknown_market, 1);
        assert_eq!(result.skipped.below_edge_floor, 1);
        assert_eq!(result.skipped.below_probability_floor, 1);
        assert_eq!(result.global.bet_count(), 9);
        assert_eq!(result.global.win_count(), 6);
        assert_eq!(result.market(Market::Over25).bet_count(), 1);
        assert_eq!(result.market(Market::Draw).bet_count(), 2);

        let leagues: Vec<&str> = result.by_league.keys().map(String::as_str).collect();
        assert_eq!(leagues, vec!["la_liga", "ligue_1", "premier_league"]);
    }

    #[test]
    fn test_variant_selects_working_set() {
        let result = aggregate(&mixed(), &defaults().set_strategy_variant("ml_stack"));
        assert_eq!(result.global.bet_count(), 1);
        assert_eq!(result.by_league.len(), 1);
        assert!(result.by_league.contains_key("serie_a"));
    }

    #[test]
    fn test_unknown_variant_is_empty_not_error() {
        let result = aggregate(&mixed(), &defaults().set_strategy_variant("baseline_v0"));
        assert_eq!(result.considered, 0);
        assert_eq!(result.global, RollupStats::default());
        assert_eq!(result.by_market.len(), Market::ALL.len());
        assert!(result.by_league.is_empty());
    }

    // ============================================================================
    // Filtering rules
    // ============================================================================

    #[test]
    fn test_disabling_each_market_zeroes_its_bucket() {
        let store = mixed();
        for market in Market::ALL {
            let cfg = defaults()
                .set_market_field(market, MarketField::Enabled(false))
                .unwrap();
            let result = aggregate(&store, &cfg);
            assert_eq!(result.market(market).bet_count(), 0, "market {}", market);
            for markets in result.by_league.values() {
                assert_eq!(markets[&market].bet_count(), 0);
            }
        }
    }

    #[test]
    fn test_raising_floors_is_monotonic() {
        let store = mixed();
        let base = defaults().set_kelly_floor(0.0).unwrap();

        for market in Market::ALL {
            let mut prev = u64::MAX;
            for edge in [-10.0, 0.0, 5.0, 8.0, 10.0, 12.0, 20.0, 50.0] {
                let cfg = base
                    .set_market_field(market, MarketField::EdgeFloor(edge))
                    .unwrap();
                let count = aggregate(&store, &cfg).market(market).bet_count();
                assert!(count <= prev);
                prev = count;
            }

            let mut prev = u64::MAX;
            for prob in [0.0, 30.0, 40.0, 50.0, 55.0, 60.0, 100.0] {
                let cfg = base
                    .set_market_field(market, MarketField::ProbabilityFloor(prob))
                    .unwrap();
                let count = aggregate(&store, &cfg).market(market).bet_count();
                assert!(count <= prev);
                prev = count;
            }

            let mut prev = u64::MAX;
            for kelly in [0.0, 1.0, 1.5, 2.0, 3.0, 5.0, 100.0] {
                let cfg = base.set_kelly_floor(kelly).unwrap();
                let count = aggregate(&store, &cfg).market(market).bet_count();
                assert!(count <= prev);
                prev = count;
            }
        }
    }

    #[test]
    fn test_boundary_values_are_included() {
        let store = RecordStore::from_json_str(
            r#"[{"l":"eredivisie","c":"optimal","b":[
                {"m":"home","p":0.5,"e":8,"k":1,"w":1,"pnl":1.2}
            ]}]"#,
        )
        .unwrap();

        // edge 8 == floor 8, 50% == floor 50, kelly 1 == floor 1
        let cfg = defaults()
            .set_market_field(Market::Home, MarketField::ProbabilityFloor(50.0))
            .unwrap();
        let result = aggregate(&store, &cfg);
        assert_eq!(result.market(Market::Home).bet_count(), 1);

        let record = &store.groups()[0].bets[0];
        assert_eq!(evaluate(record, &cfg), Decision::Accept(Market::Home));

        let tighter = cfg
            .set_market_field(Market::Home, MarketField::EdgeFloor(8.01))
            .unwrap();
        assert_eq!(
            evaluate(record, &tighter),
            Decision::Reject(RejectReason::BelowEdgeFloor)
        );

        let tighter = cfg.set_kelly_floor(1.01).unwrap();
        assert_eq!(
            evaluate(record, &tighter),
            Decision::Reject(RejectReason::BelowKellyFloor)
        );
    }

    #[test]
    fn test_probability_on_integer_floor_is_included() {
        let store = RecordStore::from_json_str(
            r#"[{"l":"ligue_1","c":"optimal","b":[
                {"m":"over_2_5","p":0.57,"e":6,"k":2,"w":1,"pnl":0.8},
                {"m":"draw","p":0.29,"e":11,"k":2,"w":0,"pnl":-1}
            ]}]"#,
        )
        .unwrap();

        let cfg = defaults()
            .set_market_field(Market::Over25, MarketField::ProbabilityFloor(57.0))
            .unwrap()
            .set_market_field(Market::Draw, MarketField::ProbabilityFloor(29.0))
            .unwrap();
        let result = aggregate(&store, &cfg);

        assert_eq!(result.global.bet_count(), 2);
        assert_eq!(result.skipped.below_probability_floor, 0);
        assert_eq!(result.market(Market::Over25).bet_count(), 1);
        assert_eq!(result.market(Market::Draw).bet_count(), 1);
    }

    #[test]
    fn test_negative_kelly_never_clears_zero_floor() {
        let store = RecordStore::from_json_str(
            r#"[{"l":"mls","c":"optimal","b":[
                {"m":"away","p":0.35,"e":-4,"k":-0.5,"w":0,"pnl":-1}
            ]}]"#,
        )
        .unwrap();

        assert_eq!(aggregate(&store, &defaults()).global.bet_count(), 0);

        let cfg = defaults()
            .set_market_field(Market::Away, MarketField::EdgeFloor(-5.0))
            .unwrap()
            .set_kelly_floor(0.0)
            .unwrap();
        // kelly -0.5 is still below a zero floor
        assert_eq!(aggregate(&store, &cfg).global.bet_count(), 0);
    }

    // ============================================================================
    // Configuration lifecycle
    // ============================================================================

    #[test]
    fn test_reset_restores_baseline_results() {
        let store = mixed();
        let baseline = aggregate(&store, &defaults());

        let edited = defaults()
            .set_kelly_floor(4.0)
            .unwrap()
            .set_market_field(Market::Home, MarketField::Enabled(false))
            .unwrap();
        assert_ne!(aggregate(&store, &edited), baseline);

        let reset = edited.reset_to_defaults();
        assert_eq!(reset, reset.reset_to_defaults());
        assert_eq!(aggregate(&store, &reset), baseline);
    }

    #[test]
    fn test_preset_drives_aggregation() {
        let preset = ThresholdPreset::from_yaml_str(
            "kelly_floor: 0\nmarkets:\n  over_2_5:\n    edge_floor: 4\n    probability_floor: 50\n",
        )
        .unwrap();
        let cfg = defaults().apply_preset(&preset).unwrap();
        let result = aggregate(&mixed(), &cfg);
        assert_eq!(result.market(Market::Over25).bet_count(), 2);
    }

    #[test]
    fn test_store_shared_across_threads() {
        let store = std::sync::Arc::new(mixed());
        let expected = aggregate(&store, &defaults());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || aggregate(&store, &defaults()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_shipped_sample_and_preset() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
        let store = RecordStore::from_path(root.join("data/sample_backtest.json")).unwrap();
        assert_eq!(store.variants(), vec!["ml_stack", "optimal"]);

        let preset = ThresholdPreset::from_path(root.join("presets/conservative.yaml")).unwrap();
        let tight = defaults().apply_preset(&preset).unwrap();
        assert!(!tight.market(Market::Draw).enabled);

        let base = aggregate(&store, &defaults());
        let narrowed = aggregate(&store, &tight);
        assert!(narrowed.global.bet_count() <= base.global.bet_count());
        assert_eq!(narrowed.market(Market::Draw).bet_count(), 0);
    }

    // ============================================================================
    // Projection
    // ============================================================================

    #[test]
    fn test_projection_never_nan() {
        let result = aggregate(&mixed(), &defaults());
        for stats in result
            .by_market
            .values()
            .chain(result.by_league.values().flat_map(|m| m.values()))
            .chain(std::iter::once(&result.global))
        {
            let metrics = project(stats);
            if stats.bet_count() == 0 {
                assert!(metrics.win_rate_percent.is_none());
                assert!(metrics.roi_percent.is_none());
            } else {
                assert!(metrics.win_rate_percent.unwrap().is_finite());
                assert!(metrics.roi_percent.unwrap().is_finite());
            }
        }
    }
}
