//! Property-based tests for generator and statistics invariants

use crate::events::EventLog;
use crate::generator::{resolve_alphabet, CodeGenerator, DIGITS};
use crate::stats::{rate_per_minute, StatsAggregator};
use crate::types::{AlphabetMode, EngineConfig, LogEvent, LogLevel};
use proptest::prelude::*;

fn arb_alphabet_mode() -> impl Strategy<Value = AlphabetMode> {
    prop_oneof![
        Just(AlphabetMode::Digits),
        Just(AlphabetMode::Lowercase),
        Just(AlphabetMode::Alphanumeric),
        Just(AlphabetMode::Custom),
    ]
}

prop_compose! {
    fn arb_generator_config()
        (
            alphabet in arb_alphabet_mode(),
            custom_alphabet in "[a-zA-Z0-9#@!]{0,12}",
            code_length in 1usize..32usize,
        )
    -> EngineConfig {
        EngineConfig {
            alphabet,
            custom_alphabet,
            code_length,
            ..Default::default()
        }
    }
}

proptest! {
    /// Every generated code has the configured length and only uses
    /// characters of the resolved alphabet.
    #[test]
    fn prop_generated_codes_respect_config(config in arb_generator_config(), seed in any::<u64>()) {
        let alphabet = resolve_alphabet(&config);
        prop_assert!(!alphabet.is_empty());

        let mut generator = CodeGenerator::with_seed(&config, seed);
        for _ in 0..16 {
            let code = generator.generate();
            prop_assert_eq!(code.chars().count(), config.code_length);
            prop_assert!(code.chars().all(|c| alphabet.contains(&c)));
        }

        if config.alphabet == AlphabetMode::Custom && config.custom_alphabet.is_empty() {
            prop_assert_eq!(alphabet, DIGITS.chars().collect::<Vec<_>>());
        }
    }

    /// Totals match call counts and valid never exceeds tested.
    #[test]
    fn prop_stats_totals_match_calls(hits in prop::collection::vec(any::<bool>(), 0..200)) {
        let stats = StatsAggregator::new();
        stats.reset();
        for (i, hit) in hits.iter().enumerate() {
            stats.record_attempt();
            if *hit {
                stats.record_valid();
            }
            let snapshot = stats.snapshot();
            prop_assert_eq!(snapshot.tested, i as u64 + 1);
            prop_assert!(snapshot.valid <= snapshot.tested);
        }
        let snapshot = stats.snapshot();
        prop_assert_eq!(snapshot.tested, hits.len() as u64);
        prop_assert_eq!(snapshot.valid, hits.iter().filter(|h| **h).count() as u64);
    }

    #[test]
    fn prop_rate_is_floored_quotient(tested in 0u64..1_000_000, elapsed_secs in 1u64..100_000) {
        let rate = rate_per_minute(tested, elapsed_secs as f64).unwrap();
        let exact = tested as f64 * 60.0 / elapsed_secs as f64;
        prop_assert!(rate as f64 <= exact + 1e-6);
        prop_assert!(exact - (rate as f64) < 1.0 + 1e-6);
    }

    #[test]
    fn prop_event_log_is_bounded(count in 0usize..400, capacity in 1usize..150) {
        let mut log = EventLog::new(capacity);
        for i in 0..count {
            log.push(LogEvent::new(LogLevel::Debug, i.to_string()));
        }
        prop_assert_eq!(log.len(), count.min(capacity));
        if count > 0 {
            prop_assert_eq!(log.iter().last().unwrap().message.clone(), (count - 1).to_string());
        }
    }
}
