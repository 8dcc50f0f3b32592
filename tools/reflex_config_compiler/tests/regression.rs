use std::path::PathBuf;

use reflex_config_compiler::{
    generate_from_path, parse_config_file, render_generated_config, validate_config,
    ConfigCompilerError,
};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("missing tools dir")
        .parent()
        .expect("missing repo root")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn default_config_compiles_with_expected_constants() {
    let config = repo_root().join("config/reflex.toml");
    let generated = generate_from_path(&config).expect("default config should compile");

    for needle in [
        "pub const TRIP_HISTORY_LEN: usize = 50;",
        "pub const LIVE_HISTORY_LEN: usize = 20;",
        "mode: InjectionMode::Crash,",
        "crash_probability: 0.1,",
        "max_burst_ticks: 2,",
        "fallback_latitude: 28.6139,",
        "floor: 5.0,",
        "alert_above: 75.0,",
        "alert_countdown_ms: 10000,",
        "tick_period_ms: 2000,",
    ] {
        assert!(
            generated.contains(needle),
            "generated output missing `{needle}`"
        );
    }
}

#[test]
fn generation_is_deterministic_for_same_input() {
    let config = fixture("valid_split.toml");
    let first = generate_from_path(&config).expect("first generation failed");
    let second = generate_from_path(&config).expect("second generation failed");
    assert_eq!(first, second);
}

#[test]
fn split_mode_renders_split_variant() {
    let path = fixture("valid_split.toml");
    let config = parse_config_file(&path).expect("fixture should parse");
    validate_config(&config).expect("fixture should validate");
    let rendered = render_generated_config(&config);

    assert!(rendered.contains("mode: InjectionMode::Split,"));
    assert!(rendered.contains("brake_probability: 0.04,"));
    assert!(rendered.contains("acceleration_probability: 0.04,"));
}

#[test]
fn semantic_validation_rejects_invalid_ranges() {
    let cases = [
        (
            "invalid/floor_above_warning.toml",
            "0 <= floor < warning_above < alert_above <= 100",
        ),
        (
            "invalid/zero_burst_ticks.toml",
            "injection.max_burst_ticks must be within 1..=10",
        ),
        (
            "invalid/probability_out_of_range.toml",
            "injection probabilities must be within 0..=1",
        ),
        (
            "invalid/live_exceeds_trip.toml",
            "history.live_len must be <= history.trip_len",
        ),
        (
            "invalid/turn_tiers_inverted.toml",
            "sharp_turn_threshold_rads < severe_turn_threshold_rads",
        ),
    ];

    for (fixture_name, expected_msg) in cases {
        let path = fixture(fixture_name);
        let err = generate_from_path(&path).expect_err("fixture should fail validation");
        match err {
            ConfigCompilerError::Validation(msg) => {
                assert!(
                    msg.contains(expected_msg),
                    "expected validation message containing `{expected_msg}`, got `{msg}`"
                );
            }
            other => panic!("expected validation error, got {other}"),
        }
    }
}

#[test]
fn parse_errors_are_reported_for_schema_mismatches() {
    let cases = [
        ("invalid/missing_history.toml", "history"),
        ("invalid/unknown_mode.toml", "swerve"),
    ];

    for (fixture_name, needle) in cases {
        let err = generate_from_path(&fixture(fixture_name)).expect_err("fixture should fail parsing");
        match err {
            ConfigCompilerError::Parse(msg) => {
                assert!(
                    msg.contains(needle),
                    "expected parse error mentioning {needle}, got `{msg}`"
                );
            }
            other => panic!("expected parse error, got {other}"),
        }
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = generate_from_path(&fixture("does_not_exist.toml")).expect_err("should fail");
    assert!(matches!(err, ConfigCompilerError::Io(_)));
}
