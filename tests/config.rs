mod tests {
    use std::io::Write;

    use dmx_laser_composer::{Duration, Error, GlobalChannels, PlayerConfig};

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.globals, GlobalChannels::default());
        assert_eq!(config.globals.mode, 23);
        assert_eq!(config.globals.size, 255);
        assert_eq!(config.countdown(), Duration::from_secs(3));
        assert!(config.seed.is_none());

        let timings = config.timings();
        assert_eq!(timings.frame_period, Duration::from_millis(25));
        assert_eq!(timings.break_time, Duration::from_micros(176));
        assert_eq!(timings.mark_after_break, Duration::from_micros(12));
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = PlayerConfig::from_toml_str("").unwrap();
        assert_eq!(config.port, PlayerConfig::default().port);
        assert_eq!(config.frame_period_ms, 25);
    }

    #[test]
    fn test_partial_override() {
        let config = PlayerConfig::from_toml_str(
            r#"
            port = "/dev/ttyACM1"
            seed = 1234
            failure_backoff_ms = 20

            [globals]
            group = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.port, "/dev/ttyACM1");
        assert_eq!(config.seed, Some(1234));
        assert_eq!(config.failure_backoff(), Duration::from_millis(20));
        assert_eq!(config.globals.group, 12);
        assert_eq!(config.globals.mode, 23);
    }

    #[test]
    fn test_invalid_toml() {
        let err = PlayerConfig::from_toml_str("frame_period_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "countdown_secs = 0").unwrap();
        writeln!(file, "break_us = 200").unwrap();
        let config = PlayerConfig::load(file.path()).unwrap();
        assert_eq!(config.countdown(), Duration::from_secs(0));
        assert_eq!(config.timings().break_time, Duration::from_micros(200));
    }
}
