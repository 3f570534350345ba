mod tests {
    use std::io::Write;

    use dmx_laser_composer::{Duration, Error, Label, LabelTimeline};

    #[test]
    fn test_timeline_from_sequences() {
        let timeline = LabelTimeline::new(&[1, 0, 3], &[4, 0, 9], 10).unwrap();
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.get(0), Some(Label::new(1, 4)));
        assert!(timeline.get(1).unwrap().is_off());
        assert_eq!(timeline.get(3), None);
        assert_eq!(timeline.tick_period(), Duration::from_millis(100));
        assert_eq!(timeline.duration(), Duration::from_millis(300));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let err = LabelTimeline::new(&[1, 2, 3], &[1, 2], 10).unwrap_err();
        assert!(matches!(err, Error::LabelDataMismatch(_)));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let err = LabelTimeline::new(&[1, 4], &[1, 1], 10).unwrap_err();
        match err {
            Error::LabelDataMismatch(message) => assert!(message.contains("tick 1")),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_negative_values_are_rejected() {
        assert!(LabelTimeline::new(&[-1], &[1], 10).is_err());
        assert!(LabelTimeline::new(&[1], &[-3], 10).is_err());
        assert!(LabelTimeline::new(&[1], &[300], 10).is_err());
    }

    #[test]
    fn test_zero_tick_rate_is_rejected() {
        assert!(LabelTimeline::new(&[1], &[1], 0).is_err());
    }

    #[test]
    fn test_timeline_from_typed_labels() {
        let labels = vec![Label::new(2, 7), Label::OFF, Label::new(3, 1)];
        let timeline = LabelTimeline::from_labels(labels.clone(), 20).unwrap();
        assert_eq!(timeline.labels(), labels.as_slice());
        assert_eq!(timeline.duration(), Duration::from_millis(150));

        let err = LabelTimeline::from_labels(vec![Label::new(5, 1)], 10).unwrap_err();
        assert!(matches!(err, Error::LabelDataMismatch(_)));
    }

    #[test]
    fn test_off_sentinel() {
        assert!(Label::OFF.is_off());
        assert!(Label::new(0, 5).is_off());
        assert!(Label::new(2, 0).is_off());
        assert!(!Label::new(2, 5).is_off());
    }

    #[test]
    fn test_json_defaults_tick_rate() {
        let timeline =
            LabelTimeline::from_json_str(r#"{"pattern_labels": [1, 2], "speed_labels": [3, 4]}"#)
                .unwrap();
        assert_eq!(timeline.tick_rate(), 10);
        assert_eq!(timeline.labels(), &[Label::new(1, 3), Label::new(2, 4)]);
    }

    #[test]
    fn test_json_tick_rate_override() {
        let timeline = LabelTimeline::from_json_str(
            r#"{"tick_rate": 20, "pattern_labels": [0], "speed_labels": [0]}"#,
        )
        .unwrap();
        assert_eq!(timeline.tick_period(), Duration::from_millis(50));
    }

    #[test]
    fn test_json_mismatch_is_label_error() {
        let err =
            LabelTimeline::from_json_str(r#"{"pattern_labels": [1], "speed_labels": []}"#)
                .unwrap_err();
        assert!(matches!(err, Error::LabelDataMismatch(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = LabelTimeline::from_json_str("{\"pattern_labels\": [1").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tick_rate": 10, "pattern_labels": [1, 1, 0], "speed_labels": [2, 2, 0]}}"#
        )
        .unwrap();
        let timeline = LabelTimeline::load(file.path()).unwrap();
        assert_eq!(timeline.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = LabelTimeline::load(std::path::Path::new("/nonexistent/labels.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
