mod tests {
    use std::thread;
    use std::time::{Duration as StdDuration, Instant as StdInstant};

    use dmx_laser_composer::{
        CancelToken, Engine, LabelTimeline, LinkEvent, PatternCatalog, PlayerConfig, RecordingLink, Speed,
    };

    fn config() -> PlayerConfig {
        PlayerConfig {
            countdown_secs: 0,
            seed: Some(7),
            ..PlayerConfig::default()
        }
    }

    #[test]
    fn test_globals_are_asserted_on_start() {
        let link = RecordingLink::new();
        let engine = Engine::start(link.clone(), &config(), PatternCatalog::builtin()).unwrap();
        thread::sleep(StdDuration::from_millis(60));

        let frames = link.frames();
        assert!(!frames.is_empty());
        assert_eq!(&frames[0][1..4], &[23, 0, 255]);
        assert!(frames[0][4..].iter().all(|&b| b == 0));

        let report = engine.shutdown();
        assert_eq!(report.seed, 7);
        assert_eq!(report.runner.switches, 0);
        assert!(report.schedule.is_none());
    }

    #[test]
    fn test_select_runs_pattern_and_shutdown_blanks() {
        let link = RecordingLink::new();
        let engine = Engine::start(link.clone(), &config(), PatternCatalog::builtin()).unwrap();

        assert!(engine.select("still_beam", Speed::new(5).unwrap()));
        assert!(!engine.select("laser_tag", Speed::new(5).unwrap()));
        thread::sleep(StdDuration::from_millis(200));
        assert_eq!(engine.frame().channel(4), Some(16));

        let report = engine.shutdown();
        assert_eq!(report.runner.switches, 1);
        assert!(report.transmit.frames_sent > 0);
        assert_eq!(report.transmit.write_errors, 0);

        // Full blank reaches the wire before the link is closed.
        let events = link.events();
        assert_eq!(events.last(), Some(&LinkEvent::Closed));
        let last_frame = link.frames().pop().unwrap();
        assert!(last_frame.iter().all(|&b| b == 0));
        assert!(link.is_closed());
    }

    #[test]
    fn test_play_short_show() {
        let link = RecordingLink::new();
        let mut engine = Engine::start(link.clone(), &config(), PatternCatalog::builtin()).unwrap();
        let timeline = LabelTimeline::new(&[1, 1, 0, 2], &[5, 5, 0, 3], 20).unwrap();
        engine.play(timeline).unwrap();

        let deadline = StdInstant::now() + StdDuration::from_secs(5);
        while !engine.is_show_finished() && StdInstant::now() < deadline {
            thread::sleep(StdDuration::from_millis(10));
        }
        assert!(engine.is_show_finished());

        let report = engine.shutdown();
        let schedule = report.schedule.unwrap();
        assert_eq!(schedule.ticks, 4);
        assert_eq!(schedule.decisions, 3);
        assert!(schedule.completed);
        assert!(link.is_closed());
    }

    #[test]
    fn test_cancel_token_stops_show_early() {
        let link = RecordingLink::new();
        let mut engine = Engine::start(link.clone(), &config(), PatternCatalog::builtin()).unwrap();
        let timeline = LabelTimeline::new(&[3; 100], &[4; 100], 10).unwrap();
        engine.play(timeline).unwrap();
        thread::sleep(StdDuration::from_millis(150));

        engine.cancel_token().cancel();
        let report = engine.shutdown();
        let schedule = report.schedule.unwrap();
        assert!(!schedule.completed);
        assert!(schedule.ticks < 100);
        assert!(link.frames().pop().unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_external_token_stops_show() {
        let cancel = CancelToken::new();
        let link = RecordingLink::new();
        let mut engine = Engine::start_with_cancel(
            link.clone(),
            &config(),
            PatternCatalog::builtin(),
            cancel.clone(),
        )
        .unwrap();
        engine.play(LabelTimeline::new(&[1; 100], &[6; 100], 10).unwrap()).unwrap();
        thread::sleep(StdDuration::from_millis(150));

        cancel.cancel();
        assert!(engine.cancel_token().is_cancelled());
        let report = engine.shutdown();
        assert!(!report.schedule.unwrap().completed);
        assert!(link.frames().pop().unwrap().iter().all(|&b| b == 0));
        assert!(link.is_closed());
    }

    #[test]
    fn test_interrupt_before_start_still_blanks() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let link = RecordingLink::new();
        let mut engine =
            Engine::start_with_cancel(link.clone(), &config(), PatternCatalog::builtin(), cancel)
                .unwrap();
        engine.play(LabelTimeline::new(&[2; 50], &[3; 50], 10).unwrap()).unwrap();

        let report = engine.shutdown();
        assert_eq!(report.schedule.unwrap().ticks, 0);
        assert_eq!(report.runner.switches, 0);
        assert!(link.frames().pop().unwrap().iter().all(|&b| b == 0));
        assert_eq!(link.events().last(), Some(&LinkEvent::Closed));
    }

    #[test]
    fn test_same_seed_same_show() {
        let timeline = LabelTimeline::new(&[2, 2, 3, 1], &[4, 4, 4, 4], 20).unwrap();
        let run = || {
            let mut engine =
                Engine::start(RecordingLink::new(), &config(), PatternCatalog::builtin()).unwrap();
            engine.play(timeline.clone()).unwrap();
            let deadline = StdInstant::now() + StdDuration::from_secs(5);
            while !engine.is_show_finished() && StdInstant::now() < deadline {
                thread::sleep(StdDuration::from_millis(10));
            }
            let snapshot = engine.runtime().snapshot();
            engine.shutdown();
            snapshot.selection
        };
        assert_eq!(run(), run());
    }
}
