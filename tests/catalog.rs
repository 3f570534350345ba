mod tests {
    use std::collections::HashSet;

    use dmx_laser_composer::{
        CancelToken, Category, Duration, FrameBuffer, Instant, Pattern, PatternCatalog,
        PatternDescriptor, PatternError, PatternRng, Speed, StepContext,
    };
    use rand::SeedableRng;

    struct Idle;

    impl Pattern for Idle {
        fn advance(&mut self, _ctx: &mut StepContext<'_>) -> Result<Duration, PatternError> {
            Ok(Duration::from_millis(1))
        }
    }

    fn idle_descriptor(name: &'static str) -> PatternDescriptor {
        PatternDescriptor::new(name, Category::Flowing, || -> Box<dyn Pattern> {
            Box::new(Idle)
        })
    }

    #[test]
    fn test_builtin_catalog_size() {
        let catalog = PatternCatalog::builtin();
        assert_eq!(catalog.len(), 18);
        assert_eq!(catalog.in_category(Category::Positional).count(), 8);
        assert_eq!(catalog.in_category(Category::Flashing).count(), 5);
        assert_eq!(catalog.in_category(Category::Flowing).count(), 5);
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let catalog = PatternCatalog::builtin();
        let names: HashSet<&str> = catalog.iter().map(|(_, d)| d.name).collect();
        assert_eq!(names.len(), catalog.len());
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = PatternCatalog::builtin();
        let key = catalog.by_name("circle_zoom_in").unwrap();
        let descriptor = catalog.get(key).unwrap();
        assert_eq!(descriptor.name, "circle_zoom_in");
        assert_eq!(descriptor.category, Category::Flashing);
        assert!(catalog.by_name("disco_ball").is_none());
    }

    #[test]
    fn test_category_from_raw() {
        assert_eq!(Category::from_raw(1), Some(Category::Positional));
        assert_eq!(Category::from_raw(2), Some(Category::Flashing));
        assert_eq!(Category::from_raw(3), Some(Category::Flowing));
        assert_eq!(Category::from_raw(0), None);
        assert_eq!(Category::from_raw(4), None);
        assert_eq!(Category::Flowing.id(), 3);
    }

    #[test]
    fn test_choose_stays_in_category() {
        let catalog = PatternCatalog::builtin();
        let mut rng = PatternRng::seed_from_u64(1);
        for _ in 0..100 {
            let key = catalog.choose(Category::Flowing, &mut rng).unwrap();
            assert_eq!(catalog.get(key).unwrap().category, Category::Flowing);
        }
    }

    #[test]
    fn test_choose_reaches_every_member() {
        let catalog = PatternCatalog::builtin();
        let mut rng = PatternRng::seed_from_u64(9);
        let seen: HashSet<_> = (0..500)
            .map(|_| catalog.choose(Category::Flashing, &mut rng).unwrap())
            .collect();
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_choose_from_empty_category() {
        let catalog = PatternCatalog::new();
        let mut rng = PatternRng::seed_from_u64(0);
        assert!(!catalog.has_category(Category::Positional));
        assert!(catalog.choose(Category::Positional, &mut rng).is_none());
    }

    #[test]
    fn test_register_rejects_duplicate_name() {
        let mut catalog = PatternCatalog::new();
        assert!(catalog.register(idle_descriptor("idle")).is_ok());
        let rejected = catalog.register(idle_descriptor("idle")).unwrap_err();
        assert_eq!(rejected.name, "idle");
        assert_eq!(catalog.len(), 1);
        assert!(catalog.has_category(Category::Flowing));
    }

    #[test]
    fn test_instantiate_gives_fresh_instances() {
        let catalog = PatternCatalog::builtin();
        let key = catalog.by_name("dot_lr").unwrap();
        let descriptor = catalog.get(key).unwrap();
        let frame = FrameBuffer::new();
        let cancel = CancelToken::new();
        let mut rng = PatternRng::seed_from_u64(0);

        let mut first = descriptor.instantiate();
        for _ in 0..5 {
            let mut ctx = StepContext {
                frame: &frame,
                speed: Speed::new(1).unwrap(),
                rng: &mut rng,
                cancel: &cancel,
                now: Instant::now(),
            };
            first.advance(&mut ctx).unwrap();
        }
        assert_eq!(frame.channel(8), Some(37));

        let mut second = descriptor.instantiate();
        let mut ctx = StepContext {
            frame: &frame,
            speed: Speed::new(1).unwrap(),
            rng: &mut rng,
            cancel: &cancel,
            now: Instant::now(),
        };
        second.advance(&mut ctx).unwrap();
        assert_eq!(frame.channel(8), Some(33));
    }
}
