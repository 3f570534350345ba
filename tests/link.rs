mod tests {
    use dmx_laser_composer::link;
    use dmx_laser_composer::{Error, Link, NullLink, SerialLink};

    const MISSING_PORT: &str = "/dev/ttyDMX-missing-fixture";

    #[test]
    fn test_missing_port_is_device_unavailable() {
        let err = link::probe_port(MISSING_PORT).unwrap_err();
        match &err {
            Error::DeviceUnavailable { port, reason } => {
                assert_eq!(port, MISSING_PORT);
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(err.to_string().contains(MISSING_PORT));
    }

    #[test]
    fn test_open_missing_port_fails() {
        assert!(SerialLink::open(MISSING_PORT).is_err());
    }

    #[test]
    fn test_null_link_counts_frames() {
        let mut link = NullLink::new();
        link.set_break(true).unwrap();
        link.set_break(false).unwrap();
        link.write_frame(&[0; 513]).unwrap();
        link.write_frame(&[0; 513]).unwrap();
        link.close();
        assert_eq!(link.frames_sent(), 2);
    }
}
