pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use conduit::config::{ConduitConfig, EventsConfig};
    use conduit::events::{HandlerResult, SubscribeOptions};
    use conduit::pipeline::{JsonDecode, JsonEncode, ParseInt, Pipeline, PipelineError, keep_if};
    use conduit::*;
    use parking_lot::Mutex;
    use std::fs;
    use std::sync::Arc;

    fn setup() -> Conduit<Reading> {
        Conduit::from_config(&ConduitConfig::default())
    }

    fn encoder() -> Pipeline<Arc<Reading>, Vec<u8>> {
        Pipeline::<Arc<Reading>>::new().add(JsonEncode::new())
    }

    #[tokio::test]
    async fn test_source_publishes_decoded_events() {
        let conduit = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        conduit
            .hub()
            .subscribe_fn(
                "readings",
                move |reading: &Reading| -> HandlerResult {
                    sink.lock().push(reading.clone());
                    Ok(())
                },
                SubscribeOptions::new(),
            )
            .await
            .unwrap();

        let source =
            conduit.source("readings", Pipeline::<String>::new().add(JsonDecode::new())).unwrap();
        let outcome = source.ingest(Reading::new("attic", 21.5).json()).await.unwrap();

        assert_eq!(outcome, Ingest::Published { issued: 1 });
        assert_eq!(*seen.lock(), vec![Reading::new("attic", 21.5)]);
        assert_eq!(source.channel(), "readings");
    }

    #[tokio::test]
    async fn test_source_filtered_value_is_not_published() {
        let conduit = setup();
        let pipeline = Pipeline::<String>::new()
            .add(JsonDecode::<Reading>::new())
            .add(keep_if("plausible", |r: &Reading| r.celsius > -90.0));
        let source = conduit.source("readings", pipeline).unwrap();

        let outcome = source.ingest(Reading::new("probe", -273.0).json()).await.unwrap();

        assert_eq!(outcome, Ingest::Filtered);
        assert!(conduit.hub().last_event("readings").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_source_pipeline_error_reaches_caller() {
        let conduit = Conduit::<i64>::from_config(&ConduitConfig::default());
        let source = conduit.source("counts", Pipeline::<String>::new().add(ParseInt)).unwrap();

        assert_eq!(source.ingest("42".to_owned()).await.unwrap(), Ingest::Published { issued: 0 });

        let err = source.ingest("abc".to_owned()).await.unwrap_err();
        assert!(matches!(err, ConnectorError::Pipeline { source: PipelineError::Stage { .. }, .. }));
        assert_eq!(conduit.hub().last_event("counts").unwrap().as_deref(), Some(&42));
        assert_eq!(conduit.hub().metrics("counts").unwrap().publish_count, 1);
    }

    #[test]
    fn test_invalid_channel_is_rejected_up_front() {
        let conduit = setup();
        let err = conduit.sink("", encoder(), MemoryTransport::new()).unwrap_err();
        assert!(matches!(err, ConnectorError::Hub { .. }));
    }

    #[tokio::test]
    async fn test_sink_sends_encoded_events() {
        let conduit = setup();
        let transport = MemoryTransport::new();
        let sink = conduit.sink("readings", encoder(), transport.clone()).unwrap();

        sink.connect().await.unwrap();
        assert!(sink.is_connected().await);

        conduit.hub().publish("readings", Reading::new("cellar", 12.0)).await.unwrap();
        conduit.hub().publish("elsewhere", Reading::new("roof", 3.0)).await.unwrap();

        let frames = transport.frames();
        assert_eq!(frames.len(), 1);
        let decoded: Reading = serde_json::from_slice(&frames[0]).unwrap();
        assert_eq!(decoded, Reading::new("cellar", 12.0));
    }

    #[tokio::test]
    async fn test_sink_disconnect_stops_delivery() {
        let conduit = setup();
        let transport = MemoryTransport::new();
        let sink = conduit.sink("readings", encoder(), transport.clone()).unwrap();

        sink.connect().await.unwrap();
        conduit.hub().publish("readings", Reading::new("a", 1.0)).await.unwrap();
        sink.disconnect().await.unwrap();
        conduit.hub().publish("readings", Reading::new("b", 2.0)).await.unwrap();

        assert_eq!(transport.frames().len(), 1);
        assert!(!transport.is_connected());
        assert_eq!(conduit.hub().callback_count("readings"), 0);
        assert!(matches!(sink.disconnect().await, Err(ConnectorError::State { .. })));
    }

    #[tokio::test]
    async fn test_sink_refuses_double_connect() {
        let conduit = setup();
        let sink = conduit.sink("readings", encoder(), MemoryTransport::new()).unwrap();

        sink.connect().await.unwrap();
        assert!(matches!(sink.connect().await, Err(ConnectorError::State { .. })));
        assert_eq!(conduit.hub().callback_count("readings"), 1);
    }

    #[tokio::test]
    async fn test_sink_group_is_removed_hub_wide() {
        let conduit = setup();
        let transport = MemoryTransport::new();
        let sink = conduit
            .sink("readings", encoder(), transport.clone())
            .unwrap()
            .with_group("uplink");

        sink.connect().await.unwrap();
        assert_eq!(conduit.hub().unsubscribe_group("uplink"), 1);
        assert!(!sink.is_connected().await);

        conduit.hub().publish("readings", Reading::new("a", 1.0)).await.unwrap();
        assert!(transport.frames().is_empty());

        sink.connect().await.unwrap();
        conduit.hub().publish("readings", Reading::new("b", 2.0)).await.unwrap();
        assert_eq!(transport.frames().len(), 1, "a detached sink can connect again");
    }

    #[tokio::test]
    async fn test_failing_transport_is_isolated() {
        let conduit = setup();
        let transport = BrokenTransport::default();
        let sink = conduit.sink("readings", encoder(), transport.clone()).unwrap();
        let recorder = Arc::new(Mutex::new(0_usize));
        let count = Arc::clone(&recorder);
        conduit
            .hub()
            .subscribe_fn(
                "readings",
                move |_: &Reading| -> HandlerResult {
                    *count.lock() += 1;
                    Ok(())
                },
                SubscribeOptions::new(),
            )
            .await
            .unwrap();

        sink.connect().await.unwrap();
        let issued = conduit.hub().publish("readings", Reading::new("a", 1.0)).await.unwrap();

        assert_eq!(issued, 2);
        assert_eq!(transport.attempts(), 1);
        assert_eq!(*recorder.lock(), 1, "other subscribers still run");
        assert_eq!(conduit.hub().metrics("readings").unwrap().error_count, 1);
    }

    #[tokio::test]
    async fn test_unreachable_transport_does_not_subscribe() {
        let conduit = setup();
        let sink = conduit.sink("readings", encoder(), Unreachable).unwrap();

        let err = sink.connect().await.unwrap_err();

        assert!(matches!(err, ConnectorError::Transport { .. }));
        assert_eq!(conduit.hub().callback_count("readings"), 0);
        assert!(!sink.is_connected().await);
    }

    #[tokio::test]
    async fn test_events_config_drives_hub_options() {
        let config = ConduitConfig {
            events: EventsConfig { wait_for_subscribers: false },
            ..ConduitConfig::default()
        };
        let conduit = Conduit::<Reading>::from_config(&config);

        assert!(!conduit.hub().options().waits_for_subscribers());
        assert_eq!(conduit.config(), &config);
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conduit.toml");
        fs::write(&path, "[events]\nwait_for_subscribers = false\n").unwrap();

        let conduit = Conduit::<Reading>::load(Some(&path)).unwrap();
        assert!(!conduit.hub().options().waits_for_subscribers());
    }

    #[test]
    fn test_features_are_reported() {
        assert!(features::is_enabled("json"));
        assert!(!features::is_enabled("surreal"));
    }
}
