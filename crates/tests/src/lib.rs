//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - contract smoke tests
//! - mock gateway -> classifier -> store pipelines (no broker needed)
//! - concurrent delivery from many gateway threads
//! - replay file -> SQLite round trips, paced by backpressure

#[cfg(test)]
mod contract_tests {
    use contracts::{PipelineSettings, RoadState};

    #[test]
    fn test_default_settings_are_valid() {
        let settings = PipelineSettings::default();
        config_loader::ConfigLoader::validate(&settings).unwrap();
        assert_eq!(settings.classifier.threshold_height, 1000.0);
        assert_eq!(settings.broker.topic, "agent_data_topic");
    }

    #[test]
    fn test_road_state_names() {
        let names: Vec<_> = RoadState::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, ["smooth", "bump", "pothole"]);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use classifier::RoadClassifier;
    use contracts::{
        ClassifiedRecord, DropPolicy, IngestionConfig, PersistenceGateway, RoadState,
        StorageBackend, StorageConfig,
    };
    use hub_gateway::{HubStore, SqliteHubGateway};
    use ingestion::{sample_payload, IngestionOrchestrator, MockMessageGateway};

    /// Store that records every save, optionally failing some of them
    #[derive(Clone, Default)]
    struct RecordingStore {
        records: Arc<Mutex<Vec<ClassifiedRecord>>>,
        attempts: Arc<Mutex<u64>>,
        fail_every: Option<u64>,
    }

    impl PersistenceGateway for RecordingStore {
        fn name(&self) -> &str {
            "recording"
        }

        async fn save(&mut self, record: &ClassifiedRecord) -> bool {
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                *attempts += 1;
                *attempts
            };
            if self.fail_every.is_some_and(|n| attempt % n == 0) {
                return false;
            }
            self.records.lock().unwrap().push(*record);
            true
        }

        async fn close(&mut self) {}
    }

    fn ingestion_config() -> IngestionConfig {
        IngestionConfig {
            queue_capacity: 64,
            record_queue_capacity: 64,
            drop_policy: DropPolicy::DropNewest,
        }
    }

    /// Mock gateway -> orchestrator -> recording store
    ///
    /// Verifies the full flow:
    /// 1. payloads are decoded and parsed
    /// 2. the classifier emits one record per sample after warm-up
    /// 3. every record reaches the store in arrival order
    #[tokio::test]
    async fn test_e2e_single_bump() {
        let gateway = MockMessageGateway::new("agent_data_topic");
        let injector = gateway.injector();
        let store = RecordingStore::default();
        let records = store.records.clone();

        let mut orchestrator = IngestionOrchestrator::new(
            gateway,
            store,
            RoadClassifier::new(1000.0),
            ingestion_config(),
        );
        orchestrator.start().await.unwrap();

        let readings = [1.0, 1.0, 1.0, 1.0, 2000.0, 1.0, 1.0];
        for (i, z) in readings.into_iter().enumerate() {
            assert!(injector.deliver(sample_payload(z, i as u64)));
        }
        orchestrator.stop().await;

        let saved = records.lock().unwrap().clone();
        let states: Vec<_> = saved.iter().map(|r| r.road_state).collect();
        assert_eq!(
            states,
            [
                RoadState::Smooth,
                RoadState::Smooth,
                RoadState::Smooth,
                RoadState::Bump,
                RoadState::Smooth,
            ]
        );
        assert_eq!(saved[3].sample.vertical(), 2000.0);
        assert!(saved.windows(2).all(|w| w[0].sample.timestamp < w[1].sample.timestamp));

        let snapshot = orchestrator.metrics().snapshot();
        assert_eq!(snapshot.messages_received, 7);
        assert_eq!(snapshot.warming_up, 2);
        assert_eq!(snapshot.bumps, 1);
        assert_eq!(snapshot.records_saved, 5);

        let summary = orchestrator.summary().unwrap();
        assert_eq!(summary.total_records, 5);
        assert_eq!(summary.bumps, 1);
        assert_eq!(summary.potholes, 0);

        orchestrator.shutdown().await;
    }

    /// Malformed payloads are counted and skipped; the window is untouched
    #[tokio::test]
    async fn test_e2e_malformed_payloads_are_skipped() {
        let gateway = MockMessageGateway::new("agent_data_topic");
        let injector = gateway.injector();
        let store = RecordingStore::default();
        let records = store.records.clone();

        let mut orchestrator = IngestionOrchestrator::new(
            gateway,
            store,
            RoadClassifier::new(100.0),
            ingestion_config(),
        );
        orchestrator.start().await.unwrap();

        injector.deliver(sample_payload(0.0, 0));
        injector.deliver("not json");
        injector.deliver(sample_payload(-500.0, 1));
        injector.deliver(&b"\xff\xfe"[..]);
        injector.deliver(r#"{"accelerometer":{"x":0,"y":0},"gps":{"latitude":0,"longitude":0},"timestamp":"2024-02-27T10:00:00.000Z"}"#);
        injector.deliver(sample_payload(0.0, 2));
        orchestrator.stop().await;

        let saved = records.lock().unwrap().clone();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].road_state, RoadState::Pothole);

        let snapshot = orchestrator.metrics().snapshot();
        assert_eq!(snapshot.messages_received, 6);
        assert_eq!(snapshot.parse_errors, 3);
        assert_eq!(snapshot.potholes, 1);

        orchestrator.shutdown().await;
    }

    /// A failing store loses records but never stops the pipeline
    #[tokio::test]
    async fn test_e2e_flaky_store() {
        let gateway = MockMessageGateway::new("agent_data_topic");
        let injector = gateway.injector();
        let store = RecordingStore {
            fail_every: Some(2),
            ..Default::default()
        };
        let records = store.records.clone();

        let mut orchestrator = IngestionOrchestrator::new(
            gateway,
            store,
            RoadClassifier::new(1000.0),
            ingestion_config(),
        );
        orchestrator.start().await.unwrap();
        for i in 0..10 {
            injector.deliver(sample_payload(16384.0, i));
        }
        orchestrator.stop().await;

        let snapshot = orchestrator.metrics().snapshot();
        assert_eq!(snapshot.classified(), 8);
        assert_eq!(snapshot.records_saved, 4);
        assert_eq!(snapshot.save_failures, 4);
        assert_eq!(records.lock().unwrap().len(), 4);

        orchestrator.shutdown().await;
    }

    /// Mock gateway -> orchestrator -> SQLite, then read back
    #[tokio::test]
    async fn test_e2e_sqlite_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("hub").join("agent_data.db");
        let store = HubStore::from_config(&StorageConfig {
            backend: StorageBackend::Sqlite,
            path: db.clone(),
        })
        .unwrap();

        let gateway = MockMessageGateway::new("agent_data_topic");
        let injector = gateway.injector();
        let mut orchestrator = IngestionOrchestrator::new(
            gateway,
            store,
            RoadClassifier::new(1000.0),
            ingestion_config(),
        );
        orchestrator.start().await.unwrap();
        for (i, z) in [0.0, -1500.0, 0.0, 0.0].into_iter().enumerate() {
            injector.deliver(sample_payload(z, i as u64));
        }
        orchestrator.stop().await;
        orchestrator.shutdown().await;

        let reader = SqliteHubGateway::open(&db).unwrap();
        assert_eq!(reader.count().unwrap(), 2);

        let recent = reader.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].road_state, RoadState::Smooth);
        assert_eq!(recent[1].road_state, RoadState::Pothole);
        assert_eq!(recent[1].sample.vertical(), -1500.0);
        assert!(recent.iter().all(|r| r.id.is_some()));

        let mut aggregator = observability::RoadMetricsAggregator::new();
        for record in &recent {
            aggregator.update(record);
        }
        let summary = aggregator.summary();
        assert_eq!(summary.potholes, 1);
        assert_eq!(summary.anomaly_rate, 50.0);
        assert_eq!(summary.anomaly_vertical.min, -1500.0);
    }

    /// Replay file -> orchestrator -> SQLite
    #[tokio::test]
    async fn test_e2e_replay_to_sqlite() {
        use agent_gateway::{ReplayAgentGateway, ReplayConfig};
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("drive.jsonl");
        let db = dir.path().join("agent_data.db");

        let mut file = std::fs::File::create(&input).unwrap();
        for (i, z) in [16000.0, 16000.0, 18000.0, 16000.0, 13000.0, 16000.0]
            .into_iter()
            .enumerate()
        {
            writeln!(file, "{}", sample_payload(z, i as u64)).unwrap();
        }
        writeln!(file).unwrap();
        writeln!(file, "{{ broken").unwrap();
        file.write_all(b"\xff\xfe\x00\n").unwrap();
        drop(file);

        let gateway = ReplayAgentGateway::load(
            &input,
            ReplayConfig {
                interval: Duration::from_millis(1),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(gateway.len(), 8);

        let store = HubStore::from_config(&StorageConfig {
            backend: StorageBackend::Sqlite,
            path: db.clone(),
        })
        .unwrap();
        let mut orchestrator = IngestionOrchestrator::new(
            gateway,
            store,
            RoadClassifier::new(1000.0),
            ingestion_config(),
        );
        orchestrator.start().await.unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !orchestrator.gateway().is_finished() {
            assert!(tokio::time::Instant::now() < deadline, "replay did not finish");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        orchestrator.stop().await;

        let snapshot = orchestrator.metrics().snapshot();
        assert_eq!(snapshot.messages_received, 8);
        assert_eq!(snapshot.parse_errors, 2);
        assert_eq!(snapshot.bumps, 1);
        assert_eq!(snapshot.potholes, 1);
        orchestrator.shutdown().await;

        let reader = SqliteHubGateway::open(&db).unwrap();
        let mut stored: Vec<_> = reader
            .recent(100)
            .unwrap()
            .into_iter()
            .map(|r| r.road_state)
            .collect();
        stored.reverse();
        assert_eq!(
            stored,
            [
                RoadState::Smooth,
                RoadState::Bump,
                RoadState::Smooth,
                RoadState::Pothole,
            ]
        );
    }

    /// Many threads delivering at once still feed one ordered window
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_concurrent_delivery() {
        const THREADS: u64 = 8;
        const PER_THREAD: u64 = 200;
        let total = THREADS * PER_THREAD;

        let gateway = MockMessageGateway::new("agent_data_topic");
        let injector = gateway.injector();
        let store = RecordingStore::default();
        let records = store.records.clone();

        let mut orchestrator = IngestionOrchestrator::new(
            gateway,
            store,
            RoadClassifier::new(1000.0),
            IngestionConfig {
                queue_capacity: total as usize,
                record_queue_capacity: 64,
                drop_policy: DropPolicy::DropNewest,
            },
        );
        orchestrator.start().await.unwrap();

        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let injector = injector.clone();
                scope.spawn(move || {
                    for i in 0..PER_THREAD {
                        let z = if i % 50 == 25 { 5000.0 } else { 0.0 };
                        assert!(injector.deliver(sample_payload(z, t * PER_THREAD + i)));
                    }
                });
            }
        });
        assert_eq!(injector.delivered(), total);
        orchestrator.stop().await;

        let snapshot = orchestrator.metrics().snapshot();
        assert_eq!(snapshot.messages_received, total);
        assert_eq!(snapshot.messages_dropped, 0);
        assert_eq!(snapshot.warming_up, 2);
        assert_eq!(snapshot.classified(), total - 2);
        assert_eq!(snapshot.records_saved, total - 2);
        assert_eq!(records.lock().unwrap().len() as u64, total - 2);
        assert_eq!(orchestrator.classifier().unwrap().window().len(), 3);

        orchestrator.shutdown().await;
    }

    /// An unpaced replay waits for queue space instead of dropping
    #[tokio::test]
    async fn test_e2e_fast_replay_is_lossless() {
        use agent_gateway::{ReplayAgentGateway, ReplayConfig};
        use std::io::Write;

        const LINES: u64 = 2000;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..LINES {
            writeln!(file, "{}", sample_payload((i % 7) as f64 * 100.0, i)).unwrap();
        }

        let gateway = ReplayAgentGateway::load(
            file.path(),
            ReplayConfig {
                interval: Duration::ZERO,
                ..Default::default()
            },
        )
        .unwrap();
        let store = RecordingStore::default();
        let records = store.records.clone();

        let mut orchestrator = IngestionOrchestrator::new(
            gateway,
            store,
            RoadClassifier::new(1000.0),
            IngestionConfig {
                queue_capacity: 8,
                record_queue_capacity: 8,
                drop_policy: DropPolicy::DropNewest,
            },
        );
        orchestrator.start().await.unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while !orchestrator.gateway().is_finished() {
            assert!(tokio::time::Instant::now() < deadline, "replay did not finish");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        orchestrator.stop().await;

        let snapshot = orchestrator.metrics().snapshot();
        assert_eq!(snapshot.messages_received, LINES);
        assert_eq!(snapshot.messages_dropped, 0);
        assert_eq!(snapshot.classified(), LINES - 2);
        assert_eq!(records.lock().unwrap().len() as u64, LINES - 2);

        orchestrator.shutdown().await;
    }

    /// An unreachable broker fails `start()` without wedging the runtime
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_unreachable_broker() {
        use agent_gateway::MqttAgentGateway;
        use contracts::BrokerConfig;

        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let gateway = MqttAgentGateway::new(BrokerConfig {
            host: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        })
        .unwrap();

        let ticker = tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
        });

        let mut orchestrator = IngestionOrchestrator::new(
            gateway,
            RecordingStore::default(),
            RoadClassifier::default(),
            ingestion_config(),
        );
        let err = orchestrator.start().await.unwrap_err();
        assert!(matches!(err, ingestion::IngestionError::Transport(_)));
        assert!(!orchestrator.is_running());

        tokio::time::timeout(Duration::from_secs(5), ticker)
            .await
            .unwrap()
            .unwrap();
        orchestrator.shutdown().await;
    }
}
