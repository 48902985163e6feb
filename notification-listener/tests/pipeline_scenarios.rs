//! End-to-end scenarios through the public listener API

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio_stream::StreamExt;

use notification_listener::core::config::{FeedConfig, ListenerConfig};
use notification_listener::platform::memory::InMemoryPlatform;
use notification_listener::{
    MethodCall, NotificationRecord, NotificationTracker, RawNotification,
};

fn tracker_with(config: ListenerConfig) -> NotificationTracker {
    let host = InMemoryPlatform::default()
        .with_app("com.x", "Example X")
        .into_host();
    NotificationTracker::new(config, host)
}

fn tracker() -> NotificationTracker {
    tracker_with(ListenerConfig::default())
}

#[tokio::test]
async fn repeat_post_updates_the_single_record() {
    let tracker = tracker();
    let pipeline = tracker.pipeline();
    let facade = tracker.facade();

    pipeline
        .ingest(&RawNotification::posted(1, 1000, "com.x").with_title("T").with_text("M"))
        .await;
    let records = facade.list_all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].key, "1000_1");
    assert_eq!(records[0].title, "T");
    assert_eq!(records[0].source_name, "Example X");

    pipeline
        .ingest(&RawNotification::posted(1, 1000, "com.x").with_title("T2").with_text("M"))
        .await;
    let records = facade.list_all().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "T2");
}

#[tokio::test]
async fn filtered_source_never_reaches_store_or_subscriber() {
    let tracker = tracker();
    let facade = tracker.facade();
    let mut stream = facade.subscribe().await;

    facade.set_allow_list(vec!["com.y".to_string()]).await;
    tracker.pipeline().ingest(&RawNotification::posted(1, 1000, "com.x")).await;
    tracker.pipeline().ingest(&RawNotification::posted(2, 1000, "com.y")).await;

    let records = facade.list_all().await;
    assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);

    let first: NotificationRecord = serde_json::from_str(&stream.next().await.unwrap()).unwrap();
    assert_eq!(first.source_id, "com.y");

    facade.unsubscribe().await;
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn clearing_the_allow_list_accepts_everything_again() {
    let tracker = tracker();
    let facade = tracker.facade();

    facade.set_allow_list(vec!["com.y".to_string()]).await;
    facade.set_allow_list(vec![]).await;
    tracker.pipeline().ingest(&RawNotification::posted(1, 1000, "com.x")).await;

    assert_eq!(facade.list_all().await.len(), 1);
}

#[tokio::test]
async fn only_the_latest_subscriber_receives() {
    let tracker = tracker();
    let facade = tracker.facade();
    let mut a = facade.subscribe().await;
    let mut b = facade.subscribe().await;

    tracker.pipeline().ingest(&RawNotification::posted(1, 1000, "com.x")).await;

    assert!(a.next().await.is_none());
    let payload: Value = serde_json::from_str(&b.next().await.unwrap()).unwrap();
    assert_eq!(payload["id"], 1);
    assert_eq!(payload["packageName"], "com.x");
    assert_eq!(payload["appName"], "Example X");
    assert_eq!(payload["eventType"], "posted");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ingestion_and_queries_stay_consistent() {
    let tracker = tracker();
    let pipeline = tracker.pipeline();
    let facade = tracker.facade();

    let producers = (0..50).map(|i| {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            // every id is posted twice; the second post must replace the first
            let raw = RawNotification::posted(i, 1000, "com.x");
            pipeline.ingest(&raw).await;
            pipeline.ingest(&raw.with_title("again")).await;
        })
    });
    let readers = (0..10).map(|_| {
        let facade = facade.clone();
        tokio::spawn(async move {
            let records = facade.list_all().await;
            assert!(records.len() <= 50);
        })
    });

    for result in futures::future::join_all(producers.chain(readers)).await {
        result.unwrap();
    }

    let records = facade.list_all().await;
    assert_eq!(records.len(), 50);
    assert!(records.iter().all(|r| r.title == "again"));
    assert_eq!(tracker.stats().replaced, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn streamed_records_are_already_listed() {
    let tracker = tracker();
    let pipeline = tracker.pipeline();
    let facade = tracker.facade();
    let mut stream = facade.subscribe().await;

    let producers: Vec<_> = (0..50)
        .map(|i| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                pipeline.ingest(&RawNotification::posted(i, 1000, "com.x")).await;
            })
        })
        .collect();

    for _ in 0..50 {
        let payload = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap();
        let record: NotificationRecord = serde_json::from_str(&payload).unwrap();
        let listed = facade.list_all().await;
        assert!(listed.iter().any(|r| r.key == record.key));
    }

    for result in futures::future::join_all(producers).await {
        result.unwrap();
    }
}

#[tokio::test]
async fn method_channel_covers_every_command() {
    let tracker = tracker();
    let facade = tracker.facade();
    tracker.pipeline().ingest(&RawNotification::posted(1, 1000, "com.x")).await;
    tracker.pipeline().ingest(&RawNotification::posted(2, 1000, "com.x")).await;

    let call = |method: &str, arguments: Value| MethodCall::new(method, arguments);

    let apps = facade.handle_method_call(&call("getInstalledApps", Value::Null)).await.unwrap();
    assert_eq!(apps, json!([{"appName": "Example X", "packageName": "com.x", "appIcon": ""}]));

    facade
        .handle_method_call(&call("deleteNotification", json!({"id": 1, "postTime": 1000})))
        .await
        .unwrap();
    let listed = facade.handle_method_call(&call("getAllNotifications", Value::Null)).await.unwrap();
    let records: Vec<NotificationRecord> = serde_json::from_str(listed.as_str().unwrap()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 2);

    facade.handle_method_call(&call("deleteAllNotifications", Value::Null)).await.unwrap();
    assert!(facade.list_all().await.is_empty());
}

#[tokio::test]
async fn feed_spool_drives_the_listener() {
    let dir = tempfile::tempdir().unwrap();
    let spool = dir.path().join("feed.jsonl");
    let config = ListenerConfig {
        feed: FeedConfig {
            spool_path: spool.clone(),
            poll_interval_ms: 10,
            max_batch_size: 100,
            start_at_end: false,
        },
        ..ListenerConfig::default()
    };
    let tracker = Arc::new(tracker_with(config));
    let mut stream = tracker.facade().subscribe().await;

    let mut file = std::fs::File::create(&spool).unwrap();
    writeln!(file, r#"{{"id":1,"postTime":1000,"packageName":"com.x","title":"Hi"}}"#).unwrap();
    writeln!(file, "garbage").unwrap();
    writeln!(file, r#"{{"id":2,"packageName":"com.x"}}"#).unwrap();
    writeln!(file, r#"{{"id":1,"postTime":1000,"packageName":"com.x","eventType":"removed"}}"#).unwrap();
    file.flush().unwrap();

    let runner = {
        let tracker = tracker.clone();
        tokio::spawn(async move { tracker.start().await.map_err(|e| e.to_string()) })
    };

    let payload = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("record should be streamed")
        .unwrap();
    let record: NotificationRecord = serde_json::from_str(&payload).unwrap();
    assert_eq!(record.title, "Hi");

    // wait for the rest of the batch to be processed
    tokio::time::timeout(Duration::from_secs(5), async {
        while tracker.stats().received < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let stats = tracker.stats();
    assert_eq!(stats.stored, 1);
    assert_eq!(stats.dropped, 1);
    assert_eq!(tracker.facade().list_all().await.len(), 1);

    runner.abort();
}
