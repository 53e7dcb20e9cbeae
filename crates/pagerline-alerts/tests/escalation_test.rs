//! Escalation run behaviour under paused virtual time.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

use pagerline_alerts::{CancelToken, EscalationOutcome};
use pagerline_core::{Alert, AlertEvent, ChannelKind, RunState};

use common::{FlakyStore, Harness};

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_run_makes_two_attempts_per_level() {
    for levels in 1..=3usize {
        let h = Harness::new();
        let users: Vec<String> = (0..levels).map(|i| format!("user-{}", i)).collect();
        let refs: Vec<&str> = users.iter().map(String::as_str).collect();
        h.chain("api", &refs);

        let alert = h.manager.create_alert("api").unwrap();
        let report = h.manager.runs().join(&alert.id).await.unwrap();

        assert_eq!(report.outcome, EscalationOutcome::Exhausted);
        assert_eq!(report.attempts as usize, 2 * levels);

        let deliveries = h.channel.deliveries().await;
        assert_eq!(deliveries.len(), 2 * levels);
        for (i, delivery) in deliveries.iter().enumerate() {
            let expected = if i % 2 == 0 { ChannelKind::Sms } else { ChannelKind::Voice };
            assert_eq!(delivery.kind, expected);
            assert_eq!(delivery.to, h.phone_of(refs[i / 2]));
        }

        let rows = h.manager.notification_history(&alert.id).unwrap();
        assert_eq!(rows.len(), 2 * levels);
        assert!(rows.iter().all(|n| n.responded_at.is_none()));
    }
}

#[tokio::test(start_paused = true)]
async fn test_acknowledgment_at_attempt_k_stops_after_k_attempts() {
    for k in 1..=4usize {
        let h = Harness::new();
        h.chain("api", &["a", "b"]);
        let mut events = h.bus.filter().escalation_events();

        let alert = h.manager.create_alert("api").unwrap();

        let mut sent = 0;
        while let Some((event, _)) = events.recv().await {
            if let AlertEvent::NotificationSent { alert_id, user_id, .. } = event {
                assert_eq!(alert_id, alert.id);
                sent += 1;
                if sent == k {
                    h.manager.acknowledge(&alert.id, &user_id).unwrap();
                    break;
                }
            }
        }

        let report = h.manager.runs().join(&alert.id).await.unwrap();
        assert!(matches!(report.outcome, EscalationOutcome::Acknowledged { .. }));
        assert_eq!(report.attempts as usize, k);

        // Nothing more goes out once acknowledged.
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(h.channel.count().await, k);
    }
}

#[tokio::test(start_paused = true)]
async fn test_second_level_acknowledges_sms() {
    let h = Harness::new();
    h.chain("api", &["a", "b"]);

    let alert = h.manager.create_alert("api").unwrap();
    tokio::time::sleep(Duration::from_secs(601)).await;
    h.manager.acknowledge(&alert.id, "b").unwrap();

    let report = h.manager.runs().join(&alert.id).await.unwrap();
    assert_eq!(
        report.outcome,
        EscalationOutcome::Acknowledged {
            level: 2,
            channel: ChannelKind::Sms,
            user_id: "b".to_string(),
        }
    );
    assert_eq!(report.attempts, 3);

    let kinds: Vec<(ChannelKind, String)> = h
        .channel
        .deliveries()
        .await
        .into_iter()
        .map(|d| (d.kind, d.to))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (ChannelKind::Sms, h.phone_of("a")),
            (ChannelKind::Voice, h.phone_of("a")),
            (ChannelKind::Sms, h.phone_of("b")),
        ]
    );

    let position = h.manager.escalation_position(&alert.id).unwrap().unwrap();
    assert_eq!(position.state, RunState::Acknowledged);
    assert_eq!(position.level, 2);
    assert_eq!(position.channel, ChannelKind::Sms);
    assert_eq!(position.attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_empty_chain_ends_immediately() {
    let h = Harness::new();
    let started = Instant::now();

    let alert = h.manager.create_alert("orphan").unwrap();
    let report = h.manager.runs().join(&alert.id).await.unwrap();

    assert_eq!(report.outcome, EscalationOutcome::NoChain);
    assert_eq!(report.attempts, 0);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(h.channel.attempts(), 0);
    assert_eq!(
        h.manager.escalation_position(&alert.id).unwrap().unwrap().state,
        RunState::NoChain
    );
}

#[tokio::test(start_paused = true)]
async fn test_resolve_during_wait_stops_run() {
    let h = Harness::new();
    h.chain("api", &["a", "b"]);

    let alert = h.manager.create_alert("api").unwrap();
    tokio::time::sleep(Duration::from_secs(90)).await;
    h.manager.resolve(&alert.id).unwrap();

    let resolved_at = Instant::now();
    let report = h.manager.runs().join(&alert.id).await.unwrap();
    assert!(resolved_at.elapsed() <= Duration::from_secs(1));
    assert_eq!(report.outcome, EscalationOutcome::Cancelled);
    assert_eq!(report.attempts, 1);

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(h.channel.count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_store_resolution_is_seen_within_one_poll() {
    let h = Harness::new();
    h.chain("api", &["a"]);

    let alert = h.manager.create_alert("api").unwrap();
    tokio::time::sleep(Duration::from_secs(90)).await;
    // Written by another process: no cancel signal reaches the run.
    h.alerts.resolve_alert(&alert.id, Utc::now()).unwrap();

    let resolved_at = Instant::now();
    let report = h.manager.runs().join(&alert.id).await.unwrap();
    assert!(resolved_at.elapsed() <= Duration::from_secs(1));
    assert_eq!(report.outcome, EscalationOutcome::Cancelled);
    assert_eq!(h.channel.count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_send_failures_do_not_stop_escalation() {
    let h = Harness::new();
    h.chain("api", &["a", "b"]);
    h.channel.set_failing(true);
    let mut events = h.bus.filter().escalation_events();

    let alert = h.manager.create_alert("api").unwrap();
    let report = h.manager.runs().join(&alert.id).await.unwrap();

    assert_eq!(report.outcome, EscalationOutcome::Exhausted);
    assert_eq!(report.attempts, 4);
    assert_eq!(h.channel.attempts(), 4);
    assert_eq!(h.channel.count().await, 0);
    // Every attempt was still recorded.
    assert_eq!(h.manager.notification_history(&alert.id).unwrap().len(), 4);

    let mut failed = 0;
    while let Some((event, _)) = events.try_recv() {
        if matches!(event, AlertEvent::NotificationFailed { .. }) {
            failed += 1;
        }
    }
    assert_eq!(failed, 4);
}

#[tokio::test(start_paused = true)]
async fn test_failed_notification_write_skips_send_but_waits() {
    let h = Harness::new();
    h.chain("api", &["a"]);
    let alert = Alert::new("api");
    h.alerts.insert_alert(&alert).unwrap();

    let store = Arc::new(FlakyStore::new(h.alerts.clone()).fail_writes(1));
    let engine = h.engine_with_store(store);

    let started = Instant::now();
    let report = engine.run(&alert, CancelToken::never()).await;

    assert_eq!(report.outcome, EscalationOutcome::Exhausted);
    assert_eq!(report.attempts, 2);
    // The SMS attempt was skipped; the voice attempt went out after a full wait.
    let deliveries = h.channel.deliveries().await;
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].kind, ChannelKind::Voice);
    assert_eq!(started.elapsed(), Duration::from_secs(600));
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_does_not_count_an_earlier_response() {
    let h = Harness::new();
    h.chain("api", &["a", "b", "a"]);
    let alert = Alert::new("api");
    h.alerts.insert_alert(&alert).unwrap();

    // Levels 1 and 2 are recorded; the level-3 SMS row for a is not.
    let store = Arc::new(FlakyStore::new(h.alerts.clone()).pass_writes(4).fail_writes(1));
    let engine = Arc::new(h.engine_with_store(store));
    let run = {
        let engine = engine.clone();
        let alert = alert.clone();
        tokio::spawn(async move { engine.run(&alert, CancelToken::never()).await })
    };

    // a answers the level-1 voice call late, while b is being paged.
    tokio::time::sleep(Duration::from_secs(601)).await;
    h.alerts.acknowledge_latest(&alert.id, "a", Utc::now()).unwrap();

    let started = Instant::now();
    let report = run.await.unwrap();
    assert_eq!(report.outcome, EscalationOutcome::Exhausted);
    assert_eq!(report.attempts, 6);
    assert_eq!(started.elapsed(), Duration::from_secs(1199));

    let sent: Vec<ChannelKind> = h.channel.deliveries().await.into_iter().map(|d| d.kind).collect();
    assert_eq!(
        sent,
        vec![
            ChannelKind::Sms,
            ChannelKind::Voice,
            ChannelKind::Sms,
            ChannelKind::Voice,
            ChannelKind::Voice,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_polls_still_observe_later_acknowledgment() {
    let h = Harness::new();
    h.chain("api", &["a"]);
    let alert = Alert::new("api");
    h.alerts.insert_alert(&alert).unwrap();

    let store = Arc::new(FlakyStore::new(h.alerts.clone()).fail_polls(5));
    let engine = Arc::new(h.engine_with_store(store.clone()));

    let run = {
        let engine = engine.clone();
        let alert = alert.clone();
        tokio::spawn(async move { engine.run(&alert, CancelToken::never()).await })
    };

    tokio::time::sleep(Duration::from_millis(2500)).await;
    // Stamped directly in the store, so only the poll can see it.
    h.alerts.acknowledge_latest(&alert.id, "a", Utc::now()).unwrap();

    let report = run.await.unwrap();
    assert!(matches!(report.outcome, EscalationOutcome::Acknowledged { level: 1, .. }));
    assert_eq!(report.attempts, 1);
    assert!(store.polls.load(Ordering::SeqCst) >= 6);
}

#[tokio::test(start_paused = true)]
async fn test_late_poll_keeps_acknowledgment() {
    let h = Harness::new();
    h.chain("api", &["a"]);

    let alert = h.manager.create_alert("api").unwrap();
    // SMS unanswered, voice answered.
    tokio::time::sleep(Duration::from_secs(301)).await;
    h.manager.acknowledge(&alert.id, "a").unwrap();
    let report = h.manager.runs().join(&alert.id).await.unwrap();
    assert!(matches!(
        report.outcome,
        EscalationOutcome::Acknowledged { channel: ChannelKind::Voice, .. }
    ));

    let rows = h.manager.notification_history(&alert.id).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].responded_at.is_none());
    assert!(rows[1].responded_at.is_some());

    for _ in 0..3 {
        let latest = h.alerts.latest_notification(&alert.id, "a").unwrap().unwrap();
        assert!(latest.is_acknowledged());
        assert_eq!(latest.channel, ChannelKind::Voice);
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_alerts_are_independent() {
    let h = Harness::new();
    h.chain("api", &["a"]);
    h.chain("db", &["b"]);

    let api = h.manager.create_alert("api").unwrap();
    let db = h.manager.create_alert("db").unwrap();
    assert_eq!(h.manager.runs().active_count(), 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    h.manager.acknowledge(&api.id, "a").unwrap();

    let api_report = h.manager.runs().join(&api.id).await.unwrap();
    let db_report = h.manager.runs().join(&db.id).await.unwrap();
    assert_eq!(api_report.attempts, 1);
    assert_eq!(db_report.outcome, EscalationOutcome::Exhausted);
    assert_eq!(db_report.attempts, 2);
}
