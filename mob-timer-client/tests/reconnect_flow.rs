use mob_timer_client::stream::SubscriptionId;
use mob_timer_client::ui::NotificationPermission;
use mob_timer_client::{ClientOptions, Message, StreamEvent, TimerSnapshot};
use mob_timer_devkit::{StreamEventBuilder, TestHarness};

#[test]
fn start_event_scenario() {
    let mut harness = TestHarness::new();
    harness.push(StreamEventBuilder::start(1500, "Ada"));

    harness.assert_countdown("25:00").unwrap();
    harness.assert_notified("Timer started by Ada (25:00)").unwrap();
    let notification = &harness.ui.snapshot().notifications[0];
    assert_eq!(notification.title, "Mob Timer");
    assert_eq!(notification.tag, "mob-timer");
}

#[test]
fn notifications_are_silent_without_permission() {
    let mut harness = TestHarness::with_options(ClientOptions {
        notification_permission: NotificationPermission::Unsupported,
        ..ClientOptions::default()
    });
    harness.push(StreamEventBuilder::start(1500, "Ada"));
    harness.push(StreamEventBuilder::over());

    harness.assert_countdown("25:00").unwrap();
    assert!(harness.ui.snapshot().notifications.is_empty());
}

#[test]
fn user_reconnect_replaces_subscription() {
    let mut harness = TestHarness::new();
    harness.advance_secs(11);

    harness.click_reconnect();

    assert_eq!(harness.transport.connect_count(), 2);
    assert_eq!(harness.transport.is_closed(0), Some(true));
    assert_eq!(harness.transport.open_count(), 1);
    assert_eq!(harness.client.active_subscription(), Some(SubscriptionId(2)));
    assert!(!harness.ui.snapshot().reconnect_enabled);

    harness.push(StreamEventBuilder::tick(300));
    harness.assert_connected_shown().unwrap();
    harness.assert_countdown("05:00").unwrap();
}

#[test]
fn double_click_within_cooldown_opens_one_subscription() {
    let mut harness = TestHarness::new();

    harness.click_reconnect();
    harness.advance_secs(2);
    harness.click_reconnect();

    assert_eq!(harness.transport.connect_count(), 2);
    assert_eq!(harness.transport.open_count(), 1);
    assert!(!harness.client.is_reconnect_enabled());
}

#[test]
fn control_reenabled_after_cooldown() {
    let mut harness = TestHarness::new();
    harness.click_reconnect();

    harness.advance_secs(5);
    assert!(harness.client.is_reconnect_enabled());
    assert!(harness.ui.snapshot().reconnect_enabled);

    harness.click_reconnect();
    assert_eq!(harness.transport.connect_count(), 3);
}

#[test]
fn closed_subscription_never_reaches_reconciler() {
    let mut harness = TestHarness::new();
    harness.push(StreamEventBuilder::tick(100));
    harness.click_reconnect();

    // the old connection keeps talking after close
    assert!(!harness.transport.push_to(0, &StreamEventBuilder::tick(5)));
    // a message queued from the old id before close
    harness.send(Message::Stream {
        subscription: SubscriptionId(1),
        event: StreamEvent::Tick { sec: 7 },
    });
    harness.pump();

    assert_eq!(harness.client.snapshot(), TimerSnapshot(100));
    harness.assert_countdown("01:40").unwrap();
}

#[test]
fn status_and_toggle_responses_seed_countdown() {
    let mut harness = TestHarness::new();
    harness.send(Message::TimeFetched(900));
    harness.assert_countdown("15:00").unwrap();

    harness.push(StreamEventBuilder::tick(899));
    harness.send(Message::TimeFetched(899));
    assert_eq!(harness.ui.snapshot().countdown_history, vec!["15:00", "14:59", "14:59"]);
}

#[test]
fn shutdown_closes_stream() {
    let mut harness = TestHarness::new();
    assert!(!harness.client.handle(Message::Shutdown));
    assert_eq!(harness.transport.open_count(), 0);
    assert_eq!(harness.client.active_subscription(), None);
}
