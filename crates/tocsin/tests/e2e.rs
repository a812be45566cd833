// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the running bot.
//!
//! Events go through the mock transport and the real bot loop rather than
//! straight into the handler, and the scheduler runs on its own task, the
//! way `tocsin serve` wires them.

use std::time::Duration;

use tocsin_agent::{EscalationScheduler, callbacks};
use tocsin_core::types::ChatEvent;
use tocsin_core::{RecordId, UserId};
use tocsin_store::{StateStore, Visibility};
use tocsin_test_utils::TestHarness;
use tocsin_test_utils::harness::{ADMIN, dm};
use tokio_util::sync::CancellationToken;

async fn inject_alarm_wizard(h: &TestHarness, user: UserId, fix: &str) {
    let steps: [(bool, &str); 8] = [
        (true, "/new_message"),
        (false, callbacks::TYPE_ALARM),
        (true, "Payments failing"),
        (true, "Card payments return 502"),
        (false, "lvl_1"),
        (false, "svc_4"),
        (true, fix),
        (false, callbacks::CONFIRM_SEND),
    ];
    for (is_text, value) in steps {
        let event = if is_text {
            ChatEvent::text(user, dm(user), value)
        } else {
            ChatEvent::button(user, dm(user), value)
        };
        h.chat.inject_event(event).await;
    }
}

#[tokio::test]
async fn bot_loop_drains_transport_and_persists() {
    let mut h = TestHarness::builder().build().await.unwrap();
    inject_alarm_wizard(&h, ADMIN, "in 2 hours").await;
    h.chat.close();

    tokio::time::timeout(Duration::from_secs(5), h.bot.run(CancellationToken::new()))
        .await
        .expect("bot loop did not stop on a closed transport")
        .unwrap();

    let alarm = h.store.get_alarm(&RecordId::from("FA-1")).await.unwrap();
    assert_eq!(alarm.service, "Payments");
    assert_eq!(alarm.level, "Full service outage");
    assert_eq!(h.channel_posts().await.len(), 1);

    // A restart sees the same record.
    let restarted = StateStore::new(h.state_path.clone());
    let report = restarted.load().await;
    assert_eq!(report.alarms, 1);
    assert_eq!(
        restarted.list_alarms(Visibility::All).await[0].fix_by(),
        alarm.fix_by()
    );
}

#[tokio::test]
async fn cancelled_bot_loop_returns_promptly() {
    let mut h = TestHarness::builder().build().await.unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), h.bot.run(cancel))
        .await
        .expect("bot loop ignored cancellation")
        .unwrap();
    assert_eq!(h.chat.sent_count().await, 0);
}

#[tokio::test]
async fn scheduler_task_reminds_and_stops_on_cancel() {
    let mut h = TestHarness::builder().build().await.unwrap();
    inject_alarm_wizard(&h, ADMIN, "11:00").await;
    h.chat.close();
    h.bot.run(CancellationToken::new()).await.unwrap();

    h.clock.set(
        chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 57, 0)
            .unwrap(),
    );
    let mut escalation = h.config.escalation.clone();
    escalation.poll_interval_secs = 1;
    let scheduler = EscalationScheduler::new(
        h.store.clone(),
        h.bot.dispatcher(),
        h.clock.clone(),
        escalation,
    );
    let cancel = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancel.clone()));

    let mut reminded = false;
    for _ in 0..50 {
        if !h.store.reminders_of(ADMIN).await.is_empty() {
            reminded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(reminded, "no reminder within five seconds");
    assert!(h.last_reply(ADMIN).await.unwrap().text.contains("FA-1"));

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("scheduler ignored cancellation")
        .unwrap();

    let restarted = StateStore::new(h.state_path.clone());
    restarted.load().await;
    assert!(!restarted.reminders_of(ADMIN).await.is_empty());
}
