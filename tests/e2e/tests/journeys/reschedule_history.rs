//! Journey: rebuilding a card from its review history
//!
//! A collection whose parameters changed (or whose stored card drifted) is
//! repaired by replaying each card's history and applying the correction.

use chrono::Duration;
use mnemos_core::{
    Card, FSRSScheduler, LearningState, ParameterUpdate, Rating, ReplayEntry, RescheduleOptions,
};
use mnemos_e2e_tests::{HistoryConfig, ReviewSession, TestClock, TestDataFactory};

fn studied_session() -> ReviewSession {
    let mut session = ReviewSession::new(FSRSScheduler::default());
    for rating in [Rating::Good, Rating::Good, Rating::Good, Rating::Again, Rating::Good, Rating::Easy] {
        session.review_when_due(rating);
    }
    session
}

#[test]
fn test_replay_reproduces_live_reviews() {
    let session = studied_session();
    let options = RescheduleOptions::new(session.clock.now());
    let result = session
        .scheduler
        .reschedule(&session.card, &session.replay_entries(), &options)
        .unwrap();

    assert_eq!(result.collections.len(), session.history.len());
    for (replayed, live) in result.collections.iter().zip(&session.history) {
        assert_eq!(replayed, live);
    }
    assert!(result.reschedule_item.is_none());
}

#[test]
fn test_drifted_card_gets_a_manual_correction() {
    let session = studied_session();
    let now = session.clock.now() + Duration::hours(1);
    let mut stored = session.card.clone();
    stored.due += Duration::days(9);
    stored.stability = 99.0;

    let result = session
        .scheduler
        .reschedule(&stored, &session.replay_entries(), &RescheduleOptions::new(now))
        .unwrap();
    let item = result.reschedule_item.expect("due dates differ");
    assert_eq!(item.log.rating, Rating::Manual);
    assert_eq!(item.log.review, now);
    assert_eq!(item.log.due, stored.due);
    assert_eq!(item.log.scheduled_days, -9);
    assert_eq!(item.card.due, session.card.due);
    assert_eq!(item.card.state, session.card.state);
    assert_eq!(item.card.reps, stored.reps + 1);
    // Memory state untouched unless asked for
    assert_eq!(item.card.stability, 99.0);
}

#[test]
fn test_correction_can_carry_memory_state() {
    let session = studied_session();
    let mut stored = session.card.clone();
    stored.due -= Duration::days(2);
    stored.stability = 0.5;
    stored.difficulty = 9.9;

    let options = RescheduleOptions {
        update_memory_state: true,
        ..RescheduleOptions::new(session.clock.now())
    };
    let item = session
        .scheduler
        .reschedule(&stored, &session.replay_entries(), &options)
        .unwrap()
        .reschedule_item
        .expect("due dates differ");
    assert_eq!(item.card.stability, session.card.stability);
    assert_eq!(item.card.difficulty, session.card.difficulty);
}

#[test]
fn test_new_parameters_move_the_due_date() {
    let session = studied_session();
    let stricter = session
        .scheduler
        .with_update(ParameterUpdate {
            request_retention: Some(0.97),
            ..ParameterUpdate::default()
        })
        .unwrap();

    let item = stricter
        .reschedule(&session.card, &session.replay_entries(), &RescheduleOptions::new(session.clock.now()))
        .unwrap()
        .reschedule_item
        .expect("higher retention shortens the interval");
    assert!(item.card.due < session.card.due);
}

#[test]
fn test_history_order_does_not_matter_when_sorting() {
    let start = TestClock::default().now();
    let history = TestDataFactory::history(start, &HistoryConfig::default());
    let mut shuffled = history.clone();
    shuffled.reverse();
    shuffled.swap(0, 2);

    let scheduler = FSRSScheduler::default();
    let now = start + Duration::days(30);
    let sorted = scheduler
        .reschedule(&Card::new(start), &history, &RescheduleOptions::new(now))
        .unwrap();
    let unsorted = scheduler
        .reschedule(&Card::new(start), &shuffled, &RescheduleOptions::new(now))
        .unwrap();
    assert_eq!(sorted.collections, unsorted.collections);
}

#[test]
fn test_manual_reset_entries() {
    let start = TestClock::default().now();
    let config = HistoryConfig {
        manual_reset_after: Some(3),
        ..HistoryConfig::default()
    };
    let history = TestDataFactory::history(start, &config);
    assert_eq!(history.len(), 7);

    let scheduler = FSRSScheduler::default();
    let now = start + Duration::days(30);

    let skipped = scheduler
        .reschedule(&Card::new(start), &history, &RescheduleOptions::new(now))
        .unwrap();
    assert_eq!(skipped.collections.len(), 6);
    assert!(skipped.collections.iter().all(|r| r.log.rating != Rating::Manual));

    let options = RescheduleOptions {
        skip_manual: false,
        ..RescheduleOptions::new(now)
    };
    let kept = scheduler.reschedule(&Card::new(start), &history, &options).unwrap();
    assert_eq!(kept.collections.len(), 7);
    let reset = &kept.collections[3];
    assert_eq!(reset.log.rating, Rating::Manual);
    assert_eq!(reset.card.state, LearningState::New);
    // The review right after the reset starts the ladder over
    assert_eq!(kept.collections[4].log.state, LearningState::New);
}

#[test]
fn test_manual_entry_without_due_is_rejected() {
    let start = TestClock::default().now();
    let history = vec![
        ReplayEntry::new(start, Rating::Good),
        ReplayEntry::manual(start + Duration::days(1), LearningState::Review, None),
    ];
    let options = RescheduleOptions {
        skip_manual: false,
        ..RescheduleOptions::new(start + Duration::days(2))
    };
    assert!(FSRSScheduler::default()
        .reschedule(&Card::new(start), &history, &options)
        .is_err());
}

#[test]
fn test_empty_history_needs_no_correction() {
    let start = TestClock::default().now();
    let result = FSRSScheduler::default()
        .reschedule(&Card::new(start), &[], &RescheduleOptions::new(start))
        .unwrap();
    assert!(result.collections.is_empty());
    assert!(result.reschedule_item.is_none());
}

#[test]
fn test_replay_from_a_first_card() {
    let start = TestClock::default().now();
    let scheduler = FSRSScheduler::default();
    let first = TestDataFactory::review_card(start, 8.0, 5.0, 8);
    let history = vec![
        ReplayEntry::new(start, Rating::Good),
        ReplayEntry::new(start + Duration::days(20), Rating::Hard),
    ];
    let options = RescheduleOptions {
        first_card: Some(first.clone()),
        ..RescheduleOptions::new(start + Duration::days(21))
    };
    let result = scheduler.reschedule(&first, &history, &options).unwrap();
    assert_eq!(result.collections[0].log.state, LearningState::Review);
    assert_eq!(result.collections[0].log.elapsed_days, 8);
    assert_eq!(result.collections[1].card.reps, first.reps + 2);
}
