//! Property tests over arbitrary cards
//!
//! Most generated cards are plausible Review cards: stability up to a few
//! years, difficulty anywhere in [1, 10], reviewed up to ~13 months ago.
//! The rest sit in New, Learning or Relearning with tiny stabilities and
//! step indices that may run past the configured steps.

use chrono::{Duration, TimeZone, Utc};
use mnemos_core::fsrs::{apply_fuzz, fuzz_range, S_MAX, S_MIN};
use mnemos_core::{Card, FSRSConfig, FSRSScheduler, LearningState, Rating, GRADES};
use proptest::prelude::*;

fn scheduler(long_term: bool, fuzz: bool) -> FSRSScheduler {
    FSRSScheduler::from_config(FSRSConfig {
        enable_short_term: !long_term,
        enable_fuzz: fuzz,
        ..FSRSConfig::default()
    })
    .unwrap()
}

fn review_card(stability: f64, difficulty: f64, days_ago: i64, reps: u32, lapses: u32) -> (Card, chrono::DateTime<Utc>) {
    let now = Utc.with_ymd_and_hms(2025, 9, 1, 18, 30, 0).unwrap();
    let last_review = now - Duration::days(days_ago);
    let card = Card {
        due: last_review + Duration::days(stability.round().max(1.0) as i64),
        stability,
        difficulty,
        elapsed_days: 3,
        scheduled_days: stability.round().max(1.0) as i64,
        reps,
        lapses,
        learning_steps: 0,
        state: LearningState::Review,
        last_review: Some(last_review),
    };
    (card, now)
}

fn early_card(state: LearningState, stability: f64, difficulty: f64, step: u32, minutes_ago: i64) -> (Card, chrono::DateTime<Utc>) {
    let now = Utc.with_ymd_and_hms(2025, 9, 1, 18, 30, 0).unwrap();
    if state == LearningState::New {
        return (Card::new(now), now);
    }
    let last_review = now - Duration::minutes(minutes_ago);
    let card = Card {
        due: last_review + Duration::minutes(10),
        stability,
        difficulty,
        elapsed_days: 0,
        scheduled_days: 0,
        reps: 2,
        lapses: u32::from(state == LearningState::Relearning),
        learning_steps: step,
        state,
        last_review: Some(last_review),
    };
    (card, now)
}

fn early_state() -> impl Strategy<Value = LearningState> {
    prop_oneof![
        Just(LearningState::New),
        Just(LearningState::Learning),
        Just(LearningState::Relearning),
    ]
}

proptest! {
    #[test]
    fn pt_early_states_stay_clamped(
        state in early_state(),
        stability in S_MIN..5.0,
        difficulty in 1.0_f64..=10.0,
        step in 0_u32..6,
        minutes_ago in 0_i64..4_320,
        long_term in any::<bool>(),
        fuzz in any::<bool>(),
    ) {
        let scheduler = scheduler(long_term, fuzz);
        let (card, now) = early_card(state, stability, difficulty, step, minutes_ago);
        let preview = scheduler.preview(&card, now).unwrap();
        for (rating, result) in preview.iter() {
            let next = &result.card;
            prop_assert!((1.0..=10.0).contains(&next.difficulty), "{} from {}: difficulty {}", rating, state, next.difficulty);
            prop_assert!(next.stability >= S_MIN && next.stability <= S_MAX, "{} from {}: stability {}", rating, state, next.stability);
            prop_assert!(next.due >= now, "{} from {}: due before now", rating, state);
            prop_assert_ne!(next.state, LearningState::New);
            prop_assert_eq!(next.reps, card.reps + 1);
        }
    }

    #[test]
    fn pt_rollback_undoes_any_review(
        stability in 0.1_f64..1000.0,
        difficulty in 1.0_f64..10.0,
        days_ago in 0_i64..400,
        reps in 1_u32..50,
        lapses in 0_u32..10,
        grade in 0_usize..4,
        long_term in any::<bool>(),
    ) {
        let scheduler = scheduler(long_term, true);
        let (card, now) = review_card(stability, difficulty, days_ago, reps, lapses);
        let result = scheduler.review(&card, now, GRADES[grade]).unwrap();
        let restored = scheduler.rollback(&result.card, &result.log).unwrap();
        prop_assert_eq!(restored, card);
    }

    #[test]
    fn pt_memory_state_stays_bounded(
        stability in 0.1_f64..1000.0,
        difficulty in 1.0_f64..10.0,
        days_ago in 0_i64..400,
        long_term in any::<bool>(),
    ) {
        let scheduler = scheduler(long_term, false);
        let (card, now) = review_card(stability, difficulty, days_ago, 4, 0);
        let preview = scheduler.preview(&card, now).unwrap();
        for (rating, result) in preview.iter() {
            prop_assert!((1.0..=10.0).contains(&result.card.difficulty), "{} difficulty", rating);
            prop_assert!(result.card.stability >= S_MIN && result.card.stability <= S_MAX);
            prop_assert!(result.card.due > now);
            prop_assert_eq!(result.card.reps, 5);
            prop_assert_eq!(result.card.last_review, Some(now));
        }
        prop_assert!(preview.again.card.stability <= preview.hard.card.stability);
        prop_assert_eq!(preview.again.card.lapses, 1);
        prop_assert_eq!(preview.good.card.lapses, 0);
    }

    #[test]
    fn pt_preview_due_dates_are_ordered(
        stability in 0.1_f64..1000.0,
        difficulty in 1.0_f64..10.0,
        days_ago in 0_i64..400,
        long_term in any::<bool>(),
    ) {
        let scheduler = scheduler(long_term, false);
        let (card, now) = review_card(stability, difficulty, days_ago, 4, 0);
        let preview = scheduler.preview(&card, now).unwrap();
        prop_assert!(preview.again.card.due < preview.hard.card.due);
        prop_assert!(preview.hard.card.due < preview.good.card.due);
        prop_assert!(preview.good.card.due < preview.easy.card.due);
    }

    #[test]
    fn pt_review_is_deterministic(
        stability in 0.1_f64..1000.0,
        difficulty in 1.0_f64..10.0,
        days_ago in 0_i64..400,
        grade in 0_usize..4,
    ) {
        let (card, now) = review_card(stability, difficulty, days_ago, 7, 1);
        let first = scheduler(false, true).review(&card, now, GRADES[grade]).unwrap();
        let second = scheduler(false, true).review(&card, now, GRADES[grade]).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn pt_retrievability_decays(
        stability in 0.1_f64..1000.0,
        difficulty in 1.0_f64..10.0,
        days_ago in 0_i64..400,
        later in 1_i64..1000,
    ) {
        let scheduler = FSRSScheduler::default();
        let (card, now) = review_card(stability, difficulty, days_ago, 4, 0);
        let r_now = scheduler.retrievability(&card, now);
        let r_later = scheduler.retrievability(&card, now + Duration::days(later));
        prop_assert!((0.0..=1.0).contains(&r_now));
        prop_assert!(r_later <= r_now);
    }

    #[test]
    fn pt_fuzz_stays_in_range(
        interval in 2.5_f64..36_500.0,
        elapsed in 0_i64..2_000,
        seed in "[a-z0-9_]{1,24}",
    ) {
        let range = fuzz_range(interval, elapsed, 36_500);
        let fuzzed = apply_fuzz(interval, elapsed, 36_500, &seed);
        prop_assert!(range.min_ivl <= range.max_ivl);
        prop_assert!(fuzzed >= range.min_ivl && fuzzed <= range.max_ivl, "{} not in {:?}", fuzzed, range);
    }
}

#[test]
fn test_manual_never_reviews() {
    let (card, now) = review_card(10.0, 5.0, 10, 3, 0);
    assert!(FSRSScheduler::default().review(&card, now, Rating::Manual).is_err());
}
