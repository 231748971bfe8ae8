//! Journey: daily study from a whole collection
//!
//! Builds the day's queue, reviews everything in it, and checks what comes
//! back later the same day and the next morning.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use mnemos_core::{due_items, items_due_on, DailyBudget, FSRSScheduler, QueueItem, Rating};
use mnemos_e2e_tests::{TestClock, TestDataFactory};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Review every queued item with `rating`, counting New cards against the budget
fn study(
    scheduler: &FSRSScheduler,
    items: &mut [QueueItem],
    now: DateTime<Utc>,
    budget: &mut DailyBudget,
    rating: Rating,
) -> usize {
    let queued: HashSet<String> = due_items(items, now, budget, &mut StdRng::seed_from_u64(7))
        .into_iter()
        .map(|item| item.id.clone())
        .collect();
    let mut introduced = 0;
    for item in items.iter_mut().filter(|item| queued.contains(&item.id)) {
        if item.card.is_new() {
            introduced += 1;
        }
        item.card = scheduler.review(&item.card, now, rating).unwrap().card;
    }
    budget.record_new(now.date_naive(), introduced);
    queued.len()
}

#[test]
fn test_first_session_respects_the_new_card_budget() {
    let now = TestClock::default().now();
    let items = TestDataFactory::collection(now, 3, 4, 30);
    let mut budget = DailyBudget::new(20);
    let queue = due_items(&items, now, &mut budget, &mut StdRng::seed_from_u64(1));

    assert_eq!(queue.len(), 23);
    assert!(queue[..3].iter().all(|item| item.id.starts_with("due-")));
    assert!(queue[3..].iter().all(|item| item.card.is_new()));
    assert!(queue.iter().all(|item| !item.id.starts_with("upcoming-")));
}

#[test]
fn test_a_day_of_study() {
    let scheduler = FSRSScheduler::default();
    let mut clock = TestClock::default();
    let mut items = TestDataFactory::collection(clock.now(), 3, 4, 30);
    let mut budget = DailyBudget::new(20);

    assert_eq!(study(&scheduler, &mut items, clock.now(), &mut budget, Rating::Good), 23);
    assert_eq!(budget.new_reviewed_today, 20);

    // Everything just reviewed is in the future; no budget left
    let queue = due_items(&items, clock.now(), &mut budget, &mut StdRng::seed_from_u64(1));
    assert!(queue.is_empty());

    // The learning step comes back ten minutes later
    clock.advance(Duration::minutes(10));
    let queue = due_items(&items, clock.now(), &mut budget, &mut StdRng::seed_from_u64(1));
    assert_eq!(queue.len(), 20);
    assert_eq!(study(&scheduler, &mut items, clock.now(), &mut budget, Rating::Good), 20);
    assert_eq!(budget.new_reviewed_today, 20);

    // Next morning the budget resets and the remaining New cards start
    clock.advance(Duration::days(1));
    let queue = due_items(&items, clock.now(), &mut budget, &mut StdRng::seed_from_u64(1));
    let fresh = queue.iter().filter(|item| item.card.is_new()).count();
    assert_eq!(fresh, 10);
    assert_eq!(budget.new_reviewed_today, 0);
}

#[test]
fn test_shuffled_new_cards_are_reproducible_per_seed() {
    let now = TestClock::default().now();
    let items = TestDataFactory::collection(now, 0, 0, 40);
    let mut budget = DailyBudget {
        shuffle_new: true,
        ..DailyBudget::new(10)
    };
    let ids = |seed: u64, budget: &mut DailyBudget| -> Vec<String> {
        due_items(&items, now, budget, &mut StdRng::seed_from_u64(seed))
            .into_iter()
            .map(|item| item.id.clone())
            .collect()
    };
    let first = ids(3, &mut budget);
    assert_eq!(first.len(), 10);
    assert_eq!(first, ids(3, &mut budget));
}

#[test]
fn test_forecast_by_day() {
    let now = TestClock::default().now();
    let items = TestDataFactory::collection(now, 2, 3, 5);
    let today = now.date_naive();

    let due_today = items_due_on(&items, today, today);
    assert_eq!(due_today.len(), 2);
    for offset in 1..=3 {
        let day = today + Duration::days(offset);
        assert_eq!(items_due_on(&items, day, today).len(), 1);
    }
    assert!(items_due_on(&items, today + Duration::days(10), today).is_empty());
}
