mod common;

use common::*;
use perron::stats::{PropagatedTimesStore, Stats, SummaryStrategy};

#[test]
fn store_aggregates_reached_minutes_only() {
    let mut store = PropagatedTimesStore::new(1);
    for value in [Some(100), Some(120), Some(80), None, Some(110)] {
        store.merge(&[value.map(d)]);
    }

    let summary = store.summarize(SummaryStrategy::MinMax)[0].unwrap();
    assert_eq!(summary.lower, 80);
    assert_eq!(summary.upper, 120);
    assert_eq!(summary.avg, 102);
    assert_eq!(summary.count, 4);
    assert_eq!(store.minutes_merged(), 5);
}

#[test]
fn never_reached_target_has_no_summary() {
    let mut store = PropagatedTimesStore::new(3);
    store.merge(&[Some(d(0)), None, Some(d(3600))]);
    store.merge(&[Some(d(30)), None, None]);

    let summary = store.summarize(SummaryStrategy::MinMax);
    assert!(summary[0].is_some());
    assert!(summary[1].is_none());
    assert!(summary[2].is_some());
}

#[test]
fn bootstrap_and_percentile_disagree_on_skew() {
    // 99 quick minutes and one terrible one
    let mut store = PropagatedTimesStore::new(1);
    for _ in 0..99 {
        store.merge(&[Some(d(100))]);
    }
    store.merge(&[Some(d(500))]);

    let min_max = store.summarize(SummaryStrategy::MinMax)[0].unwrap();
    let percentile = store.summarize(SummaryStrategy::Percentile)[0].unwrap();
    let bootstrap = store.summarize(SummaryStrategy::bootstrap(9))[0].unwrap();

    // the raw extrema see the outlier in full
    assert_eq!(min_max.lower, 100);
    assert_eq!(min_max.upper, 500);
    // order statistics clip it away entirely
    assert_eq!(percentile.upper, 100);
    // confidence in the mean sits strictly between the two: the outlier
    // nudges most resampled means above 100, none anywhere near 500
    assert!(bootstrap.upper > percentile.upper);
    assert!(bootstrap.upper < min_max.upper);
    assert_ne!(bootstrap.upper, percentile.upper);
    assert_ne!(bootstrap.upper, min_max.upper);
    // all three agree on the plain average
    assert_eq!(min_max.avg, 104);
    assert_eq!(percentile.avg, 104);
    assert_eq!(bootstrap.avg, 104);
}

#[test]
fn bootstrap_is_seeded() {
    let mut store = PropagatedTimesStore::new(1);
    for value in [60, 90, 120, 600, 90, 75] {
        store.merge(&[Some(d(value))]);
    }

    let a = store.summarize(SummaryStrategy::bootstrap(5));
    let b = store.summarize(SummaryStrategy::bootstrap(5));
    let c = store.summarize(SummaryStrategy::bootstrap(6));
    assert_eq!(a, b);
    // a different seed is allowed to move the bounds
    assert_eq!(a[0].unwrap().avg, c[0].unwrap().avg);
}

#[test]
fn stats_chain_and_merge() {
    let wait = Stats::from_values([0, 300, 600]);
    let ride = Stats::from_values([600, 600, 600]);
    let leg = wait.then(&ride);
    assert_eq!(leg.min, 600);
    assert_eq!(leg.avg, 900);
    assert_eq!(leg.max, 1200);

    let other = Stats::from_values([450]);
    let pooled = leg.merge(&other);
    assert_eq!(pooled.min, 450);
    assert_eq!(pooled.max, 1200);
    assert_eq!(pooled.count, 4);
}
