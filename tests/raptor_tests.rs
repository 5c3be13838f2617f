mod common;

use std::time::Instant;

use common::*;
use perron::{
    raptor::{Error, LabelPolicy, RaptorWorker, SearchConfig},
    stats::{PropagatedTimesStore, SummaryStrategy},
    window::TimeWindow,
    worker::{Error as WorkerError, FrequencyOffsets, StopTreeCache, WorkerData},
};

#[test]
fn scheduled_search_exact_times() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();

    let mut worker = RaptorWorker::new(&data, config);
    let offsets = FrequencyOffsets::new(&data, 1);
    worker.run(t(EIGHT_AM), &[(0, d(0))], &offsets);

    let best = worker.best_times();
    // board slack skips the 08:00 trip, we ride the 08:10 one
    assert_eq!(best[0], Some(t(28800)));
    assert_eq!(best[1], Some(t(29700)));
    assert_eq!(best[2], Some(t(30000)));
    // 130 m transfer at 1.3 m/s is exactly 100 s
    assert_eq!(best[3], Some(t(30100)));
    assert_eq!(best[4], Some(t(30600)));
    assert_eq!(best[5], Some(t(30900)));
    // no service in the window
    assert_eq!(best[6], None);
}

#[test]
fn transfer_propagates_exact_walk_time() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();

    let mut worker = RaptorWorker::new(&data, config);
    let offsets = FrequencyOffsets::new(&data, 1);
    worker.run(t(EIGHT_AM), &[(0, d(0))], &offsets);

    let best = worker.best_times();
    let at_c = best[2].unwrap();
    let at_d = best[3].unwrap();
    assert_eq!(at_d, at_c + d(100));
}

#[test]
fn board_slack_respected() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);

    // default 60 s slack: the 08:00:00 trip is already gone when we arrive
    // at 08:00:00
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();
    let mut worker = RaptorWorker::new(&data, config);
    let offsets = FrequencyOffsets::new(&data, 1);
    worker.run(t(EIGHT_AM), &[(0, d(0))], &offsets);
    assert_eq!(worker.best_times()[1], Some(t(29700)));

    // zero slack boards it
    let config = SearchConfig {
        board_slack: d(0),
        ..SearchConfig::default()
    };
    let mut worker = RaptorWorker::new(&data, config);
    worker.run(t(EIGHT_AM), &[(0, d(0))], &offsets);
    assert_eq!(worker.best_times()[1], Some(t(29100)));
}

#[test]
fn deterministic_for_scheduled_service() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();
    let offsets = FrequencyOffsets::new(&data, 1);

    let mut first = RaptorWorker::new(&data, config);
    first.run(t(EIGHT_AM), &[(0, d(0))], &offsets);
    let mut second = RaptorWorker::new(&data, config);
    second.run(t(EIGHT_AM), &[(0, d(0))], &offsets);
    assert_eq!(first.best_times(), second.best_times());

    // repeated runs of the same worker do not change anything either
    first.run(t(EIGHT_AM), &[(0, d(0))], &offsets);
    assert_eq!(first.best_times(), second.best_times());
}

#[test]
fn more_rounds_never_hurt() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();
    let offsets = FrequencyOffsets::new(&data, 1);

    let mut previous: Option<Vec<Option<perron::shared::time::Time>>> = None;
    for max_rounds in 0..=4 {
        let config = SearchConfig {
            max_rounds,
            ..SearchConfig::default()
        };
        let mut worker = RaptorWorker::new(&data, config);
        worker.run(t(EIGHT_AM), &[(0, d(0))], &offsets);
        let best = worker.best_times().to_vec();
        if let Some(previous) = &previous {
            for (earlier, later) in previous.iter().zip(&best) {
                match (earlier, later) {
                    (Some(e), Some(l)) => assert!(l <= e),
                    (Some(_), None) => panic!("a reached stop became unreached"),
                    _ => {}
                }
            }
        }
        previous = Some(best);
    }
}

#[test]
fn round_cap_terminates() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let offsets_seed = 1;

    // zero rounds: only the access seed
    let config = SearchConfig {
        max_rounds: 0,
        ..SearchConfig::default()
    };
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();
    let offsets = FrequencyOffsets::new(&data, offsets_seed);
    let mut worker = RaptorWorker::new(&data, config);
    worker.run(t(EIGHT_AM), &[(0, d(0))], &offsets);
    let reached = worker.best_times().iter().filter(|b| b.is_some()).count();
    assert_eq!(reached, 1);

    // one round reaches the first pattern and its transfer, not the second
    // pattern
    let config = SearchConfig {
        max_rounds: 1,
        ..SearchConfig::default()
    };
    let mut worker = RaptorWorker::new(&data, config);
    worker.run(t(EIGHT_AM), &[(0, d(0))], &offsets);
    assert!(worker.best_times()[3].is_some());
    assert_eq!(worker.best_times()[4], None);
    assert_eq!(worker.best_times()[5], None);

    // two rounds complete the journey
    let config = SearchConfig {
        max_rounds: 2,
        ..SearchConfig::default()
    };
    let mut worker = RaptorWorker::new(&data, config);
    worker.run(t(EIGHT_AM), &[(0, d(0))], &offsets);
    assert!(worker.best_times()[5].is_some());
}

#[test]
fn range_raptor_matches_full_reset() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();
    let access = [(0, d(0))];

    let mut fast_store = PropagatedTimesStore::new(data.target_count());
    let mut fast_worker = RaptorWorker::new(&data, config);
    let mut offsets = FrequencyOffsets::new(&data, 1);
    fast_worker
        .run_window(
            &window,
            &access,
            &mut offsets,
            LabelPolicy::Reuse,
            &mut fast_store,
            None,
        )
        .unwrap();

    let mut slow_store = PropagatedTimesStore::new(data.target_count());
    let mut slow_worker = RaptorWorker::new(&data, config);
    let mut offsets = FrequencyOffsets::new(&data, 1);
    slow_worker
        .run_window(
            &window,
            &access,
            &mut offsets,
            LabelPolicy::Reset,
            &mut slow_store,
            None,
        )
        .unwrap();

    // the label reuse is a pure optimization, every target must agree for
    // every statistic
    assert_eq!(
        fast_store.summarize(SummaryStrategy::MinMax),
        slow_store.summarize(SummaryStrategy::MinMax)
    );
    assert_eq!(fast_store.minutes_merged(), slow_store.minutes_merged());
}

#[test]
fn propagation_takes_minimum_across_stops() {
    use perron::shared::geo::Distance;

    let model = linear_network();
    // a single departure minute
    let window = TimeWindow::new(t(EIGHT_AM), t(EIGHT_AM + 60), model.services.len(), &[0]);
    // one target, reachable from B with a 130 m walk and from C directly
    let mut links = vec![vec![]; model.stops.len()];
    links[1] = vec![(0, Distance::from_meters(130.0))];
    links[2] = vec![(0, Distance::from_meters(0.0))];
    let tree = StopTreeCache::from_links(1, links);
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();

    let mut store = PropagatedTimesStore::new(1);
    let mut worker = RaptorWorker::new(&data, config);
    let mut offsets = FrequencyOffsets::new(&data, 1);
    worker
        .run_window(
            &window,
            &[(0, d(0))],
            &mut offsets,
            LabelPolicy::Reuse,
            &mut store,
            None,
        )
        .unwrap();

    // via B: 900 s of transit plus 100 s of walking, via C: 1200 s flat
    let summary = store.summarize(SummaryStrategy::MinMax)[0].unwrap();
    assert_eq!(summary.lower, 1000);
    assert_eq!(summary.upper, 1000);
    assert_eq!(summary.count, 1);
}

#[test]
fn unreached_target_is_explicit() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();

    let mut store = PropagatedTimesStore::new(data.target_count());
    let mut worker = RaptorWorker::new(&data, config);
    let mut offsets = FrequencyOffsets::new(&data, 1);
    worker
        .run_window(
            &window,
            &[(0, d(0))],
            &mut offsets,
            LabelPolicy::Reuse,
            &mut store,
            None,
        )
        .unwrap();

    let summary = store.summarize(SummaryStrategy::MinMax);
    // the origin target has a real travel time of zero
    let origin = summary[0].unwrap();
    assert_eq!(origin.lower, 0);
    assert_eq!(origin.count, 60);
    // the unserved stop is absent, not zero and not huge
    assert!(summary[6].is_none());
}

#[test]
fn timeout_aborts_cleanly() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();

    let mut store = PropagatedTimesStore::new(data.target_count());
    let mut worker = RaptorWorker::new(&data, config);
    let mut offsets = FrequencyOffsets::new(&data, 1);
    let result = worker.run_window(
        &window,
        &[(0, d(0))],
        &mut offsets,
        LabelPolicy::Reuse,
        &mut store,
        Some(Instant::now()),
    );
    assert!(matches!(result, Err(Error::Timeout)));
    // nothing was committed
    assert_eq!(store.minutes_merged(), 0);
}

#[test]
fn empty_window_rejected() {
    let model = linear_network();
    let window = TimeWindow::new(t(EIGHT_AM), t(EIGHT_AM), model.services.len(), &[0]);
    let tree = identity_stop_tree(&model);
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();

    let mut store = PropagatedTimesStore::new(data.target_count());
    let mut worker = RaptorWorker::new(&data, config);
    let mut offsets = FrequencyOffsets::new(&data, 1);
    let result = worker.run_window(
        &window,
        &[(0, d(0))],
        &mut offsets,
        LabelPolicy::Reuse,
        &mut store,
        None,
    );
    assert!(matches!(result, Err(Error::EmptyWindow)));
}

#[test]
fn missing_transfers_is_fatal() {
    use perron::model::TransitModel;
    use perron::shared::geo::Coordinate;

    let mut builder = TransitModel::builder();
    builder.add_stop("a", "A", Coordinate::default());
    builder.add_service("wk");
    // transfers never installed
    let model = builder.build();

    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let result = WorkerData::build(&model, &window, &tree, SearchConfig::default().walk_speed);
    assert!(matches!(result, Err(WorkerError::MissingTransfers)));
}

#[test]
fn inactive_patterns_are_dropped() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let data =
        WorkerData::build(&model, &window, &tree, SearchConfig::default().walk_speed).unwrap();

    // route 77 only runs at 11:00, the pattern is gone entirely
    assert_eq!(model.patterns.len(), 3);
    assert_eq!(data.pattern_count(), 2);
    assert!(data.patterns_at_stop(6).is_empty());
}

#[test]
fn max_duration_bounds_the_search() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let config = SearchConfig {
        max_duration: d(1000),
        ..SearchConfig::default()
    };
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();

    let mut worker = RaptorWorker::new(&data, config);
    let offsets = FrequencyOffsets::new(&data, 1);
    worker.run(t(EIGHT_AM), &[(0, d(0))], &offsets);

    // B at 900 s is inside the horizon, C at 1200 s is not
    assert!(worker.best_times()[1].is_some());
    assert_eq!(worker.best_times()[2], None);
}
