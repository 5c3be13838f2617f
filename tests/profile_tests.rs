mod common;

use std::collections::HashMap;

use common::*;
use perron::{
    profile::{Error, ProfileConfig, ProfileRouter},
    raptor::SearchConfig,
    worker::WorkerData,
};

#[test]
fn single_chain_option() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let data =
        WorkerData::build(&model, &window, &tree, SearchConfig::default().walk_speed).unwrap();

    let mut router = ProfileRouter::new(&model, &data, &window, ProfileConfig::default());
    let options = router
        .route(&[(0, d(0))], &[(5, d(0))])
        .unwrap();

    assert_eq!(options.len(), 1);
    let option = &options[0];
    assert_eq!(option.summary, "12 -> 43");
    assert_eq!(option.transfers, 1);
    // slack + best-case waits + rides + the 100 s transfer walk
    assert_eq!(option.stats.min, 1300);
    assert_eq!(option.stats.max, 2500);
    assert_eq!(option.stats.avg, 1900);
    assert!(option.stats.min <= option.stats.avg);
    assert!(option.stats.avg <= option.stats.max);
}

#[test]
fn option_bounds_cover_scalar_search() {
    use perron::{
        raptor::RaptorWorker,
        worker::FrequencyOffsets,
    };

    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let config = SearchConfig::default();
    let data = WorkerData::build(&model, &window, &tree, config.walk_speed).unwrap();

    let mut router = ProfileRouter::new(&model, &data, &window, ProfileConfig::default());
    let options = router.route(&[(0, d(0))], &[(5, d(0))]).unwrap();
    let option = &options[0];

    // the exact travel time of a single departure must fall inside the
    // profile bounds
    let mut worker = RaptorWorker::new(&data, config);
    let offsets = FrequencyOffsets::new(&data, 1);
    worker.run(t(EIGHT_AM), &[(0, d(0))], &offsets);
    let exact = (worker.best_times()[5].unwrap() - t(EIGHT_AM)).as_seconds();

    assert!(option.stats.min <= exact);
    assert!(exact <= option.stats.max);
}

#[test]
fn parallel_routes_group_into_one_ride() {
    let model = double_route_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let data =
        WorkerData::build(&model, &window, &tree, SearchConfig::default().walk_speed).unwrap();

    let mut router = ProfileRouter::new(&model, &data, &window, ProfileConfig::default());
    let options = router.route(&[(0, d(0))], &[(5, d(0))]).unwrap();

    // routes 12 and 91 cover the same stops, they are one branching choice
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].summary, "12/91 -> 43");
}

#[test]
fn dominance_invariant_holds() {
    for model in [linear_network(), double_route_network()] {
        let window = window_8_to_9(&model);
        let tree = identity_stop_tree(&model);
        let data =
            WorkerData::build(&model, &window, &tree, SearchConfig::default().walk_speed)
                .unwrap();

        let mut router = ProfileRouter::new(&model, &data, &window, ProfileConfig::default());
        router.route(&[(0, d(0))], &[(5, d(0))]).unwrap();

        let mut min_upper: HashMap<u32, u32> = HashMap::new();
        for state in router.retained_states() {
            let entry = min_upper
                .entry(state.stop)
                .or_insert(state.upper.as_seconds());
            *entry = (*entry).min(state.upper.as_seconds());
        }
        for state in router.retained_states() {
            assert!(
                state.lower.as_seconds() <= min_upper[&state.stop],
                "state at stop {} with lower {} outlives upper bound {}",
                state.stop,
                state.lower.as_seconds(),
                min_upper[&state.stop]
            );
        }
    }
}

#[test]
fn no_pattern_is_ridden_twice() {
    let model = double_route_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let data =
        WorkerData::build(&model, &window, &tree, SearchConfig::default().walk_speed).unwrap();

    let mut router = ProfileRouter::new(&model, &data, &window, ProfileConfig::default());
    router.route(&[(0, d(0))], &[(5, d(0))]).unwrap();

    for state in router.retained_states() {
        let mut seen = state.patterns.clone();
        seen.dedup();
        assert_eq!(seen.len(), state.patterns.len());
    }
}

#[test]
fn cutoff_prunes_everything_too_slow() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let data =
        WorkerData::build(&model, &window, &tree, SearchConfig::default().walk_speed).unwrap();

    let config = ProfileConfig {
        cutoff: d(900),
        ..ProfileConfig::default()
    };
    let mut router = ProfileRouter::new(&model, &data, &window, config);
    let options = router.route(&[(0, d(0))], &[(5, d(0))]).unwrap();
    assert!(options.is_empty());
}

#[test]
fn empty_access_is_an_error() {
    let model = linear_network();
    let window = window_8_to_9(&model);
    let tree = identity_stop_tree(&model);
    let data =
        WorkerData::build(&model, &window, &tree, SearchConfig::default().walk_speed).unwrap();

    let mut router = ProfileRouter::new(&model, &data, &window, ProfileConfig::default());
    let result = router.route(&[], &[(5, d(0))]);
    assert!(matches!(result, Err(Error::EmptyAccess)));
}
