#![allow(dead_code)]

use perron::{
    model::TransitModel,
    shared::{
        geo::{Coordinate, Distance},
        time::{Duration, Time},
    },
    window::TimeWindow,
    worker::StopTreeCache,
};

pub const EIGHT_AM: u32 = 8 * 3600;
pub const NINE_AM: u32 = 9 * 3600;

pub fn t(seconds: u32) -> Time {
    Time::from_seconds(seconds)
}

pub fn d(seconds: u32) -> Duration {
    Duration::from_seconds(seconds)
}

/// A small linear network:
///
/// ```text
/// A --12--> B --12--> C ~walk~ D --43--> E --43--> F     G (no service in window)
/// ```
///
/// Route 12 runs A-B-C every 10 minutes from 08:00, 5 minutes between
/// stops. Route 43 runs D-E-F every 10 minutes from 08:15. C and D are
/// joined by a 130 m transfer both ways (100 s at the default walk speed).
/// Route 77 serves G only at 11:00, outside the test window.
pub fn linear_network() -> TransitModel {
    let mut builder = TransitModel::builder();
    for (i, id) in ["a", "b", "c", "d", "e", "f", "g"].iter().enumerate() {
        builder.add_stop(
            id,
            &id.to_uppercase(),
            Coordinate {
                latitude: 59.3 + i as f64 * 0.01,
                longitude: 18.0,
            },
        );
    }
    let wk = builder.add_service("wk");

    let p12 = builder.add_pattern("12", &["a", "b", "c"]).unwrap();
    for k in 0..6u32 {
        let dep = EIGHT_AM + k * 600;
        builder
            .add_trip(
                &format!("12-{k}"),
                p12,
                wk,
                &[
                    (t(dep), t(dep)),
                    (t(dep + 300), t(dep + 300)),
                    (t(dep + 600), t(dep + 600)),
                ],
            )
            .unwrap();
    }

    let p43 = builder.add_pattern("43", &["d", "e", "f"]).unwrap();
    for k in 0..6u32 {
        let dep = EIGHT_AM + 900 + k * 600;
        builder
            .add_trip(
                &format!("43-{k}"),
                p43,
                wk,
                &[
                    (t(dep), t(dep)),
                    (t(dep + 300), t(dep + 300)),
                    (t(dep + 600), t(dep + 600)),
                ],
            )
            .unwrap();
    }

    // runs outside the window, so the whole pattern gets dropped
    let p77 = builder.add_pattern("77", &["g"]).unwrap();
    builder
        .add_trip("77-0", p77, wk, &[(t(11 * 3600), t(11 * 3600))])
        .unwrap();

    builder
        .add_transfer("c", "d", Distance::from_meters(130.0))
        .unwrap();
    builder
        .add_transfer("d", "c", Distance::from_meters(130.0))
        .unwrap();

    builder.build()
}

/// Like [`linear_network`] but with a second route "91" covering the same
/// A-B-C stops as route "12", offset by 5 minutes.
pub fn double_route_network() -> TransitModel {
    let mut builder = TransitModel::builder();
    for (i, id) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
        builder.add_stop(
            id,
            &id.to_uppercase(),
            Coordinate {
                latitude: 59.3 + i as f64 * 0.01,
                longitude: 18.0,
            },
        );
    }
    let wk = builder.add_service("wk");

    for (route, offset) in [("12", 0u32), ("91", 300u32)] {
        let pattern = builder.add_pattern(route, &["a", "b", "c"]).unwrap();
        for k in 0..6u32 {
            let dep = EIGHT_AM + offset + k * 600;
            builder
                .add_trip(
                    &format!("{route}-{k}"),
                    pattern,
                    wk,
                    &[
                        (t(dep), t(dep)),
                        (t(dep + 300), t(dep + 300)),
                        (t(dep + 600), t(dep + 600)),
                    ],
                )
                .unwrap();
        }
    }

    let p43 = builder.add_pattern("43", &["d", "e", "f"]).unwrap();
    for k in 0..6u32 {
        let dep = EIGHT_AM + 900 + k * 600;
        builder
            .add_trip(
                &format!("43-{k}"),
                p43,
                wk,
                &[
                    (t(dep), t(dep)),
                    (t(dep + 300), t(dep + 300)),
                    (t(dep + 600), t(dep + 600)),
                ],
            )
            .unwrap();
    }

    builder
        .add_transfer("c", "d", Distance::from_meters(130.0))
        .unwrap();
    builder
        .add_transfer("d", "c", Distance::from_meters(130.0))
        .unwrap();

    builder.build()
}

/// Two stops joined by a single headway-based pattern: every 10 minutes
/// between 08:00 and 09:00, 5 minutes of riding.
pub fn frequency_network() -> TransitModel {
    let mut builder = TransitModel::builder();
    builder.add_stop(
        "a",
        "A",
        Coordinate {
            latitude: 59.3,
            longitude: 18.0,
        },
    );
    builder.add_stop(
        "b",
        "B",
        Coordinate {
            latitude: 59.31,
            longitude: 18.0,
        },
    );
    let wk = builder.add_service("wk");
    let pattern = builder.add_pattern("F1", &["a", "b"]).unwrap();
    builder
        .add_frequency(
            pattern,
            wk,
            &[(t(0), t(0)), (t(300), t(300))],
            t(EIGHT_AM),
            t(NINE_AM),
            d(600),
        )
        .unwrap();
    builder.set_transfers(vec![]);
    builder.build()
}

pub fn window_8_to_9(model: &TransitModel) -> TimeWindow {
    TimeWindow::new(t(EIGHT_AM), t(NINE_AM), model.services.len(), &[0])
}

/// One target per stop, zero walking distance.
pub fn identity_stop_tree(model: &TransitModel) -> StopTreeCache {
    let links = (0..model.stops.len())
        .map(|stop| vec![(stop as u32, Distance::from_meters(0.0))])
        .collect();
    StopTreeCache::from_links(model.stops.len(), links)
}
