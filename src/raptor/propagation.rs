use crate::{
    shared::{
        geo::{Speed, walk_time},
        time::{Duration, Time},
    },
    worker::WorkerData,
};

/// Converts finalized per-stop arrival times into per-target travel times
/// for one departure minute.
///
/// Several stops can reach the same target; the minimum across contributing
/// stops wins for the minute. An unreached stop contributes nothing and a
/// target no stop reaches stays `None` — zero is a valid travel time and
/// must never double as the unreached marker.
pub fn propagate(
    data: &WorkerData,
    best_times: &[Option<Time>],
    departure: Time,
    walk_speed: Speed,
    max_duration: Duration,
    out: &mut [Option<Duration>],
) {
    out.fill(None);
    for (stop, arrival) in best_times.iter().enumerate() {
        let Some(arrival) = arrival else {
            continue;
        };
        let Some(on_transit) = arrival.since(departure) else {
            continue;
        };
        for link in data.egress_from(stop as u32) {
            let total = on_transit + walk_time(link.distance, walk_speed);
            if total > max_duration {
                continue;
            }
            let slot = &mut out[link.target as usize];
            match slot {
                Some(best) if *best <= total => {}
                _ => *slot = Some(total),
            }
        }
    }
}
