use rayon::prelude::*;
use tracing::debug;

use crate::{
    model::TransitModel,
    shared::geo::{Coordinate, Distance},
};

/// Precomputed stop-to-target walking distances, the egress side of the
/// search.
///
/// Targets are whatever the caller wants travel times for: street vertices,
/// grid sample points, points of interest. Construction is embarrassingly
/// parallel over stops.
#[derive(Debug, Clone)]
pub struct StopTreeCache {
    target_count: usize,
    /// Per stop: `(target, distance)` pairs within the linking radius.
    links: Box<[Box<[(u32, Distance)]>]>,
}

impl StopTreeCache {
    /// Links every stop to every target within `radius`, straight from
    /// coordinates. Stands in for the street router when none is wired up.
    pub fn build(model: &TransitModel, targets: &[Coordinate], radius: Distance) -> Self {
        let links: Vec<Box<[(u32, Distance)]>> = model
            .stops
            .par_iter()
            .map(|stop| {
                targets
                    .iter()
                    .enumerate()
                    .filter_map(|(target, coordinate)| {
                        let distance = stop.coordinate.network_distance(coordinate);
                        (distance <= radius).then_some((target as u32, distance))
                    })
                    .collect()
            })
            .collect();
        let linked = links.iter().filter(|l| !l.is_empty()).count();
        debug!(
            stops = links.len(),
            linked,
            targets = targets.len(),
            "built stop tree cache"
        );
        Self {
            target_count: targets.len(),
            links: links.into(),
        }
    }

    /// Wraps distances produced by an external street router,
    /// one `(target, distance)` list per stop in model stop order.
    pub fn from_links(target_count: usize, links: Vec<Vec<(u32, Distance)>>) -> Self {
        Self {
            target_count,
            links: links.into_iter().map(Into::into).collect(),
        }
    }

    pub const fn target_count(&self) -> usize {
        self.target_count
    }

    /// Number of stops the cache was built over.
    pub const fn stop_count(&self) -> usize {
        self.links.len()
    }

    pub fn links_for_stop(&self, stop_idx: u32) -> &[(u32, Distance)] {
        &self.links[stop_idx as usize]
    }
}
