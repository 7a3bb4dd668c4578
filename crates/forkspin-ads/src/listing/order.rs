//! Ordering strategies for the listing.

use std::cmp::Ordering;

use forkspin_cache::Coordinates;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::item::DisplayItem;
use crate::ids::RestaurantId;

/// How the non-sponsored items are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderMode {
    /// Uniform random permutation, fixed for the session.
    Randomized,
    /// Sorted by distance and/or recency.
    Sorted { nearby: bool, newest: bool },
}

impl OrderMode {
    /// Mode for the sort toggles. Neither toggle on means randomized.
    pub fn from_toggles(nearby: bool, newest: bool) -> Self {
        if nearby || newest {
            OrderMode::Sorted { nearby, newest }
        } else {
            OrderMode::Randomized
        }
    }

    pub fn is_randomized(&self) -> bool {
        matches!(self, OrderMode::Randomized)
    }
}

/// Uniform in-place permutation (Fisher–Yates).
pub fn shuffle<T, R>(items: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    items.shuffle(rng);
}

/// Stable sort by ascending distance and/or descending creation time.
///
/// With both toggles on, distance decides and recency breaks ties. Items
/// whose distance is unknown sort after every located item.
pub fn sort(items: &mut [DisplayItem], nearby: bool, newest: bool, origin: Option<Coordinates>) {
    items.sort_by(|a, b| {
        let by_distance = if nearby {
            compare_distance(a.distance_from(origin), b.distance_from(origin))
        } else {
            Ordering::Equal
        };
        by_distance.then_with(|| {
            if newest {
                b.created_at.cmp(&a.created_at)
            } else {
                Ordering::Equal
            }
        })
    });
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order `items` for `mode`.
pub fn order_items<R>(mut items: Vec<DisplayItem>, mode: OrderMode, origin: Option<Coordinates>, rng: &mut R) -> Vec<DisplayItem>
where
    R: Rng + ?Sized,
{
    match mode {
        OrderMode::Randomized => shuffle(&mut items, rng),
        OrderMode::Sorted { nearby, newest } => sort(&mut items, nearby, newest, origin),
    }
    items
}

/// Full listing order: the sponsored item first, then the ordered rest.
///
/// The sponsored restaurant is removed from `candidates` so it never shows
/// twice.
pub fn arrange<R>(
    candidates: &[DisplayItem],
    sponsored: Option<&DisplayItem>,
    mode: OrderMode,
    origin: Option<Coordinates>,
    rng: &mut R,
) -> Vec<DisplayItem>
where
    R: Rng + ?Sized,
{
    let sponsored_id: Option<&RestaurantId> = sponsored.map(|s| &s.id);
    let rest: Vec<DisplayItem> = candidates
        .iter()
        .filter(|item| Some(&item.id) != sponsored_id)
        .map(|item| {
            let mut item = item.clone();
            item.is_sponsored = false;
            item
        })
        .collect();

    let mut order = Vec::with_capacity(rest.len() + 1);
    if let Some(featured) = sponsored {
        order.push(featured.clone().sponsored());
    }
    order.extend(order_items(rest, mode, origin, rng));
    order
}
