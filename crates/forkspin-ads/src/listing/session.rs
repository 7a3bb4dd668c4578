//! Listing sessions.

use std::collections::{HashMap, HashSet};

use forkspin_cache::Coordinates;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::item::DisplayItem;
use super::order::{arrange, shuffle, OrderMode};
use super::window::VisibleWindow;
use crate::ids::RestaurantId;

/// The filter combination a listing order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub category: String,
    pub nearby: bool,
    pub newest: bool,
}

impl SessionKey {
    pub fn new(category: impl Into<String>, nearby: bool, newest: bool) -> Self {
        Self {
            category: category.into(),
            nearby,
            newest,
        }
    }

    /// Ordering mode implied by the sort toggles.
    pub fn mode(&self) -> OrderMode {
        OrderMode::from_toggles(self.nearby, self.newest)
    }
}

/// One memoized listing order and how much of it is visible.
#[derive(Debug, Clone, PartialEq)]
pub struct ShuffleSession {
    key: SessionKey,
    sponsored: Option<RestaurantId>,
    order: Vec<DisplayItem>,
    window: VisibleWindow,
}

impl ShuffleSession {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// The restaurant pinned at index 0, if any.
    pub fn sponsored(&self) -> Option<&RestaurantId> {
        self.sponsored.as_ref()
    }

    /// The whole order, sponsored item first when present.
    pub fn order(&self) -> &[DisplayItem] {
        &self.order
    }

    pub fn window(&self) -> VisibleWindow {
        self.window
    }

    /// `order[0..visible_count]`.
    pub fn visible(&self) -> &[DisplayItem] {
        &self.order[..self.window.visible_count()]
    }
}

/// Stateful listing: keeps one [`ShuffleSession`] and replaces it whenever
/// the filter combination changes.
///
/// Past orders are never cached. Going from category A to B and back to A
/// produces a new order for A.
pub struct Listing<R> {
    rng: R,
    page_size: usize,
    origin: Option<Coordinates>,
    session: Option<ShuffleSession>,
}

impl<R: Rng> Listing<R> {
    /// Create an empty listing drawing randomness from `rng`.
    pub fn new(rng: R, page_size: usize) -> Self {
        Self {
            rng,
            page_size: page_size.max(1),
            origin: None,
            session: None,
        }
    }

    /// The user's position, used by the nearby ordering.
    pub fn set_origin(&mut self, origin: Option<Coordinates>) {
        self.origin = origin;
    }

    /// Bring the listing up to date and return the visible items.
    ///
    /// A new `key` or a different sponsored restaurant starts a fresh
    /// session: a new order and a one-page window. Otherwise the session is
    /// kept. A randomized order only
    /// changes where candidates appeared or vanished; a sorted order is
    /// re-sorted so late coordinates take effect. The window never shrinks
    /// within a session.
    pub fn refresh(
        &mut self,
        key: SessionKey,
        candidates: &[DisplayItem],
        sponsored: Option<&DisplayItem>,
    ) -> &[DisplayItem] {
        let sponsored_id = sponsored.map(|s| s.id.clone());
        let session = match self.session.take() {
            Some(session) if session.key == key && session.sponsored == sponsored_id => {
                self.reconcile(session, candidates, sponsored)
            }
            previous => {
                if let Some(previous) = previous {
                    debug!(
                        from = ?previous.key,
                        to = ?key,
                        sponsored = ?sponsored_id,
                        "listing session changed, discarding order"
                    );
                }
                let order = arrange(candidates, sponsored, key.mode(), self.origin, &mut self.rng);
                let window = VisibleWindow::new(self.page_size, order.len());
                ShuffleSession {
                    key,
                    sponsored: sponsored_id,
                    order,
                    window,
                }
            }
        };
        self.session = Some(session);
        self.visible()
    }

    /// Reveal one more page and return the visible items.
    pub fn load_more(&mut self) -> &[DisplayItem] {
        if let Some(session) = self.session.as_mut() {
            session.window.load_more();
        }
        self.visible()
    }

    /// Items currently on screen.
    pub fn visible(&self) -> &[DisplayItem] {
        self.session
            .as_ref()
            .map(ShuffleSession::visible)
            .unwrap_or(&[])
    }

    pub fn session(&self) -> Option<&ShuffleSession> {
        self.session.as_ref()
    }

    /// Drop the current session.
    pub fn reset(&mut self) {
        self.session = None;
    }

    fn reconcile(
        &mut self,
        mut session: ShuffleSession,
        candidates: &[DisplayItem],
        sponsored: Option<&DisplayItem>,
    ) -> ShuffleSession {
        let mode = session.key.mode();
        session.order = match mode {
            OrderMode::Sorted { .. } => arrange(candidates, sponsored, mode, self.origin, &mut self.rng),
            OrderMode::Randomized => {
                let sponsored_id = sponsored.map(|s| &s.id);
                let fresh: HashMap<&RestaurantId, &DisplayItem> = candidates
                    .iter()
                    .filter(|item| Some(&item.id) != sponsored_id)
                    .map(|item| (&item.id, item))
                    .collect();

                let mut kept = HashSet::new();
                let mut order: Vec<DisplayItem> = sponsored
                    .map(|s| s.clone().sponsored())
                    .into_iter()
                    .collect();

                for old in session.order.iter().filter(|item| !item.is_sponsored) {
                    if let Some(item) = fresh.get(&old.id) {
                        order.push(unsponsored(item));
                        kept.insert(old.id.clone());
                    }
                }

                let mut added: Vec<DisplayItem> = candidates
                    .iter()
                    .filter(|item| Some(&item.id) != sponsored_id && !kept.contains(&item.id))
                    .map(unsponsored)
                    .collect();
                shuffle(&mut added, &mut self.rng);
                order.extend(added);
                order
            }
        };
        session.window.set_total(session.order.len());
        session
    }
}

fn unsponsored(item: &DisplayItem) -> DisplayItem {
    let mut item = item.clone();
    item.is_sponsored = false;
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn items(n: usize) -> Vec<DisplayItem> {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| DisplayItem::new(format!("r-{}", i), format!("Place {}", i), base + Duration::hours(i as i64)))
            .collect()
    }

    fn ids(items: &[DisplayItem]) -> Vec<String> {
        items.iter().map(|i| i.id.to_string()).collect()
    }

    fn listing() -> Listing<StdRng> {
        Listing::new(StdRng::seed_from_u64(99), 10)
    }

    #[test]
    fn test_same_key_same_order() {
        let candidates = items(25);
        let mut listing = listing();
        let key = SessionKey::new("all", false, false);

        let first = ids(listing.refresh(key.clone(), &candidates, None));
        for _ in 0..5 {
            assert_eq!(ids(listing.refresh(key.clone(), &candidates, None)), first);
        }
    }

    #[test]
    fn test_category_round_trip_reshuffles() {
        let candidates = items(12);
        let mut listing = listing();
        let a = SessionKey::new("sushi", false, false);
        let b = SessionKey::new("ramen", false, false);

        listing.refresh(a.clone(), &candidates, None);
        let first = ids(listing.session().unwrap().order());
        listing.refresh(b, &candidates, None);
        listing.refresh(a, &candidates, None);
        let second = ids(listing.session().unwrap().order());

        assert_ne!(first, second);
    }

    #[test]
    fn test_toggle_change_resets_window() {
        let candidates = items(30);
        let mut listing = listing();
        let key = SessionKey::new("all", false, true);

        listing.refresh(key.clone(), &candidates, None);
        listing.load_more();
        assert_eq!(listing.visible().len(), 20);

        listing.refresh(SessionKey::new("all", false, false), &candidates, None);
        assert_eq!(listing.visible().len(), 10);
        listing.refresh(key, &candidates, None);
        assert_eq!(listing.visible().len(), 10);
    }

    #[test]
    fn test_load_more_keeps_prefix() {
        let candidates = items(25);
        let mut listing = listing();
        let mut previous = ids(listing.refresh(SessionKey::new("all", false, false), &candidates, None));
        assert_eq!(previous.len(), 10);

        for expected in [20, 25, 25] {
            let current = ids(listing.load_more());
            assert_eq!(current.len(), expected);
            assert_eq!(&current[..previous.len()], &previous[..]);
            previous = current;
        }
    }

    #[test]
    fn test_sponsored_pinned_to_top() {
        let candidates = items(15);
        let featured = candidates[7].clone();
        let mut listing = listing();

        for key in [SessionKey::new("all", false, false), SessionKey::new("all", false, true)] {
            let visible = listing.refresh(key, &candidates, Some(&featured));
            assert_eq!(visible[0].id, featured.id);
            assert!(visible[0].is_sponsored);
            let order = listing.session().unwrap().order();
            assert_eq!(order.len(), 15);
            assert_eq!(order.iter().filter(|i| i.id == featured.id).count(), 1);
        }
    }

    #[test]
    fn test_newest_order() {
        let candidates = items(5);
        let mut listing = listing();
        let visible = ids(listing.refresh(SessionKey::new("all", false, true), &candidates, None));
        assert_eq!(visible, vec!["r-4", "r-3", "r-2", "r-1", "r-0"]);
    }

    #[test]
    fn test_candidate_change_keeps_survivors_in_place() {
        let candidates = items(15);
        let mut listing = listing();
        let key = SessionKey::new("all", false, false);

        listing.refresh(key.clone(), &candidates, None);
        listing.load_more();
        let before = ids(listing.session().unwrap().order());

        let removed = before[3].clone();
        let mut changed: Vec<DisplayItem> = candidates
            .iter()
            .filter(|i| i.id.as_str() != removed)
            .cloned()
            .collect();
        changed.push(DisplayItem::new("r-new", "New Place", Utc::now()));

        listing.refresh(key, &changed, None);
        let after = ids(listing.session().unwrap().order());

        let survivors: Vec<String> = before.into_iter().filter(|id| *id != removed).collect();
        assert_eq!(&after[..14], &survivors[..]);
        assert_eq!(after[14], "r-new");
        assert_eq!(listing.visible().len(), 15);
    }

    #[test]
    fn test_nearby_resorts_when_coordinates_arrive() {
        let mut candidates = items(3);
        let mut listing = listing();
        listing.set_origin(Some(Coordinates::new(0.0, 0.0)));
        let key = SessionKey::new("all", true, false);

        let first = ids(listing.refresh(key.clone(), &candidates, None));
        assert_eq!(first, vec!["r-0", "r-1", "r-2"]);

        candidates[2].coordinates = Some(Coordinates::new(0.01, 0.01));
        let second = ids(listing.refresh(key, &candidates, None));
        assert_eq!(second, vec!["r-2", "r-0", "r-1"]);
    }

    #[test]
    fn test_late_sponsor_starts_new_session() {
        let candidates = items(25);
        let mut listing = listing();
        let key = SessionKey::new("all", false, false);

        listing.refresh(key.clone(), &candidates, None);
        listing.load_more();
        let featured = listing.visible()[5].clone();

        let visible = ids(listing.refresh(key.clone(), &candidates, Some(&featured)));
        assert_eq!(visible.len(), 10);
        assert_eq!(visible[0], featured.id.to_string());
        assert_eq!(listing.session().unwrap().sponsored(), Some(&featured.id));

        // Re-renders with the same sponsor keep the new order and window
        listing.load_more();
        let before = ids(listing.visible());
        let after = ids(listing.refresh(key, &candidates, Some(&featured)));
        assert_eq!(before, after);
        assert_eq!(after.len(), 20);
    }

    #[test]
    fn test_empty_listing() {
        let mut listing = listing();
        assert!(listing.visible().is_empty());
        assert!(listing.refresh(SessionKey::new("all", false, false), &[], None).is_empty());
        assert!(listing.load_more().is_empty());
    }
}
