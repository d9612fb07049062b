/*!
Contact bookkeeping between collision events.

The host forwards begin/persist/end collision events for the driven body;
the tracker keeps the latest contact points per partner so the ground
detector can re-validate them each tick. Partners are keyed by a stable id
in a `BTreeMap` so iteration order (and therefore ground-normal accumulation)
is deterministic.
*/

use std::collections::BTreeMap;

use crate::types::Vec3;

/// Stable identity of a collision partner, chosen by the host
/// (e.g., a packed collider handle).
pub type PartnerId = u64;

/// A single contact point reported by the physics engine.
#[derive(Clone, Copy, Debug)]
pub struct ContactPoint {
    /// World-space contact position.
    pub point: Vec3,
    /// World-space surface normal at the contact.
    pub normal: Vec3,
}

/// Everything tracked for one collision partner.
#[derive(Clone, Debug)]
pub struct PartnerContact {
    /// Whether the partner is a dynamic (non-fixed) body.
    pub dynamic: bool,
    /// Latest reported contact points, replaced wholesale on each event.
    pub points: Vec<ContactPoint>,
}

/// Live contact snapshot for the driven body.
#[derive(Debug, Default)]
pub struct ContactTracker {
    partners: BTreeMap<PartnerId, PartnerContact>,
    touching_dynamic: bool,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A contact with `partner` started. Inserts or overwrites the entry.
    ///
    /// The dynamic flag only latches on here; it is re-derived on contact end.
    pub fn on_contact_begin(
        &mut self,
        partner: PartnerId,
        is_dynamic: bool,
        points: Vec<ContactPoint>,
    ) {
        self.partners.insert(
            partner,
            PartnerContact {
                dynamic: is_dynamic,
                points,
            },
        );
        if is_dynamic {
            self.touching_dynamic = true;
        }
    }

    /// A contact with `partner` is still active; replace its points.
    ///
    /// A persist for an unknown partner (no begin observed) is tolerated and
    /// tracked as non-dynamic: it can support the body but never suppresses
    /// the idle-hold path.
    pub fn on_contact_persist(&mut self, partner: PartnerId, points: Vec<ContactPoint>) {
        let entry = self.partners.entry(partner).or_insert(PartnerContact {
            dynamic: false,
            points: Vec::new(),
        });
        entry.points = points;
    }

    /// The contact with `partner` ended.
    ///
    /// `touching_dynamic` is recomputed by rescanning the remaining partners
    /// rather than trusting incremental bookkeeping.
    pub fn on_contact_end(&mut self, partner: PartnerId) {
        self.partners.remove(&partner);
        self.touching_dynamic = self.partners.values().any(|c| c.dynamic);
    }

    /// Whether any tracked partner is a dynamic body.
    #[inline]
    pub fn touching_dynamic(&self) -> bool {
        self.touching_dynamic
    }

    /// All tracked contact points, across partners, in deterministic order.
    pub fn points(&self) -> impl Iterator<Item = &ContactPoint> {
        self.partners.values().flat_map(|c| c.points.iter())
    }

    #[inline]
    pub fn partner_count(&self) -> usize {
        self.partners.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.partners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(y: f32) -> ContactPoint {
        ContactPoint {
            point: Vec3::new(0.0, y, 0.0),
            normal: Vec3::y(),
        }
    }

    #[test]
    fn begin_tracks_partner_and_dynamic_flag() {
        let mut tracker = ContactTracker::new();
        tracker.on_contact_begin(7, true, vec![point_at(0.0)]);
        assert_eq!(tracker.partner_count(), 1);
        assert!(tracker.touching_dynamic());
    }

    #[test]
    fn begin_for_known_partner_replaces_points() {
        let mut tracker = ContactTracker::new();
        tracker.on_contact_begin(7, false, vec![point_at(0.0), point_at(1.0)]);
        tracker.on_contact_begin(7, false, vec![point_at(2.0)]);
        assert_eq!(tracker.partner_count(), 1);
        assert_eq!(tracker.points().count(), 1);
    }

    #[test]
    fn persist_overwrites_points() {
        let mut tracker = ContactTracker::new();
        tracker.on_contact_begin(1, false, vec![point_at(0.0)]);
        tracker.on_contact_persist(1, vec![point_at(0.5), point_at(0.6)]);
        assert_eq!(tracker.points().count(), 2);
    }

    #[test]
    fn persist_without_begin_inserts_non_dynamic() {
        let mut tracker = ContactTracker::new();
        tracker.on_contact_persist(9, vec![point_at(0.0)]);
        assert_eq!(tracker.partner_count(), 1);
        assert!(!tracker.touching_dynamic());
    }

    #[test]
    fn end_rescans_remaining_partners_for_dynamic() {
        let mut tracker = ContactTracker::new();
        tracker.on_contact_begin(1, true, vec![point_at(0.0)]);
        tracker.on_contact_begin(2, true, vec![point_at(0.0)]);
        tracker.on_contact_begin(3, false, vec![point_at(0.0)]);

        tracker.on_contact_end(1);
        assert!(tracker.touching_dynamic(), "partner 2 is still dynamic");

        tracker.on_contact_end(2);
        assert!(!tracker.touching_dynamic(), "only the static partner remains");

        tracker.on_contact_end(3);
        assert!(tracker.is_empty());
        assert!(!tracker.touching_dynamic());
    }

    #[test]
    fn end_for_unknown_partner_is_harmless() {
        let mut tracker = ContactTracker::new();
        tracker.on_contact_begin(1, true, vec![point_at(0.0)]);
        tracker.on_contact_end(42);
        assert_eq!(tracker.partner_count(), 1);
        assert!(tracker.touching_dynamic());
    }
}
