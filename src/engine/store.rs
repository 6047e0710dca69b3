use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;

use super::SharedInspectorState;

/// In-memory state for one tenant: the inspector map plus the reverse
/// indexes that make entity ids and public tokens resolvable without a
/// scan. The WAL is the durable side; this is what replay rebuilds.
pub struct TenantStore {
    inspectors: DashMap<Ulid, SharedInspectorState>,
    /// Blackout/booking id → owning inspector.
    entity_to_inspector: DashMap<Ulid, Ulid>,
    /// Public token → booking id.
    tokens: DashMap<String, Ulid>,
}

impl Default for TenantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TenantStore {
    pub fn new() -> Self {
        Self {
            inspectors: DashMap::new(),
            entity_to_inspector: DashMap::new(),
            tokens: DashMap::new(),
        }
    }

    // ── Inspector map ────────────────────────────────────────

    pub fn inspector_count(&self) -> usize {
        self.inspectors.len()
    }

    pub fn contains(&self, id: &Ulid) -> bool {
        self.inspectors.contains_key(id)
    }

    pub fn get(&self, id: &Ulid) -> Option<SharedInspectorState> {
        self.inspectors.get(id).map(|e| e.value().clone())
    }

    pub fn insert(&self, id: Ulid, state: SharedInspectorState) {
        self.inspectors.insert(id, state);
    }

    pub fn remove(&self, id: &Ulid) -> Option<SharedInspectorState> {
        self.inspectors.remove(id).map(|(_, state)| state)
    }

    pub fn iter_inspectors(&self) -> impl Iterator<Item = SharedInspectorState> + '_ {
        self.inspectors.iter().map(|e| e.value().clone())
    }

    // ── Entity index ─────────────────────────────────────────

    pub fn owner_of(&self, entity_id: &Ulid) -> Option<Ulid> {
        self.entity_to_inspector.get(entity_id).map(|e| *e.value())
    }

    pub fn map_entity(&self, entity_id: Ulid, inspector_id: Ulid) {
        self.entity_to_inspector.insert(entity_id, inspector_id);
    }

    pub fn unmap_entity(&self, entity_id: &Ulid) {
        self.entity_to_inspector.remove(entity_id);
    }

    // ── Token index ──────────────────────────────────────────

    pub fn booking_for_token(&self, token: &str) -> Option<Ulid> {
        self.tokens.get(token).map(|e| *e.value())
    }

    fn register_token(&self, token: String, booking_id: Ulid) {
        self.tokens.insert(token, booking_id);
    }

    fn drop_token(&self, token: &str) {
        self.tokens.remove(token);
    }

    /// Drop every index entry owned by an inspector being deleted.
    /// Caller still holds (or solely owns) the state.
    pub fn forget_inspector_entities(&self, ins: &InspectorState) {
        for b in &ins.blackouts {
            self.unmap_entity(&b.id);
        }
        for b in &ins.bookings {
            self.unmap_entity(&b.id);
            if let Some(token) = &b.public_token {
                self.drop_token(token);
            }
        }
    }

    // ── Event application ────────────────────────────────────

    /// Apply an event to an inspector's state and keep the indexes in
    /// step. No locking — the caller holds the write lock.
    pub fn apply_event(&self, ins: &mut InspectorState, event: &Event) {
        match event {
            Event::AvailabilityReplaced { windows, .. } => {
                // Wholesale swap: no partial patching, no stale leftovers.
                ins.windows = windows.clone();
            }
            Event::BlackoutUpserted {
                inspector_id,
                blackout,
            } => {
                ins.blackouts.retain(|b| b.id != blackout.id);
                ins.blackouts.push(blackout.clone());
                self.map_entity(blackout.id, *inspector_id);
            }
            Event::BlackoutRemoved { id, .. } => {
                ins.blackouts.retain(|b| b.id != *id);
                self.unmap_entity(id);
            }
            Event::SettingsUpdated { settings, .. } => {
                ins.settings = Some(*settings);
            }
            Event::BookingCreated {
                inspector_id,
                booking,
            } => {
                if let Some(token) = &booking.public_token {
                    self.register_token(token.clone(), booking.id);
                }
                self.map_entity(booking.id, *inspector_id);
                ins.insert_booking(booking.clone());
            }
            Event::BookingStatusChanged {
                id,
                status,
                updated_at,
                ..
            } => {
                if let Some(b) = ins.booking_mut(*id) {
                    b.status = *status;
                    b.updated_at = *updated_at;
                }
            }
            Event::TokenRevoked { id, .. } => {
                if let Some(b) = ins.booking_mut(*id)
                    && let Some(token) = b.public_token.take()
                {
                    self.drop_token(&token);
                }
            }
            // Created/Deleted are handled at the map level, not here.
            Event::InspectorCreated { .. } | Event::InspectorDeleted { .. } => {}
        }
    }
}
