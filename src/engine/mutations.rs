use std::sync::Arc;

use tokio::sync::RwLock;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::conflict::{
    check_no_conflict, check_within_published, now_min, validate_blackout,
    validate_booking_request, validate_settings, validate_window_set,
};
use super::{Engine, EngineError};

impl Engine {
    pub async fn create_inspector(
        &self,
        id: Ulid,
        name: Option<String>,
    ) -> Result<(), EngineError> {
        if self.store.inspector_count() >= MAX_INSPECTORS_PER_TENANT {
            return Err(EngineError::LimitExceeded("too many inspectors"));
        }
        if let Some(n) = &name
            && n.len() > MAX_NAME_LEN
        {
            return Err(EngineError::LimitExceeded("inspector name too long"));
        }
        if self.store.contains(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        let event = Event::InspectorCreated {
            id,
            name: name.clone(),
        };
        self.wal_append(&event).await?;
        self.store
            .insert(id, Arc::new(RwLock::new(InspectorState::new(id, name))));
        self.notify.send(id, &event);
        Ok(())
    }

    pub async fn delete_inspector(&self, id: Ulid) -> Result<(), EngineError> {
        let state = self
            .store
            .get(&id)
            .ok_or(EngineError::NotFound(Some(id)))?;
        // Hold the write lock so no booking commits interleave with the
        // removal.
        let guard = state.write().await;

        let event = Event::InspectorDeleted { id };
        self.wal_append(&event).await?;
        self.store.forget_inspector_entities(&guard);
        drop(guard);
        self.store.remove(&id);
        self.notify.send(id, &event);
        self.notify.remove(&id);
        Ok(())
    }

    /// Atomic wholesale swap of one inspector's full window set. An
    /// empty set clears availability. There is no partial patch — that
    /// is what keeps stale overlapping leftovers impossible.
    pub async fn replace_availability(
        &self,
        inspector_id: Ulid,
        windows: Vec<WeeklyWindow>,
    ) -> Result<(), EngineError> {
        if windows.len() > MAX_WINDOWS_PER_INSPECTOR {
            return Err(EngineError::LimitExceeded("too many availability windows"));
        }
        validate_window_set(&windows)?;

        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(Some(inspector_id)))?;
        let mut guard = state.write().await;

        let event = Event::AvailabilityReplaced {
            inspector_id,
            windows,
        };
        self.persist_and_apply(inspector_id, &mut guard, &event).await
    }

    pub async fn upsert_blackout(
        &self,
        inspector_id: Ulid,
        blackout: Blackout,
    ) -> Result<(), EngineError> {
        validate_blackout(&blackout)?;

        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(Some(inspector_id)))?;
        let mut guard = state.write().await;

        let replacing = guard.blackouts.iter().any(|b| b.id == blackout.id);
        if !replacing && guard.blackouts.len() >= MAX_BLACKOUTS_PER_INSPECTOR {
            return Err(EngineError::LimitExceeded("too many blackouts"));
        }

        let event = Event::BlackoutUpserted {
            inspector_id,
            blackout,
        };
        self.persist_and_apply(inspector_id, &mut guard, &event).await
    }

    pub async fn remove_blackout(&self, id: Ulid) -> Result<Ulid, EngineError> {
        let (inspector_id, mut guard) = self.resolve_entity_write(&id).await?;
        // The entity index also holds booking ids; only a blackout may
        // be removed through this path.
        if !guard.blackouts.iter().any(|b| b.id == id) {
            return Err(EngineError::NotFound(Some(id)));
        }
        let event = Event::BlackoutRemoved { id, inspector_id };
        self.persist_and_apply(inspector_id, &mut guard, &event).await?;
        Ok(inspector_id)
    }

    /// Patch upsert: unset fields keep their current (or default) value.
    pub async fn update_settings(
        &self,
        inspector_id: Ulid,
        patch: SettingsPatch,
    ) -> Result<Settings, EngineError> {
        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(Some(inspector_id)))?;
        let mut guard = state.write().await;

        let settings = guard.effective_settings().apply(&patch);
        validate_settings(&settings)?;

        let event = Event::SettingsUpdated {
            inspector_id,
            settings,
        };
        self.persist_and_apply(inspector_id, &mut guard, &event).await?;
        Ok(settings)
    }

    /// Validate and commit a requested slot into a Booking.
    ///
    /// The overlap+buffer check runs against the live booking set while
    /// the inspector's write lock is held across check, WAL append, and
    /// insert — two racing calls for overlapping intervals serialize
    /// here and exactly one wins.
    pub async fn create_booking(
        &self,
        req: BookingRequest,
        channel: Channel,
    ) -> Result<Booking, EngineError> {
        validate_booking_request(&req)?;

        let state = self
            .store
            .get(&req.inspector_id)
            .ok_or(EngineError::NotFound(Some(req.inspector_id)))?;
        let mut guard = state.write_owned().await;

        if guard.bookings.len() >= MAX_BOOKINGS_PER_INSPECTOR {
            return Err(EngineError::LimitExceeded("too many bookings"));
        }
        if self.store.owner_of(&req.id).is_some() {
            return Err(EngineError::AlreadyExists(req.id));
        }

        let settings = guard.effective_settings();
        if channel == Channel::Public && !settings.widget_enabled {
            return Err(EngineError::WidgetDisabled);
        }

        let now = now_min();
        let day = day_start(req.date);
        let span = Span::new(day + req.start, day + req.start + req.duration);
        if span.start < now || span.start > now + settings.advance_days * MINUTES_PER_DAY {
            return Err(EngineError::OutsideAdvanceWindow);
        }

        if channel == Channel::Public {
            check_within_published(&guard, req.date, &span)?;
        }
        check_no_conflict(&guard, &span, settings.buffer_min)?;

        let booking = Booking {
            id: req.id,
            date: req.date,
            start: req.start,
            duration: req.duration,
            status: match channel {
                Channel::Staff => BookingStatus::Confirmed,
                Channel::Public => BookingStatus::Pending,
            },
            client: req.client,
            property_address: req.property_address,
            notes: req.notes,
            public_token: match channel {
                Channel::Staff => None,
                Channel::Public => Some(Ulid::new().to_string()),
            },
            created_at: now,
            updated_at: now,
        };

        let event = Event::BookingCreated {
            inspector_id: req.inspector_id,
            booking: booking.clone(),
        };
        self.persist_and_apply(req.inspector_id, &mut guard, &event)
            .await?;
        Ok(booking)
    }

    /// Drive the booking state machine. Staff only; a public-token
    /// holder reads but never mutates. Compare-current-then-set under
    /// the inspector's write lock.
    pub async fn update_booking_status(
        &self,
        booking_id: Ulid,
        next: BookingStatus,
        channel: Channel,
    ) -> Result<Booking, EngineError> {
        if channel == Channel::Public {
            return Err(EngineError::Forbidden);
        }

        let (inspector_id, mut guard) = self.resolve_entity_write(&booking_id).await?;
        let current = guard
            .booking(booking_id)
            .ok_or(EngineError::NotFound(Some(booking_id)))?
            .status;
        if !current.can_become(next) {
            return Err(EngineError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        let event = Event::BookingStatusChanged {
            id: booking_id,
            inspector_id,
            status: next,
            updated_at: now_min(),
        };
        self.persist_and_apply(inspector_id, &mut guard, &event).await?;

        guard
            .booking(booking_id)
            .cloned()
            .ok_or(EngineError::NotFound(Some(booking_id)))
    }

    /// Invalidate a booking's public token. Subsequent token lookups
    /// fail with NotFound; the booking itself is untouched.
    pub async fn revoke_public_token(
        &self,
        booking_id: Ulid,
        channel: Channel,
    ) -> Result<(), EngineError> {
        if channel == Channel::Public {
            return Err(EngineError::Forbidden);
        }

        let (inspector_id, mut guard) = self.resolve_entity_write(&booking_id).await?;
        if guard.booking(booking_id).is_none() {
            return Err(EngineError::NotFound(Some(booking_id)));
        }

        let event = Event::TokenRevoked {
            id: booking_id,
            inspector_id,
        };
        self.persist_and_apply(inspector_id, &mut guard, &event).await
    }
}
