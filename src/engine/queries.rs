use chrono::NaiveDate;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::conflict::{now_min, validate_date};
use super::slots::compute_slots;
use super::{Engine, EngineError};

impl Engine {
    /// Candidate open slots for a date range. Pure function of current
    /// state; callers re-query before every commit attempt.
    pub async fn available_slots(
        &self,
        inspector_id: Ulid,
        range_start: NaiveDate,
        range_end: NaiveDate,
        duration: Min,
    ) -> Result<Vec<Slot>, EngineError> {
        validate_date(range_start)?;
        validate_date(range_end)?;
        if duration <= 0 || duration > MAX_BOOKING_DURATION_MIN {
            return Err(EngineError::Validation("slot duration out of range"));
        }
        if range_end.signed_duration_since(range_start).num_days() > MAX_QUERY_RANGE_DAYS {
            return Err(EngineError::LimitExceeded("slot query range too wide"));
        }

        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(Some(inspector_id)))?;
        let guard = state.read().await;
        Ok(compute_slots(
            &guard,
            range_start,
            range_end,
            duration,
            now_min(),
        ))
    }

    pub async fn get_windows(&self, inspector_id: Ulid) -> Result<Vec<WeeklyWindow>, EngineError> {
        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(Some(inspector_id)))?;
        let guard = state.read().await;
        Ok(guard.windows.clone())
    }

    pub async fn get_blackouts(&self, inspector_id: Ulid) -> Result<Vec<Blackout>, EngineError> {
        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(Some(inspector_id)))?;
        let guard = state.read().await;
        Ok(guard.blackouts.clone())
    }

    /// Effective settings: stored row, or the defaults if none exists
    /// yet. The default is never persisted by a read.
    pub async fn get_settings(&self, inspector_id: Ulid) -> Result<Settings, EngineError> {
        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(Some(inspector_id)))?;
        let guard = state.read().await;
        Ok(guard.effective_settings())
    }

    /// Staff listing, optionally restricted to a date range (inclusive).
    pub async fn get_bookings(
        &self,
        inspector_id: Ulid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Booking>, EngineError> {
        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(Some(inspector_id)))?;
        let guard = state.read().await;
        Ok(guard
            .bookings
            .iter()
            .filter(|b| from.is_none_or(|d| b.date >= d) && to.is_none_or(|d| b.date <= d))
            .cloned()
            .collect())
    }

    /// Anonymous status lookup by public token: a capability string
    /// mapped one-to-one to a booking, read-only. Revoked or unknown
    /// tokens are indistinguishable.
    pub async fn booking_by_token(&self, token: &str) -> Result<PublicBookingView, EngineError> {
        let booking_id = self
            .store
            .booking_for_token(token)
            .ok_or(EngineError::NotFound(None))?;
        let inspector_id = self
            .store
            .owner_of(&booking_id)
            .ok_or(EngineError::NotFound(None))?;
        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(None))?;
        let guard = state.read().await;
        let booking = guard
            .booking(booking_id)
            .ok_or(EngineError::NotFound(None))?;
        Ok(PublicBookingView {
            id: booking.id,
            date: booking.date,
            start: booking.start,
            duration: booking.duration,
            status: booking.status,
        })
    }

    /// Read-only availability + settings summary for the embed widget.
    /// No client PII crosses this boundary; gated on enablement.
    pub async fn widget_summary(&self, inspector_id: Ulid) -> Result<WidgetSummary, EngineError> {
        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(Some(inspector_id)))?;
        let guard = state.read().await;
        let settings = guard.effective_settings();
        if !settings.widget_enabled {
            return Err(EngineError::WidgetDisabled);
        }
        let mut windows: Vec<WeeklyWindow> =
            guard.windows.iter().filter(|w| w.active).cloned().collect();
        windows.sort_by_key(|w| (w.weekday, w.start));
        Ok(WidgetSummary {
            inspector_id,
            windows,
            buffer_min: settings.buffer_min,
            advance_days: settings.advance_days,
            max_daily_bookings: settings.max_daily_bookings,
        })
    }

    pub fn list_inspectors(&self) -> Vec<InspectorInfo> {
        self.store
            .iter_inspectors()
            .map(|state| {
                let guard = state.try_read().expect("list_inspectors: uncontended read");
                InspectorInfo {
                    id: guard.id,
                    name: guard.name.clone(),
                }
            })
            .collect()
    }
}
