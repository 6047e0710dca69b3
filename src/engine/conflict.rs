use chrono::{Datelike, NaiveDate};

use crate::limits::*;
use crate::model::*;

use super::EngineError;
use super::slots::merge_overlapping;

pub(crate) fn now_min() -> Min {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as Min
        / 60
}

pub(crate) fn validate_date(date: NaiveDate) -> Result<(), EngineError> {
    if date.year() < MIN_VALID_YEAR || date.year() > MAX_VALID_YEAR {
        return Err(EngineError::Validation("date out of supported range"));
    }
    Ok(())
}

pub(crate) fn validate_window(w: &WeeklyWindow) -> Result<(), EngineError> {
    if w.weekday > 6 {
        return Err(EngineError::Validation("weekday must be 0-6"));
    }
    if w.start < 0 || w.start >= w.end || w.end > MINUTES_PER_DAY {
        return Err(EngineError::Validation(
            "window must satisfy 0 <= start < end <= 1440",
        ));
    }
    Ok(())
}

/// Full-set validation for `replace_availability`: every window well
/// formed, and no two active windows of the same weekday overlapping.
pub(crate) fn validate_window_set(windows: &[WeeklyWindow]) -> Result<(), EngineError> {
    for w in windows {
        validate_window(w)?;
    }
    for (i, a) in windows.iter().enumerate() {
        if !a.active {
            continue;
        }
        for b in &windows[i + 1..] {
            if b.active && a.weekday == b.weekday && a.clock_span().overlaps(&b.clock_span()) {
                return Err(EngineError::Validation(
                    "active windows on the same weekday overlap",
                ));
            }
        }
    }
    Ok(())
}

pub(crate) fn validate_blackout(b: &Blackout) -> Result<(), EngineError> {
    validate_date(b.start_date)?;
    validate_date(b.end_date)?;
    if b.start_date > b.end_date {
        return Err(EngineError::Validation("blackout start after end"));
    }
    if let Some(reason) = &b.reason
        && reason.len() > MAX_REASON_LEN
    {
        return Err(EngineError::LimitExceeded("blackout reason too long"));
    }
    Ok(())
}

pub(crate) fn validate_settings(s: &Settings) -> Result<(), EngineError> {
    if s.max_daily_bookings == 0 || s.max_daily_bookings > MAX_DAILY_BOOKINGS_CAP {
        return Err(EngineError::Validation("max_daily_bookings out of range"));
    }
    if s.buffer_min < 0 || s.buffer_min > MAX_BUFFER_MIN {
        return Err(EngineError::Validation("buffer_minutes out of range"));
    }
    if s.advance_days < 0 || s.advance_days > MAX_ADVANCE_DAYS {
        return Err(EngineError::Validation("advance_days out of range"));
    }
    Ok(())
}

pub(crate) fn validate_booking_request(req: &BookingRequest) -> Result<(), EngineError> {
    validate_date(req.date)?;
    if req.start < 0 || req.start >= MINUTES_PER_DAY {
        return Err(EngineError::Validation("booking start outside the day"));
    }
    if req.duration <= 0 || req.duration > MAX_BOOKING_DURATION_MIN {
        return Err(EngineError::Validation("booking duration out of range"));
    }
    if req.start + req.duration > MINUTES_PER_DAY {
        return Err(EngineError::Validation("booking must end within its day"));
    }
    if req.client.name.is_empty() || req.client.name.len() > MAX_NAME_LEN {
        return Err(EngineError::Validation("client name missing or too long"));
    }
    if !req.client.email.contains('@') || req.client.email.len() > MAX_EMAIL_LEN {
        return Err(EngineError::Validation("client email malformed"));
    }
    if let Some(phone) = &req.client.phone
        && phone.len() > MAX_PHONE_LEN
    {
        return Err(EngineError::Validation("client phone too long"));
    }
    if req.property_address.is_empty() || req.property_address.len() > MAX_ADDRESS_LEN {
        return Err(EngineError::Validation(
            "property address missing or too long",
        ));
    }
    if let Some(notes) = &req.notes
        && notes.len() > MAX_NOTES_LEN
    {
        return Err(EngineError::LimitExceeded("booking notes too long"));
    }
    Ok(())
}

/// Commit-time double-booking guard: every non-cancelled booking,
/// widened by the buffer on both ends, must stay clear of the requested
/// span. Runs against the live booking set under the inspector's write
/// lock — never against the slot list the caller saw.
pub(crate) fn check_no_conflict(
    ins: &InspectorState,
    span: &Span,
    buffer: Min,
) -> Result<(), EngineError> {
    let search = span.padded(buffer);
    for existing in ins.bookings_overlapping(&search) {
        if !existing.status.occupies() {
            continue;
        }
        if existing.span().padded(buffer).overlaps(span) {
            return Err(EngineError::SlotUnavailable(Some(existing.id)));
        }
    }
    Ok(())
}

/// Public requests must land inside published availability: within the
/// weekday's active windows and not on a blacked-out date. Staff
/// bookings skip this check.
pub(crate) fn check_within_published(
    ins: &InspectorState,
    date: NaiveDate,
    span: &Span,
) -> Result<(), EngineError> {
    if ins.blacked_out(date) {
        return Err(EngineError::SlotUnavailable(None));
    }
    let mut open: Vec<Span> = ins
        .active_windows_on(weekday_of(date))
        .map(|w| w.on(date))
        .collect();
    open.sort_by_key(|s| s.start);
    if merge_overlapping(&open).iter().any(|w| w.contains(span)) {
        Ok(())
    } else {
        Err(EngineError::SlotUnavailable(None))
    }
}
