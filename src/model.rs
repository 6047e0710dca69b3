use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Minutes since the Unix epoch, already normalized to the inspector's
/// local zone — the only scalar time type.
pub type Min = i64;

pub const MINUTES_PER_DAY: Min = 24 * 60;

/// Half-open interval `[start, end)` in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Min,
    pub end: Min,
}

impl Span {
    pub fn new(start: Min, end: Min) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_min(&self) -> Min {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The same interval widened by `by` minutes on both ends.
    pub fn padded(&self, by: Min) -> Span {
        Span::new(self.start - by, self.end + by)
    }
}

/// Midnight of `date`, in epoch minutes.
pub fn day_start(date: NaiveDate) -> Min {
    date.and_time(NaiveTime::MIN).and_utc().timestamp() / 60
}

/// The calendar date containing the given minute.
pub fn date_of(min: Min) -> NaiveDate {
    chrono::DateTime::from_timestamp(min * 60, 0)
        .expect("minute within chrono range")
        .date_naive()
}

/// Weekday index, 0 = Sunday .. 6 = Saturday.
pub fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// A recurring weekly availability window. Times are minutes from
/// midnight; the whole set for one inspector is replaced wholesale,
/// never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyWindow {
    pub id: Ulid,
    /// 0 = Sunday .. 6 = Saturday.
    pub weekday: u8,
    pub start: Min,
    pub end: Min,
    pub active: bool,
}

impl WeeklyWindow {
    pub fn clock_span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Absolute span of this window on a concrete date.
    pub fn on(&self, date: NaiveDate) -> Span {
        let day = day_start(date);
        Span::new(day + self.start, day + self.end)
    }
}

/// A date-range exclusion. Date-level granularity only — there is no
/// partial-day blackout. `recurring` repeats the month/day range every
/// year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blackout {
    pub id: Ulid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub recurring: bool,
}

impl Blackout {
    pub fn covers(&self, date: NaiveDate) -> bool {
        if !self.recurring {
            return self.start_date <= date && date <= self.end_date;
        }
        // Annual recurrence: re-anchor the month/day range onto the
        // candidate year, and the previous one for ranges that cross
        // New Year. A Feb-29 anchor simply does not fire in non-leap
        // years.
        let len = self
            .end_date
            .signed_duration_since(self.start_date)
            .num_days();
        for year in [date.year() - 1, date.year()] {
            let Some(start) =
                NaiveDate::from_ymd_opt(year, self.start_date.month(), self.start_date.day())
            else {
                continue;
            };
            let Some(end) = start.checked_add_days(Days::new(len as u64)) else {
                continue;
            };
            if start <= date && date <= end {
                return true;
            }
        }
        false
    }
}

/// Per-inspector scheduling knobs. One logical row per inspector,
/// created lazily: reads fall back to `Settings::default()` until the
/// first write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Cap on slots offered per date.
    pub max_daily_bookings: u32,
    /// Minimum gap required around every booking, minutes.
    pub buffer_min: Min,
    /// Farthest-future day for which slots may be offered.
    pub advance_days: i64,
    /// Whether the anonymous embed widget may create bookings.
    pub widget_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_daily_bookings: 8,
            buffer_min: 0,
            advance_days: 30,
            widget_enabled: false,
        }
    }
}

/// Partial settings update; unset fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub max_daily_bookings: Option<u32>,
    pub buffer_min: Option<Min>,
    pub advance_days: Option<i64>,
    pub widget_enabled: Option<bool>,
}

impl Settings {
    pub fn apply(mut self, patch: &SettingsPatch) -> Settings {
        if let Some(v) = patch.max_daily_bookings {
            self.max_daily_bookings = v;
        }
        if let Some(v) = patch.buffer_min {
            self.buffer_min = v;
        }
        if let Some(v) = patch.advance_days {
            self.advance_days = v;
        }
        if let Some(v) = patch.widget_enabled {
            self.widget_enabled = v;
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// The transition table. Anything not listed here is illegal.
    pub fn allowed_next(self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Cancelled, Completed],
            Cancelled | Completed => &[],
        }
    }

    pub fn can_become(self, next: BookingStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Cancelled bookings release their time; everything else occupies it.
    pub fn occupies(self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<BookingStatus> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }
}

/// Who is asking: authenticated staff, or the anonymous embed widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Staff,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A committed appointment. Never hard-deleted — cancellation is a
/// status, not a removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub date: NaiveDate,
    /// Minutes from midnight.
    pub start: Min,
    pub duration: Min,
    pub status: BookingStatus,
    pub client: ClientContact,
    pub property_address: String,
    pub notes: Option<String>,
    /// Read-only lookup capability, set only for widget-created
    /// bookings. Revocable.
    pub public_token: Option<String>,
    pub created_at: Min,
    pub updated_at: Min,
}

impl Booking {
    /// Absolute span of this booking, in epoch minutes.
    pub fn span(&self) -> Span {
        let day = day_start(self.date);
        Span::new(day + self.start, day + self.start + self.duration)
    }
}

/// Everything needed to attempt a booking commit.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub id: Ulid,
    pub inspector_id: Ulid,
    pub date: NaiveDate,
    pub start: Min,
    pub duration: Min,
    pub client: ClientContact,
    pub property_address: String,
    pub notes: Option<String>,
}

/// One inspector's full scheduling state.
#[derive(Debug, Clone)]
pub struct InspectorState {
    pub id: Ulid,
    pub name: Option<String>,
    /// None until the first settings write; reads use the defaults.
    pub settings: Option<Settings>,
    pub windows: Vec<WeeklyWindow>,
    pub blackouts: Vec<Blackout>,
    /// Every booking ever taken, sorted by absolute start minute.
    pub bookings: Vec<Booking>,
}

impl InspectorState {
    pub fn new(id: Ulid, name: Option<String>) -> Self {
        Self {
            id,
            name,
            settings: None,
            windows: Vec::new(),
            blackouts: Vec::new(),
            bookings: Vec::new(),
        }
    }

    /// Stored settings, or the defaults if none were ever written.
    pub fn effective_settings(&self) -> Settings {
        self.settings.unwrap_or_default()
    }

    /// Insert maintaining sort order by absolute start minute.
    pub fn insert_booking(&mut self, booking: Booking) {
        let key = booking.span().start;
        let pos = self
            .bookings
            .binary_search_by_key(&key, |b| b.span().start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn booking_mut(&mut self, id: Ulid) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    /// Bookings whose span overlaps the query window, in start order.
    /// Binary search skips everything starting at or after `query.end`.
    pub fn bookings_overlapping(&self, query: &Span) -> impl Iterator<Item = &Booking> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.span().start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span().end > query.start)
    }

    pub fn active_windows_on(&self, weekday: u8) -> impl Iterator<Item = &WeeklyWindow> {
        self.windows
            .iter()
            .filter(move |w| w.active && w.weekday == weekday)
    }

    pub fn blacked_out(&self, date: NaiveDate) -> bool {
        self.blackouts.iter().any(|b| b.covers(date))
    }
}

/// The event types — flat, no nesting. This is the WAL record format.
/// `BookingCreated` carries the full booking so replay and compaction
/// restore status and token without extra lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    InspectorCreated {
        id: Ulid,
        name: Option<String>,
    },
    InspectorDeleted {
        id: Ulid,
    },
    AvailabilityReplaced {
        inspector_id: Ulid,
        windows: Vec<WeeklyWindow>,
    },
    BlackoutUpserted {
        inspector_id: Ulid,
        blackout: Blackout,
    },
    BlackoutRemoved {
        id: Ulid,
        inspector_id: Ulid,
    },
    SettingsUpdated {
        inspector_id: Ulid,
        settings: Settings,
    },
    BookingCreated {
        inspector_id: Ulid,
        booking: Booking,
    },
    BookingStatusChanged {
        id: Ulid,
        inspector_id: Ulid,
        status: BookingStatus,
        updated_at: Min,
    },
    TokenRevoked {
        id: Ulid,
        inspector_id: Ulid,
    },
}

// ── Query result types ───────────────────────────────────────────

/// A candidate bookable interval of fixed duration. Times are minutes
/// from midnight on `date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub date: NaiveDate,
    pub start: Min,
    pub end: Min,
}

/// What a public-token holder may see: status, nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicBookingView {
    pub id: Ulid,
    pub date: NaiveDate,
    pub start: Min,
    pub duration: Min,
    pub status: BookingStatus,
}

/// Read-only availability + settings summary for the embed widget.
/// Carries no client PII.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetSummary {
    pub inspector_id: Ulid,
    pub windows: Vec<WeeklyWindow>,
    pub buffer_min: Min,
    pub advance_days: i64,
    pub max_daily_bookings: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorInfo {
    pub id: Ulid,
    pub name: Option<String>,
}
