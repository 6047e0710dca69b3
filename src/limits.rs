//! Hard caps on input sizes and entity counts. Everything here exists to
//! keep a single misbehaving client from inflating one tenant's state.

pub const MAX_TENANTS: usize = 64;
pub const MAX_TENANT_NAME_LEN: usize = 64;

pub const MAX_INSPECTORS_PER_TENANT: usize = 10_000;
pub const MAX_WINDOWS_PER_INSPECTOR: usize = 64;
pub const MAX_BLACKOUTS_PER_INSPECTOR: usize = 512;
pub const MAX_BOOKINGS_PER_INSPECTOR: usize = 100_000;

pub const MAX_NAME_LEN: usize = 128;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PHONE_LEN: usize = 32;
pub const MAX_ADDRESS_LEN: usize = 512;
pub const MAX_NOTES_LEN: usize = 2_000;
pub const MAX_REASON_LEN: usize = 256;

/// Widest slot query accepted, in days.
pub const MAX_QUERY_RANGE_DAYS: i64 = 370;

pub const MAX_BOOKING_DURATION_MIN: i64 = 24 * 60;
pub const MAX_BUFFER_MIN: i64 = 12 * 60;
pub const MAX_ADVANCE_DAYS: i64 = 365;
pub const MAX_DAILY_BOOKINGS_CAP: u32 = 96;

/// Calendar dates outside this year range are rejected as malformed.
pub const MIN_VALID_YEAR: i32 = 2000;
pub const MAX_VALID_YEAR: i32 = 2100;
