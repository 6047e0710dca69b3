use chrono::{Days, NaiveDate};

use crate::model::*;

// ── Slot Computation ──────────────────────────────────────────────
//
// Recurring weekly windows are expanded into concrete date instances on
// demand, as a pure function of (windows, blackouts, bookings, settings,
// range, now). Nothing here is cached or materialized, so configuration
// changes are visible on the next call.

/// Candidate open slots for one inspector over a date range, ordered by
/// (date, start). Restartable: same state + same `now` → same result.
pub fn compute_slots(
    ins: &InspectorState,
    range_start: NaiveDate,
    range_end: NaiveDate,
    duration: Min,
    now: Min,
) -> Vec<Slot> {
    let settings = ins.effective_settings();

    // Clamp to [max(range_start, today), min(range_end, today + advance)].
    // The horizon anchors at *now*: nothing is ever offered that a
    // commit inside the advance window could not accept.
    let today = date_of(now);
    let first = range_start.max(today);
    let last = today
        .checked_add_days(Days::new(settings.advance_days as u64))
        .map_or(range_end, |horizon| range_end.min(horizon));

    let mut slots = Vec::new();
    let mut date = first;
    while date <= last {
        day_slots(ins, &settings, date, duration, now, &mut slots);
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    slots
}

/// One date's contribution: windows minus blackouts minus buffered
/// bookings, sliced into fixed-duration slots, capped earliest-first.
fn day_slots(
    ins: &InspectorState,
    settings: &Settings,
    date: NaiveDate,
    duration: Min,
    now: Min,
    out: &mut Vec<Slot>,
) {
    if ins.blacked_out(date) {
        return;
    }

    let mut open: Vec<Span> = ins
        .active_windows_on(weekday_of(date))
        .map(|w| w.on(date))
        .collect();
    if open.is_empty() {
        return;
    }
    open.sort_by_key(|s| s.start);
    let mut free = merge_overlapping(&open);

    let day = day_start(date);
    let day_span = Span::new(day, day + MINUTES_PER_DAY);
    let occupied = occupied_spans(ins, &day_span, settings.buffer_min);
    if !occupied.is_empty() {
        free = subtract_intervals(&free, &occupied);
    }

    // Never offer a slot starting at or before the current minute.
    if now >= day {
        free = clip_before(&free, now + 1);
    }

    free.retain(|s| s.duration_min() >= duration);

    let packed = pack_slots(&free, duration);
    out.extend(
        packed
            .into_iter()
            .take(settings.max_daily_bookings as usize)
            .map(|span| Slot {
                date,
                start: span.start - day,
                end: span.end - day,
            }),
    );
}

/// Occupied spans intruding into `day`: every non-cancelled booking,
/// widened by the buffer on both ends. A booking ending late the
/// previous day can shadow the morning through its trailing buffer, so
/// the search window is padded too.
fn occupied_spans(ins: &InspectorState, day: &Span, buffer: Min) -> Vec<Span> {
    let search = day.padded(buffer);
    ins.bookings_overlapping(&search)
        .filter(|b| b.status.occupies())
        .map(|b| b.span().padded(buffer))
        .collect()
}

/// Merge sorted overlapping/adjacent spans into disjoint spans.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

/// `base` minus `to_remove`; both inputs sorted by start, `base` disjoint.
pub fn subtract_intervals(base: &[Span], to_remove: &[Span]) -> Vec<Span> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut cursor = b.start;

        while ri < to_remove.len() && to_remove[ri].end <= cursor {
            ri += 1;
        }

        let mut j = ri;
        while j < to_remove.len() && to_remove[j].start < b.end {
            let r = &to_remove[j];
            if r.start > cursor {
                result.push(Span::new(cursor, r.start));
            }
            cursor = cursor.max(r.end);
            j += 1;
        }

        if cursor < b.end {
            result.push(Span::new(cursor, b.end));
        }
    }

    result
}

/// Drop everything before `t`, trimming a span that straddles it.
pub fn clip_before(spans: &[Span], t: Min) -> Vec<Span> {
    spans
        .iter()
        .filter(|s| s.end > t)
        .map(|s| Span::new(s.start.max(t), s.end))
        .collect()
}

/// Slice free spans into consecutive fixed-duration slots, packed from
/// the start of each span; a remainder shorter than `duration` is
/// discarded.
pub fn pack_slots(free: &[Span], duration: Min) -> Vec<Span> {
    debug_assert!(duration > 0);
    let mut out = Vec::new();
    for f in free {
        let mut cursor = f.start;
        while cursor + duration <= f.end {
            out.push(Span::new(cursor, cursor + duration));
            cursor += duration;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    const H: Min = 60;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(weekday: u8, start: Min, end: Min) -> WeeklyWindow {
        WeeklyWindow {
            id: Ulid::new(),
            weekday,
            start,
            end,
            active: true,
        }
    }

    fn booking(d: NaiveDate, start: Min, duration: Min, status: BookingStatus) -> Booking {
        Booking {
            id: Ulid::new(),
            date: d,
            start,
            duration,
            status,
            client: ClientContact {
                name: "Jo Leduc".into(),
                email: "jo@example.com".into(),
                phone: None,
            },
            property_address: "9 Pine Rd".into(),
            notes: None,
            public_token: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn inspector(windows: Vec<WeeklyWindow>, settings: Settings) -> InspectorState {
        let mut ins = InspectorState::new(Ulid::new(), None);
        ins.windows = windows;
        ins.settings = Some(settings);
        ins
    }

    // ── subtract_intervals ────────────────────────────────

    #[test]
    fn subtract_no_overlap() {
        let base = vec![Span::new(100, 200), Span::new(300, 400)];
        let remove = vec![Span::new(200, 300)];
        assert_eq!(subtract_intervals(&base, &remove), base);
    }

    #[test]
    fn subtract_full_cover() {
        let base = vec![Span::new(100, 200)];
        let remove = vec![Span::new(50, 250)];
        assert!(subtract_intervals(&base, &remove).is_empty());
    }

    #[test]
    fn subtract_trims_edges() {
        let base = vec![Span::new(100, 200)];
        assert_eq!(
            subtract_intervals(&base, &[Span::new(50, 150)]),
            vec![Span::new(150, 200)]
        );
        assert_eq!(
            subtract_intervals(&base, &[Span::new(150, 250)]),
            vec![Span::new(100, 150)]
        );
    }

    #[test]
    fn subtract_punches_holes() {
        let base = vec![Span::new(0, 1000)];
        let remove = vec![Span::new(100, 200), Span::new(400, 500), Span::new(800, 900)];
        assert_eq!(
            subtract_intervals(&base, &remove),
            vec![
                Span::new(0, 100),
                Span::new(200, 400),
                Span::new(500, 800),
                Span::new(900, 1000),
            ]
        );
    }

    // ── merge / clip / pack ───────────────────────────────

    #[test]
    fn merge_overlapping_and_adjacent() {
        let spans = vec![Span::new(100, 300), Span::new(200, 400), Span::new(400, 500)];
        assert_eq!(merge_overlapping(&spans), vec![Span::new(100, 500)]);
    }

    #[test]
    fn clip_trims_straddling_span() {
        let spans = vec![Span::new(0, 100), Span::new(150, 300)];
        assert_eq!(
            clip_before(&spans, 200),
            vec![Span::new(200, 300)]
        );
    }

    #[test]
    fn pack_discards_short_remainder() {
        let free = vec![Span::new(0, 250)];
        assert_eq!(
            pack_slots(&free, 100),
            vec![Span::new(0, 100), Span::new(100, 200)]
        );
    }

    #[test]
    fn pack_exact_fit() {
        let free = vec![Span::new(0, 200)];
        assert_eq!(
            pack_slots(&free, 100),
            vec![Span::new(0, 100), Span::new(100, 200)]
        );
    }

    // ── compute_slots ─────────────────────────────────────

    #[test]
    fn no_window_weekdays_contribute_nothing() {
        // Monday-only availability, one full week queried.
        let ins = inspector(vec![window(1, 9 * H, 17 * H)], Settings::default());
        let now = day_start(date(2026, 8, 2));
        let slots = compute_slots(&ins, date(2026, 8, 2), date(2026, 8, 8), 60, now);
        assert!(!slots.is_empty());
        assert!(slots.iter().all(|s| s.date == date(2026, 8, 3)));
    }

    #[test]
    fn scenario_one_existing_booking_with_buffer() {
        // Monday 09:00–17:00, buffer 30, cap 2, duration 180, one
        // confirmed booking 09:00–12:00: exactly one further slot fits,
        // 12:30–15:30.
        let monday = date(2026, 8, 3);
        let mut ins = inspector(
            vec![window(1, 9 * H, 17 * H)],
            Settings {
                max_daily_bookings: 2,
                buffer_min: 30,
                ..Settings::default()
            },
        );
        ins.insert_booking(booking(monday, 9 * H, 180, BookingStatus::Confirmed));

        let slots = compute_slots(&ins, monday, monday, 180, day_start(monday));
        assert_eq!(
            slots,
            vec![Slot {
                date: monday,
                start: 12 * H + 30,
                end: 15 * H + 30,
            }]
        );
    }

    #[test]
    fn blackout_silences_the_whole_date() {
        let monday = date(2026, 8, 3);
        let mut ins = inspector(vec![window(1, 9 * H, 17 * H)], Settings::default());
        ins.blackouts.push(Blackout {
            id: Ulid::new(),
            start_date: monday,
            end_date: monday,
            reason: None,
            recurring: false,
        });
        assert!(compute_slots(&ins, monday, monday, 60, day_start(monday)).is_empty());
    }

    #[test]
    fn cancelled_bookings_release_their_time() {
        let monday = date(2026, 8, 3);
        let mut ins = inspector(
            vec![window(1, 9 * H, 11 * H)],
            Settings {
                max_daily_bookings: 4,
                ..Settings::default()
            },
        );
        ins.insert_booking(booking(monday, 9 * H, 120, BookingStatus::Cancelled));

        let slots = compute_slots(&ins, monday, monday, 120, day_start(monday));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start, 9 * H);
    }

    #[test]
    fn daily_cap_keeps_earliest_slots() {
        let monday = date(2026, 8, 3);
        let ins = inspector(
            vec![window(1, 8 * H, 18 * H)],
            Settings {
                max_daily_bookings: 3,
                ..Settings::default()
            },
        );
        let slots = compute_slots(&ins, monday, monday, 60, day_start(monday));
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].start, 8 * H);
        assert_eq!(slots[1].start, 9 * H);
        assert_eq!(slots[2].start, 10 * H);
    }

    #[test]
    fn advance_horizon_clamps_range_end() {
        // Window every day of the week; horizon 2 days from range start.
        let windows = (0u8..7).map(|wd| window(wd, 9 * H, 10 * H)).collect();
        let ins = inspector(
            windows,
            Settings {
                advance_days: 2,
                ..Settings::default()
            },
        );
        let now = day_start(date(2026, 8, 3));
        let slots = compute_slots(&ins, date(2026, 8, 3), date(2026, 8, 31), 60, now);
        let dates: Vec<NaiveDate> = slots.iter().map(|s| s.date).collect();
        assert_eq!(
            dates,
            vec![date(2026, 8, 3), date(2026, 8, 4), date(2026, 8, 5)]
        );
    }

    #[test]
    fn past_portion_of_today_is_excluded() {
        let monday = date(2026, 8, 3);
        let ins = inspector(
            vec![window(1, 9 * H, 17 * H)],
            Settings {
                max_daily_bookings: 20,
                ..Settings::default()
            },
        );
        // It is 11:15 on that Monday.
        let now = day_start(monday) + 11 * H + 15;
        let slots = compute_slots(&ins, monday, monday, 60, now);
        assert!(!slots.is_empty());
        assert!(slots.iter().all(|s| day_start(monday) + s.start > now));
    }

    #[test]
    fn trailing_buffer_from_previous_day_shadows_morning() {
        let monday = date(2026, 8, 3);
        let sunday = date(2026, 8, 2);
        let mut ins = inspector(
            vec![window(1, 0, 2 * H)],
            Settings {
                buffer_min: 60,
                ..Settings::default()
            },
        );
        // Booking ends at Sunday midnight; its buffer spills into Monday.
        ins.insert_booking(booking(sunday, 23 * H, 60, BookingStatus::Confirmed));

        let slots = compute_slots(&ins, monday, monday, 60, day_start(monday));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start, H);
    }

    #[test]
    fn two_windows_sliced_independently() {
        let monday = date(2026, 8, 3);
        let ins = inspector(
            vec![window(1, 9 * H, 10 * H + 30), window(1, 13 * H, 14 * H)],
            Settings {
                max_daily_bookings: 10,
                ..Settings::default()
            },
        );
        let slots = compute_slots(&ins, monday, monday, 60, day_start(monday));
        let starts: Vec<Min> = slots.iter().map(|s| s.start).collect();
        // 10:00–10:30 and the 14:00 remainder are too short.
        assert_eq!(starts, vec![9 * H, 13 * H]);
    }

    #[test]
    fn inactive_windows_are_ignored() {
        let monday = date(2026, 8, 3);
        let mut w = window(1, 9 * H, 17 * H);
        w.active = false;
        let ins = inspector(vec![w], Settings::default());
        assert!(compute_slots(&ins, monday, monday, 60, day_start(monday)).is_empty());
    }

    #[test]
    fn recompute_is_idempotent() {
        let monday = date(2026, 8, 3);
        let mut ins = inspector(
            vec![window(1, 9 * H, 17 * H)],
            Settings {
                buffer_min: 15,
                ..Settings::default()
            },
        );
        ins.insert_booking(booking(monday, 10 * H, 90, BookingStatus::Confirmed));

        let now = day_start(monday);
        let a = compute_slots(&ins, monday, monday, 60, now);
        let b = compute_slots(&ins, monday, monday, 60, now);
        assert_eq!(a, b);
    }
}
