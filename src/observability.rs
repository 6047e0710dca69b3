use std::net::SocketAddr;

use crate::sql::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total statements executed. Labels: command, status.
pub const QUERIES_TOTAL: &str = "inspectd_queries_total";

/// Histogram: statement latency in seconds. Labels: command.
pub const QUERY_DURATION_SECONDS: &str = "inspectd_query_duration_seconds";

/// Counter: bookings committed.
pub const BOOKINGS_CREATED_TOTAL: &str = "inspectd_bookings_created_total";

/// Counter: booking commits rejected by the conflict check.
pub const BOOKING_CONFLICTS_TOTAL: &str = "inspectd_booking_conflicts_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "inspectd_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "inspectd_connections_total";

/// Counter: connections rejected due to the limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "inspectd_connections_rejected_total";

/// Gauge: number of active tenants (loaded engines).
pub const TENANTS_ACTIVE: &str = "inspectd_tenants_active";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "inspectd_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "inspectd_wal_flush_batch_size";

/// Install the Prometheus metrics exporter on the given port. No-op if
/// the port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::InsertInspector { .. } => "insert_inspector",
        Command::DeleteInspector { .. } => "delete_inspector",
        Command::SelectInspectors => "select_inspectors",
        Command::ReplaceAvailability { .. } => "replace_availability",
        Command::ClearAvailability { .. } => "clear_availability",
        Command::SelectAvailability { .. } => "select_availability",
        Command::UpsertBlackout { .. } => "upsert_blackout",
        Command::DeleteBlackout { .. } => "delete_blackout",
        Command::SelectBlackouts { .. } => "select_blackouts",
        Command::UpdateSettings { .. } => "update_settings",
        Command::SelectSettings { .. } => "select_settings",
        Command::InsertBooking { .. } => "insert_booking",
        Command::UpdateBookingStatus { .. } => "update_booking_status",
        Command::RevokeToken { .. } => "revoke_token",
        Command::SelectBookings { .. } => "select_bookings",
        Command::SelectBookingByToken { .. } => "select_booking_by_token",
        Command::SelectSlots { .. } => "select_slots",
        Command::SelectWidget { .. } => "select_widget",
        Command::Listen { .. } => "listen",
    }
}
