use std::fmt::Debug;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Sink;
use futures::stream;
use pgwire::api::auth::cleartext::CleartextPasswordAuthStartupHandler;
use pgwire::api::auth::{DefaultServerParameterProvider, StartupHandler};
use pgwire::api::copy::CopyHandler;
use pgwire::api::portal::{Format, Portal};
use pgwire::api::query::{ExtendedQueryHandler, SimpleQueryHandler};
use pgwire::api::results::{
    DataRowEncoder, DescribePortalResponse, DescribeStatementResponse, FieldFormat, FieldInfo,
    QueryResponse, Response, Tag,
};
use pgwire::api::stmt::{QueryParser, StoredStatement};
use pgwire::api::store::PortalStore;
use pgwire::api::{ClientInfo, ClientPortalStore, NoopHandler, PgWireServerHandlers, Type};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};
use pgwire::messages::PgWireBackendMessage;
use pgwire::tokio::TlsAcceptor;
use tokio::net::TcpStream;
use ulid::Ulid;

use crate::auth::InspectdAuthSource;
use crate::engine::{Engine, EngineError};
use crate::model::*;
use crate::observability;
use crate::sql::{self, Command};
use crate::tenant::TenantManager;

pub struct InspectdHandler {
    tenant_manager: Arc<TenantManager>,
    query_parser: Arc<InspectdQueryParser>,
}

impl InspectdHandler {
    pub fn new(tenant_manager: Arc<TenantManager>) -> Self {
        Self {
            tenant_manager,
            query_parser: Arc::new(InspectdQueryParser),
        }
    }

    /// Tenant = database name from the startup message.
    fn resolve_engine<C: ClientInfo>(&self, client: &C) -> PgWireResult<Arc<Engine>> {
        let db = client
            .metadata()
            .get("database")
            .cloned()
            .unwrap_or_else(|| "default".to_string());
        self.tenant_manager.get_or_create(&db).map_err(|e| {
            PgWireError::UserError(Box::new(ErrorInfo::new(
                "ERROR".into(),
                "08006".into(),
                format!("tenant error: {e}"),
            )))
        })
    }

    /// Caller role = startup user name. The external identity
    /// collaborator hands the anonymous widget its own credentials;
    /// everything else is staff.
    fn resolve_channel<C: ClientInfo>(client: &C) -> Channel {
        match client.metadata().get("user").map(String::as_str) {
            Some("widget") => Channel::Public,
            _ => Channel::Staff,
        }
    }

    async fn run_command(
        &self,
        engine: &Engine,
        cmd: Command,
        channel: Channel,
    ) -> PgWireResult<Vec<Response>> {
        let label = observability::command_label(&cmd);
        let started = std::time::Instant::now();
        let result = self.execute_command(engine, cmd, channel).await;
        metrics::histogram!(observability::QUERY_DURATION_SECONDS, "command" => label)
            .record(started.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(observability::QUERIES_TOTAL, "command" => label, "status" => status)
            .increment(1);
        result
    }

    async fn execute_command(
        &self,
        engine: &Engine,
        cmd: Command,
        channel: Channel,
    ) -> PgWireResult<Vec<Response>> {
        if channel == Channel::Public && !public_may_run(&cmd) {
            return Err(engine_err(EngineError::Forbidden));
        }

        match cmd {
            Command::InsertInspector { id, name } => {
                engine.create_inspector(id, name).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("INSERT").with_rows(1))])
            }
            Command::DeleteInspector { id } => {
                engine.delete_inspector(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("DELETE").with_rows(1))])
            }
            Command::SelectInspectors => {
                let schema = Arc::new(inspectors_schema());
                let rows: Vec<PgWireResult<_>> = engine
                    .list_inspectors()
                    .into_iter()
                    .map(|info| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&info.id.to_string())?;
                        encoder.encode_field(&info.name)?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::ReplaceAvailability {
                inspector_id,
                windows,
            } => {
                let count = windows.len();
                engine
                    .replace_availability(inspector_id, windows)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(
                    Tag::new("INSERT").with_rows(count),
                )])
            }
            Command::ClearAvailability { inspector_id } => {
                engine
                    .replace_availability(inspector_id, Vec::new())
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("DELETE"))])
            }
            Command::SelectAvailability { inspector_id } => {
                let windows = engine
                    .get_windows(inspector_id)
                    .await
                    .map_err(engine_err)?;
                let schema = Arc::new(availability_schema());
                let id_str = inspector_id.to_string();
                let rows: Vec<PgWireResult<_>> = windows
                    .into_iter()
                    .map(|w| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&w.id.to_string())?;
                        encoder.encode_field(&id_str)?;
                        encoder.encode_field(&(w.weekday as i64))?;
                        encoder.encode_field(&w.start)?;
                        encoder.encode_field(&w.end)?;
                        encoder.encode_field(&w.active)?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::UpsertBlackout {
                id,
                inspector_id,
                start_date,
                end_date,
                reason,
                recurring,
            } => {
                engine
                    .upsert_blackout(
                        inspector_id,
                        Blackout {
                            id,
                            start_date,
                            end_date,
                            reason,
                            recurring,
                        },
                    )
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("INSERT").with_rows(1))])
            }
            Command::DeleteBlackout { id } => {
                engine.remove_blackout(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("DELETE").with_rows(1))])
            }
            Command::SelectBlackouts { inspector_id } => {
                let blackouts = engine
                    .get_blackouts(inspector_id)
                    .await
                    .map_err(engine_err)?;
                let schema = Arc::new(blackouts_schema());
                let id_str = inspector_id.to_string();
                let rows: Vec<PgWireResult<_>> = blackouts
                    .into_iter()
                    .map(|b| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&b.id.to_string())?;
                        encoder.encode_field(&id_str)?;
                        encoder.encode_field(&b.start_date.to_string())?;
                        encoder.encode_field(&b.end_date.to_string())?;
                        encoder.encode_field(&b.reason)?;
                        encoder.encode_field(&b.recurring)?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::UpdateSettings {
                inspector_id,
                patch,
            } => {
                engine
                    .update_settings(inspector_id, patch)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::SelectSettings { inspector_id } => {
                let settings = engine
                    .get_settings(inspector_id)
                    .await
                    .map_err(engine_err)?;
                let schema = Arc::new(settings_schema());
                let row = encode_settings_row(&schema, inspector_id, &settings);
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(vec![row]),
                ))])
            }
            Command::InsertBooking {
                id,
                inspector_id,
                date,
                start,
                duration,
                client,
                address,
                notes,
            } => {
                let request = BookingRequest {
                    id,
                    inspector_id,
                    date,
                    start,
                    duration,
                    client,
                    property_address: address,
                    notes,
                };
                let result = engine.create_booking(request, channel).await;
                match &result {
                    Ok(_) => {
                        metrics::counter!(observability::BOOKINGS_CREATED_TOTAL).increment(1);
                    }
                    Err(EngineError::SlotUnavailable(_)) => {
                        metrics::counter!(observability::BOOKING_CONFLICTS_TOTAL).increment(1);
                    }
                    Err(_) => {}
                }
                let booking = result.map_err(engine_err)?;

                // INSERT .. RETURNING-style single row: the public
                // caller needs the minted token back.
                let schema = Arc::new(booking_created_schema());
                let mut encoder = DataRowEncoder::new(schema.clone());
                encoder.encode_field(&booking.id.to_string())?;
                encoder.encode_field(&booking.status.as_str())?;
                encoder.encode_field(&booking.public_token)?;
                let row = Ok(encoder.take_row());
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(vec![row]),
                ))])
            }
            Command::UpdateBookingStatus { id, status } => {
                engine
                    .update_booking_status(id, status, channel)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::RevokeToken { id } => {
                engine
                    .revoke_public_token(id, channel)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::SelectBookings {
                inspector_id,
                from,
                to,
            } => {
                let bookings = engine
                    .get_bookings(inspector_id, from, to)
                    .await
                    .map_err(engine_err)?;
                let schema = Arc::new(bookings_schema());
                let id_str = inspector_id.to_string();
                let rows: Vec<PgWireResult<_>> = bookings
                    .into_iter()
                    .map(|b| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&b.id.to_string())?;
                        encoder.encode_field(&id_str)?;
                        encoder.encode_field(&b.date.to_string())?;
                        encoder.encode_field(&b.start)?;
                        encoder.encode_field(&b.duration)?;
                        encoder.encode_field(&b.status.as_str())?;
                        encoder.encode_field(&b.client.name)?;
                        encoder.encode_field(&b.client.email)?;
                        encoder.encode_field(&b.client.phone)?;
                        encoder.encode_field(&b.property_address)?;
                        encoder.encode_field(&b.notes)?;
                        encoder.encode_field(&b.public_token)?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::SelectBookingByToken { token } => {
                let view = engine.booking_by_token(&token).await.map_err(engine_err)?;
                let schema = Arc::new(booking_status_schema());
                let mut encoder = DataRowEncoder::new(schema.clone());
                encoder.encode_field(&view.id.to_string())?;
                encoder.encode_field(&view.date.to_string())?;
                encoder.encode_field(&view.start)?;
                encoder.encode_field(&view.duration)?;
                encoder.encode_field(&view.status.as_str())?;
                let row = Ok(encoder.take_row());
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(vec![row]),
                ))])
            }
            Command::SelectSlots {
                inspector_id,
                from,
                to,
                duration,
            } => {
                let slots = engine
                    .available_slots(inspector_id, from, to, duration)
                    .await
                    .map_err(engine_err)?;
                let schema = Arc::new(slots_schema());
                let id_str = inspector_id.to_string();
                let rows: Vec<PgWireResult<_>> = slots
                    .into_iter()
                    .map(|slot| {
                        let mut encoder = DataRowEncoder::new(schema.clone());
                        encoder.encode_field(&id_str)?;
                        encoder.encode_field(&slot.date.to_string())?;
                        encoder.encode_field(&slot.start)?;
                        encoder.encode_field(&slot.end)?;
                        Ok(encoder.take_row())
                    })
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(rows),
                ))])
            }
            Command::SelectWidget { inspector_id } => {
                let summary = engine
                    .widget_summary(inspector_id)
                    .await
                    .map_err(engine_err)?;
                let windows_json = serde_json::to_string(
                    &summary
                        .windows
                        .iter()
                        .map(|w| {
                            serde_json::json!({
                                "weekday": w.weekday,
                                "start": w.start,
                                "end": w.end,
                            })
                        })
                        .collect::<Vec<_>>(),
                )
                .unwrap_or_else(|_| "[]".into());

                let schema = Arc::new(widget_schema());
                let mut encoder = DataRowEncoder::new(schema.clone());
                encoder.encode_field(&summary.inspector_id.to_string())?;
                encoder.encode_field(&windows_json)?;
                encoder.encode_field(&summary.buffer_min)?;
                encoder.encode_field(&summary.advance_days)?;
                encoder.encode_field(&(summary.max_daily_bookings as i64))?;
                let row = Ok(encoder.take_row());
                Ok(vec![Response::Query(QueryResponse::new(
                    schema,
                    stream::iter(vec![row]),
                ))])
            }
            Command::Listen { channel } => {
                let id_str = channel.strip_prefix("inspector_").ok_or_else(|| {
                    PgWireError::UserError(Box::new(ErrorInfo::new(
                        "ERROR".into(),
                        "42000".into(),
                        format!("invalid channel: {channel} (expected inspector_{{id}})"),
                    )))
                })?;
                let _inspector_id = Ulid::from_string(id_str).map_err(|e| {
                    PgWireError::UserError(Box::new(ErrorInfo::new(
                        "ERROR".into(),
                        "42000".into(),
                        format!("bad ULID in channel: {e}"),
                    )))
                })?;
                Ok(vec![Response::Execution(Tag::new("LISTEN"))])
            }
        }
    }
}

/// The anonymous widget sees slots, the PII-free summary, its own
/// booking status, and the one write path that only ever produces
/// pending bookings. Everything else is staff-only.
fn public_may_run(cmd: &Command) -> bool {
    matches!(
        cmd,
        Command::SelectSlots { .. }
            | Command::SelectWidget { .. }
            | Command::InsertBooking { .. }
            | Command::SelectBookingByToken { .. }
    )
}

// ── Row schemas ──────────────────────────────────────────────────

fn text_field(name: &str) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, Type::VARCHAR, FieldFormat::Text)
}

fn int8_field(name: &str) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, Type::INT8, FieldFormat::Text)
}

fn bool_field(name: &str) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, Type::BOOL, FieldFormat::Text)
}

fn inspectors_schema() -> Vec<FieldInfo> {
    vec![text_field("id"), text_field("name")]
}

fn availability_schema() -> Vec<FieldInfo> {
    vec![
        text_field("id"),
        text_field("inspector_id"),
        int8_field("weekday"),
        int8_field("start"),
        int8_field("end"),
        bool_field("active"),
    ]
}

fn blackouts_schema() -> Vec<FieldInfo> {
    vec![
        text_field("id"),
        text_field("inspector_id"),
        text_field("start_date"),
        text_field("end_date"),
        text_field("reason"),
        bool_field("recurring"),
    ]
}

fn settings_schema() -> Vec<FieldInfo> {
    vec![
        text_field("inspector_id"),
        int8_field("max_daily_bookings"),
        int8_field("buffer_minutes"),
        int8_field("advance_days"),
        bool_field("widget_enabled"),
    ]
}

fn bookings_schema() -> Vec<FieldInfo> {
    vec![
        text_field("id"),
        text_field("inspector_id"),
        text_field("date"),
        int8_field("start"),
        int8_field("duration"),
        text_field("status"),
        text_field("client_name"),
        text_field("client_email"),
        text_field("client_phone"),
        text_field("address"),
        text_field("notes"),
        text_field("token"),
    ]
}

fn booking_status_schema() -> Vec<FieldInfo> {
    vec![
        text_field("id"),
        text_field("date"),
        int8_field("start"),
        int8_field("duration"),
        text_field("status"),
    ]
}

fn booking_created_schema() -> Vec<FieldInfo> {
    vec![text_field("id"), text_field("status"), text_field("token")]
}

fn slots_schema() -> Vec<FieldInfo> {
    vec![
        text_field("inspector_id"),
        text_field("date"),
        int8_field("start"),
        int8_field("end"),
    ]
}

fn widget_schema() -> Vec<FieldInfo> {
    vec![
        text_field("inspector_id"),
        text_field("windows"),
        int8_field("buffer_minutes"),
        int8_field("advance_days"),
        int8_field("max_daily_bookings"),
    ]
}

fn encode_settings_row(
    schema: &Arc<Vec<FieldInfo>>,
    inspector_id: Ulid,
    settings: &Settings,
) -> PgWireResult<pgwire::messages::data::DataRow> {
    let mut encoder = DataRowEncoder::new(schema.clone());
    encoder.encode_field(&inspector_id.to_string())?;
    encoder.encode_field(&(settings.max_daily_bookings as i64))?;
    encoder.encode_field(&settings.buffer_min)?;
    encoder.encode_field(&settings.advance_days)?;
    encoder.encode_field(&settings.widget_enabled)?;
    Ok(encoder.take_row())
}

/// Result schema guess from raw SQL text, for Describe before Execute.
fn schema_for_sql(sql: &str) -> Vec<FieldInfo> {
    let upper = sql.to_uppercase();
    if upper.contains("INSERT") && upper.contains("BOOKINGS") {
        booking_created_schema()
    } else if !upper.contains("SELECT") {
        vec![]
    } else if upper.contains("SLOTS") {
        slots_schema()
    } else if upper.contains("WIDGET") {
        widget_schema()
    } else if upper.contains("SETTINGS") {
        settings_schema()
    } else if upper.contains("AVAILABILITY") {
        availability_schema()
    } else if upper.contains("BLACKOUTS") {
        blackouts_schema()
    } else if upper.contains("BOOKINGS") && upper.contains("TOKEN") {
        booking_status_schema()
    } else if upper.contains("BOOKINGS") {
        bookings_schema()
    } else if upper.contains("INSPECTORS") {
        inspectors_schema()
    } else {
        vec![]
    }
}

#[async_trait]
impl SimpleQueryHandler for InspectdHandler {
    async fn do_query<C>(&self, client: &mut C, query: &str) -> PgWireResult<Vec<Response>>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let engine = self.resolve_engine(client)?;
        let channel = Self::resolve_channel(client);
        let cmd = sql::parse_sql(query).map_err(sql_err)?;
        self.run_command(&engine, cmd, channel).await
    }
}

// ── Extended Query Protocol ──────────────────────────────────────

#[derive(Debug)]
pub struct InspectdQueryParser;

#[async_trait]
impl QueryParser for InspectdQueryParser {
    type Statement = String;

    async fn parse_sql<C>(
        &self,
        _client: &C,
        sql: &str,
        _types: &[Option<Type>],
    ) -> PgWireResult<String>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        Ok(sql.to_string())
    }

    fn get_parameter_types(&self, stmt: &String) -> PgWireResult<Vec<Type>> {
        Ok(vec![Type::VARCHAR; count_params(stmt)])
    }

    fn get_result_schema(
        &self,
        stmt: &String,
        _column_format: Option<&Format>,
    ) -> PgWireResult<Vec<FieldInfo>> {
        Ok(schema_for_sql(stmt))
    }
}

#[async_trait]
impl ExtendedQueryHandler for InspectdHandler {
    type Statement = String;
    type QueryParser = InspectdQueryParser;

    fn query_parser(&self) -> Arc<Self::QueryParser> {
        self.query_parser.clone()
    }

    async fn do_query<C>(
        &self,
        client: &mut C,
        portal: &Portal<Self::Statement>,
        _max_rows: usize,
    ) -> PgWireResult<Response>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let engine = self.resolve_engine(client)?;
        let channel = Self::resolve_channel(client);
        let sql = substitute_params(portal);
        let cmd = sql::parse_sql(&sql).map_err(sql_err)?;
        let mut responses = self.run_command(&engine, cmd, channel).await?;
        Ok(responses.remove(0))
    }

    async fn do_describe_statement<C>(
        &self,
        _client: &mut C,
        target: &StoredStatement<Self::Statement>,
    ) -> PgWireResult<DescribeStatementResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let param_types = vec![Type::VARCHAR; count_params(&target.statement)];
        Ok(DescribeStatementResponse::new(
            param_types,
            schema_for_sql(&target.statement),
        ))
    }

    async fn do_describe_portal<C>(
        &self,
        _client: &mut C,
        target: &Portal<Self::Statement>,
    ) -> PgWireResult<DescribePortalResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        Ok(DescribePortalResponse::new(schema_for_sql(
            &target.statement.statement,
        )))
    }
}

/// Highest $N parameter placeholder in the SQL string.
fn count_params(sql: &str) -> usize {
    let mut max = 0usize;
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i > start
                && let Ok(n) = sql[start..i].parse::<usize>()
                && n > max
            {
                max = n;
            }
        } else {
            i += 1;
        }
    }
    max
}

/// Substitute $1, $2, ... placeholders with bound parameter values
/// (text format).
fn substitute_params(portal: &Portal<String>) -> String {
    let mut result = portal.statement.statement.to_string();
    for (i, param) in portal.parameters.iter().enumerate().rev() {
        let placeholder = format!("${}", i + 1);
        let value = match param {
            Some(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                format!("'{}'", text.replace('\'', "''"))
            }
            None => "NULL".to_string(),
        };
        result = result.replace(&placeholder, &value);
    }
    result
}

// ── Factory ──────────────────────────────────────────────────────

pub struct InspectdFactory {
    handler: Arc<InspectdHandler>,
    auth_handler:
        Arc<CleartextPasswordAuthStartupHandler<InspectdAuthSource, DefaultServerParameterProvider>>,
    noop: Arc<NoopHandler>,
}

impl InspectdFactory {
    pub fn new(tenant_manager: Arc<TenantManager>, password: String) -> Self {
        let auth_source = InspectdAuthSource::new(password);
        let param_provider = DefaultServerParameterProvider::default();
        Self {
            handler: Arc::new(InspectdHandler::new(tenant_manager)),
            auth_handler: Arc::new(CleartextPasswordAuthStartupHandler::new(
                auth_source,
                param_provider,
            )),
            noop: Arc::new(NoopHandler),
        }
    }
}

impl PgWireServerHandlers for InspectdFactory {
    fn simple_query_handler(&self) -> Arc<impl SimpleQueryHandler> {
        self.handler.clone()
    }

    fn extended_query_handler(&self) -> Arc<impl ExtendedQueryHandler> {
        self.handler.clone()
    }

    fn startup_handler(&self) -> Arc<impl StartupHandler> {
        self.auth_handler.clone()
    }

    fn copy_handler(&self) -> Arc<impl CopyHandler> {
        self.noop.clone()
    }
}

/// Drive one client connection through the pgwire state machine.
pub async fn process_connection(
    socket: TcpStream,
    tenant_manager: Arc<TenantManager>,
    password: String,
    tls: Option<TlsAcceptor>,
) -> io::Result<()> {
    let factory = InspectdFactory::new(tenant_manager, password);
    pgwire::tokio::process_socket(socket, tls, factory).await
}

fn engine_err(e: EngineError) -> PgWireError {
    // WalError is the retryable storage condition; everything else is a
    // terminal application error.
    let code = match &e {
        EngineError::WalError(_) => "58000",
        _ => "P0001",
    };
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        code.into(),
        e.to_string(),
    )))
}

fn sql_err(e: sql::SqlError) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        "42601".into(),
        e.to_string(),
    )))
}
