use chrono::NaiveDate;
use sqlparser::ast::{
    self, Expr, FromTable, ObjectNamePart, SetExpr, Statement, TableFactor, TableObject, Value,
    ValueWithSpan,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use ulid::Ulid;

use crate::model::*;

/// Parsed command from SQL input. The dialect is narrow on purpose:
/// every statement maps to exactly one engine operation over the
/// logical tables `inspectors`, `availability`, `blackouts`,
/// `settings`, `bookings`, `slots`, and `widget`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    InsertInspector {
        id: Ulid,
        name: Option<String>,
    },
    DeleteInspector {
        id: Ulid,
    },
    SelectInspectors,
    /// Multi-row INSERT INTO availability: REPLACES the inspector's
    /// entire window set in one atomic swap.
    ReplaceAvailability {
        inspector_id: Ulid,
        windows: Vec<WeeklyWindow>,
    },
    /// DELETE FROM availability WHERE inspector_id — clears the set.
    ClearAvailability {
        inspector_id: Ulid,
    },
    SelectAvailability {
        inspector_id: Ulid,
    },
    UpsertBlackout {
        id: Ulid,
        inspector_id: Ulid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: Option<String>,
        recurring: bool,
    },
    DeleteBlackout {
        id: Ulid,
    },
    SelectBlackouts {
        inspector_id: Ulid,
    },
    UpdateSettings {
        inspector_id: Ulid,
        patch: SettingsPatch,
    },
    SelectSettings {
        inspector_id: Ulid,
    },
    InsertBooking {
        id: Ulid,
        inspector_id: Ulid,
        date: NaiveDate,
        start: Min,
        duration: Min,
        client: ClientContact,
        address: String,
        notes: Option<String>,
    },
    UpdateBookingStatus {
        id: Ulid,
        status: BookingStatus,
    },
    /// UPDATE bookings SET token = NULL WHERE id — revokes the public
    /// lookup capability.
    RevokeToken {
        id: Ulid,
    },
    SelectBookings {
        inspector_id: Ulid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    SelectBookingByToken {
        token: String,
    },
    SelectSlots {
        inspector_id: Ulid,
        from: NaiveDate,
        to: NaiveDate,
        duration: Min,
    },
    SelectWidget {
        inspector_id: Ulid,
    },
    Listen {
        channel: String,
    },
}

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    let trimmed = sql.trim();
    if trimmed.to_uppercase().starts_with("LISTEN ") {
        let channel = trimmed[7..].trim().trim_matches(';').to_string();
        return Ok(Command::Listen { channel });
    }

    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    if stmts.is_empty() {
        return Err(SqlError::Empty);
    }

    match &stmts[0] {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Delete(delete) => parse_delete(delete),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => parse_update(table, assignments, selection),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;
    let rows = extract_insert_rows(insert)?;

    match table.as_str() {
        "inspectors" => {
            let values = single_row(&table, &rows)?;
            if values.is_empty() {
                return Err(SqlError::WrongArity("inspectors", 1, 0));
            }
            let name = if values.len() >= 2 {
                parse_string_or_null(&values[1])?
            } else {
                None
            };
            Ok(Command::InsertInspector {
                id: parse_ulid(&values[0])?,
                name,
            })
        }
        "availability" => {
            let mut inspector_id = None;
            let mut windows = Vec::with_capacity(rows.len());
            for (i, row) in rows.iter().enumerate() {
                if row.len() < 6 {
                    return Err(SqlError::WrongArity("availability row", 6, row.len()));
                }
                let row_err = |e: SqlError| SqlError::Parse(format!("row {i}: {e}"));
                let owner = parse_ulid(&row[1]).map_err(row_err)?;
                match inspector_id {
                    None => inspector_id = Some(owner),
                    Some(prev) if prev != owner => {
                        return Err(SqlError::Parse(
                            "availability rows must share one inspector_id".into(),
                        ));
                    }
                    Some(_) => {}
                }
                windows.push(WeeklyWindow {
                    id: parse_ulid(&row[0]).map_err(row_err)?,
                    weekday: parse_u8(&row[2]).map_err(row_err)?,
                    start: parse_i64(&row[3]).map_err(row_err)?,
                    end: parse_i64(&row[4]).map_err(row_err)?,
                    active: parse_bool(&row[5]).map_err(row_err)?,
                });
            }
            let inspector_id = inspector_id.ok_or(SqlError::Empty)?;
            Ok(Command::ReplaceAvailability {
                inspector_id,
                windows,
            })
        }
        "blackouts" => {
            let values = single_row(&table, &rows)?;
            if values.len() < 6 {
                return Err(SqlError::WrongArity("blackouts", 6, values.len()));
            }
            Ok(Command::UpsertBlackout {
                id: parse_ulid(&values[0])?,
                inspector_id: parse_ulid(&values[1])?,
                start_date: parse_date(&values[2])?,
                end_date: parse_date(&values[3])?,
                reason: parse_string_or_null(&values[4])?,
                recurring: parse_bool(&values[5])?,
            })
        }
        "bookings" => {
            let values = single_row(&table, &rows)?;
            if values.len() < 9 {
                return Err(SqlError::WrongArity("bookings", 9, values.len()));
            }
            let notes = if values.len() >= 10 {
                parse_string_or_null(&values[9])?
            } else {
                None
            };
            Ok(Command::InsertBooking {
                id: parse_ulid(&values[0])?,
                inspector_id: parse_ulid(&values[1])?,
                date: parse_date(&values[2])?,
                start: parse_i64(&values[3])?,
                duration: parse_i64(&values[4])?,
                client: ClientContact {
                    name: parse_string(&values[5])?,
                    email: parse_string(&values[6])?,
                    phone: parse_string_or_null(&values[7])?,
                },
                address: parse_string(&values[8])?,
                notes,
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_delete(delete: &ast::Delete) -> Result<Command, SqlError> {
    let table = delete_table_name(delete)?;
    match table.as_str() {
        "inspectors" => Ok(Command::DeleteInspector {
            id: extract_where_eq_ulid(&delete.selection, "id")?,
        }),
        "availability" => Ok(Command::ClearAvailability {
            inspector_id: extract_where_eq_ulid(&delete.selection, "inspector_id")?,
        }),
        "blackouts" => Ok(Command::DeleteBlackout {
            id: extract_where_eq_ulid(&delete.selection, "id")?,
        }),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_update(
    table: &ast::TableWithJoins,
    assignments: &[ast::Assignment],
    selection: &Option<Expr>,
) -> Result<Command, SqlError> {
    let table = table_factor_name(&table.relation)?;
    match table.as_str() {
        "settings" => {
            let inspector_id = extract_where_eq_ulid(selection, "inspector_id")?;
            let mut patch = SettingsPatch::default();
            for a in assignments {
                let col = assignment_column(a)?;
                match col.as_str() {
                    "max_daily_bookings" => {
                        patch.max_daily_bookings = Some(parse_u32(&a.value)?);
                    }
                    "buffer_minutes" => patch.buffer_min = Some(parse_i64(&a.value)?),
                    "advance_days" => patch.advance_days = Some(parse_i64(&a.value)?),
                    "widget_enabled" => patch.widget_enabled = Some(parse_bool(&a.value)?),
                    _ => return Err(SqlError::Parse(format!("unknown settings column: {col}"))),
                }
            }
            if patch == SettingsPatch::default() {
                return Err(SqlError::Parse("empty settings update".into()));
            }
            Ok(Command::UpdateSettings {
                inspector_id,
                patch,
            })
        }
        "bookings" => {
            let id = extract_where_eq_ulid(selection, "id")?;
            let [assignment] = assignments else {
                return Err(SqlError::Parse(
                    "bookings update takes exactly one assignment".into(),
                ));
            };
            match assignment_column(assignment)?.as_str() {
                "status" => {
                    let raw = parse_string(&assignment.value)?;
                    let status = BookingStatus::parse(&raw)
                        .ok_or_else(|| SqlError::Parse(format!("unknown status: {raw}")))?;
                    Ok(Command::UpdateBookingStatus { id, status })
                }
                "token" => {
                    if !matches!(extract_value(&assignment.value), Some(Value::Null)) {
                        return Err(SqlError::Parse("token can only be set to NULL".into()));
                    }
                    Ok(Command::RevokeToken { id })
                }
                other => Err(SqlError::Parse(format!("unknown bookings column: {other}"))),
            }
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    if select.from.is_empty() {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    }
    let table = table_factor_name(&select.from[0].relation)?;

    let mut filters = Filters::default();
    if let Some(selection) = &select.selection {
        collect_filters(selection, &mut filters)?;
    }

    match table.as_str() {
        "inspectors" => Ok(Command::SelectInspectors),
        "availability" => Ok(Command::SelectAvailability {
            inspector_id: filters.require_inspector()?,
        }),
        "blackouts" => Ok(Command::SelectBlackouts {
            inspector_id: filters.require_inspector()?,
        }),
        "settings" => Ok(Command::SelectSettings {
            inspector_id: filters.require_inspector()?,
        }),
        "widget" => Ok(Command::SelectWidget {
            inspector_id: filters.require_inspector()?,
        }),
        "bookings" => {
            if let Some(token) = filters.token {
                return Ok(Command::SelectBookingByToken { token });
            }
            Ok(Command::SelectBookings {
                inspector_id: filters.require_inspector()?,
                from: filters.date_from,
                to: filters.date_to,
            })
        }
        "slots" => Ok(Command::SelectSlots {
            inspector_id: filters.require_inspector()?,
            from: filters.date_from.ok_or(SqlError::MissingFilter("date >="))?,
            to: filters.date_to.ok_or(SqlError::MissingFilter("date <="))?,
            duration: filters.duration.ok_or(SqlError::MissingFilter("duration"))?,
        }),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

// ── WHERE-clause extraction ───────────────────────────────────

#[derive(Default)]
struct Filters {
    inspector_id: Option<Ulid>,
    token: Option<String>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    duration: Option<i64>,
}

impl Filters {
    fn require_inspector(&self) -> Result<Ulid, SqlError> {
        self.inspector_id.ok_or(SqlError::MissingFilter("inspector_id"))
    }
}

fn collect_filters(expr: &Expr, filters: &mut Filters) -> Result<(), SqlError> {
    if let Expr::BinaryOp { left, op, right } = expr {
        match op {
            ast::BinaryOperator::And => {
                collect_filters(left, filters)?;
                collect_filters(right, filters)?;
            }
            ast::BinaryOperator::Eq => match expr_column_name(left).as_deref() {
                Some("inspector_id") => filters.inspector_id = Some(parse_ulid(right)?),
                Some("token") => filters.token = Some(parse_string(right)?),
                Some("duration") => filters.duration = Some(parse_i64(right)?),
                Some("date") => {
                    // date = 'x' pins both ends of the range.
                    let d = parse_date(right)?;
                    filters.date_from = Some(d);
                    filters.date_to = Some(d);
                }
                _ => {}
            },
            ast::BinaryOperator::GtEq => {
                if expr_column_name(left).as_deref() == Some("date") {
                    filters.date_from = Some(parse_date(right)?);
                }
            }
            ast::BinaryOperator::LtEq => {
                if expr_column_name(left).as_deref() == Some("date") {
                    filters.date_to = Some(parse_date(right)?);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn extract_where_eq_ulid(selection: &Option<Expr>, col: &'static str) -> Result<Ulid, SqlError> {
    let sel = selection.as_ref().ok_or(SqlError::MissingFilter(col))?;
    match sel {
        Expr::BinaryOp {
            left,
            op: ast::BinaryOperator::Eq,
            right,
        } if expr_column_name(left).as_deref() == Some(col) => parse_ulid(right),
        _ => Err(SqlError::MissingFilter(col)),
    }
}

// ── AST helpers ───────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn delete_table_name(delete: &ast::Delete) -> Result<String, SqlError> {
    let tables_with_joins = match &delete.from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    match tables_with_joins.first() {
        Some(first) => table_factor_name(&first.relation),
        None => Err(SqlError::Parse("DELETE without table".into())),
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn assignment_column(a: &ast::Assignment) -> Result<String, SqlError> {
    match &a.target {
        ast::AssignmentTarget::ColumnName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty column name".into()))
        }
        _ => Err(SqlError::Parse("unsupported assignment target".into())),
    }
}

fn extract_insert_rows(insert: &ast::Insert) -> Result<Vec<Vec<Expr>>, SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => {
            if values.rows.is_empty() {
                return Err(SqlError::Parse("empty VALUES".into()));
            }
            Ok(values.rows.clone())
        }
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn single_row<'a>(table: &str, rows: &'a [Vec<Expr>]) -> Result<&'a [Expr], SqlError> {
    match rows {
        [row] => Ok(row),
        _ => Err(SqlError::Parse(format!(
            "{table}: multi-row INSERT not supported"
        ))),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

fn parse_ulid(expr: &Expr) -> Result<Ulid, SqlError> {
    match extract_value(expr) {
        Some(Value::SingleQuotedString(s) | Value::Number(s, _)) => {
            Ulid::from_string(s).map_err(|e| SqlError::Parse(format!("bad ULID: {e}")))
        }
        Some(value) => Err(SqlError::Parse(format!("expected string, got {value:?}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr:?}"))),
    }
}

fn parse_i64(expr: &Expr) -> Result<i64, SqlError> {
    match extract_value(expr) {
        Some(Value::Number(s, _) | Value::SingleQuotedString(s)) => s
            .parse()
            .map_err(|e| SqlError::Parse(format!("bad i64: {e}"))),
        Some(value) => Err(SqlError::Parse(format!("expected number, got {value:?}"))),
        None => {
            if let Expr::UnaryOp {
                op: ast::UnaryOperator::Minus,
                expr,
            } = expr
            {
                Ok(-parse_i64(expr)?)
            } else {
                Err(SqlError::Parse(format!("expected value, got {expr:?}")))
            }
        }
    }
}

fn parse_u8(expr: &Expr) -> Result<u8, SqlError> {
    let v = parse_i64(expr)?;
    u8::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of u8 range")))
}

fn parse_u32(expr: &Expr) -> Result<u32, SqlError> {
    let v = parse_i64(expr)?;
    u32::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of u32 range")))
}

fn parse_string(expr: &Expr) -> Result<String, SqlError> {
    match extract_value(expr) {
        Some(Value::SingleQuotedString(s)) => Ok(s.clone()),
        Some(value) => Err(SqlError::Parse(format!("expected string, got {value:?}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr:?}"))),
    }
}

fn parse_string_or_null(expr: &Expr) -> Result<Option<String>, SqlError> {
    match extract_value(expr) {
        Some(Value::Null) => Ok(None),
        _ => Ok(Some(parse_string(expr)?)),
    }
}

/// Dates travel as 'YYYY-MM-DD' strings.
fn parse_date(expr: &Expr) -> Result<NaiveDate, SqlError> {
    let s = parse_string(expr)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .map_err(|e| SqlError::Parse(format!("bad date {s:?}: {e}")))
}

fn parse_bool(expr: &Expr) -> Result<bool, SqlError> {
    match extract_value(expr) {
        Some(Value::Boolean(b)) => Ok(*b),
        Some(Value::SingleQuotedString(s)) => match s.to_lowercase().as_str() {
            "true" | "t" | "1" => Ok(true),
            "false" | "f" | "0" => Ok(false),
            _ => Err(SqlError::Parse(format!("bad bool: {s}"))),
        },
        Some(Value::Number(n, _)) => Ok(n != "0"),
        Some(value) => Err(SqlError::Parse(format!("expected bool, got {value:?}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr:?}"))),
    }
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    WrongArity(&'static str, usize, usize),
    MissingFilter(&'static str),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: expected {expected} values, got {got}")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
        }
    }
}

impl std::error::Error for SqlError {}

#[cfg(test)]
mod tests {
    use super::*;

    const U1: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    const U2: &str = "01BX5ZZKBKACTAV9WEVGEMMVRZ";

    #[test]
    fn insert_inspector_minimal() {
        let cmd = parse_sql(&format!("INSERT INTO inspectors (id) VALUES ('{U1}')")).unwrap();
        match cmd {
            Command::InsertInspector { id, name } => {
                assert_eq!(id.to_string(), U1);
                assert_eq!(name, None);
            }
            _ => panic!("expected InsertInspector, got {cmd:?}"),
        }
    }

    #[test]
    fn insert_inspector_with_name() {
        let cmd = parse_sql(&format!(
            "INSERT INTO inspectors (id, name) VALUES ('{U1}', 'Rosa Vela')"
        ))
        .unwrap();
        match cmd {
            Command::InsertInspector { name, .. } => assert_eq!(name.as_deref(), Some("Rosa Vela")),
            _ => panic!("expected InsertInspector, got {cmd:?}"),
        }
    }

    #[test]
    fn replace_availability_multi_row() {
        let sql = format!(
            r#"INSERT INTO availability (id, inspector_id, weekday, start, "end", active)
               VALUES ('{U1}', '{U2}', 1, 540, 1020, true),
                      ('{U1}', '{U2}', 3, 480, 720, true)"#
        );
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::ReplaceAvailability {
                inspector_id,
                windows,
            } => {
                assert_eq!(inspector_id.to_string(), U2);
                assert_eq!(windows.len(), 2);
                assert_eq!(windows[0].weekday, 1);
                assert_eq!(windows[0].start, 540);
                assert_eq!(windows[1].weekday, 3);
                assert!(windows[1].active);
            }
            _ => panic!("expected ReplaceAvailability, got {cmd:?}"),
        }
    }

    #[test]
    fn replace_availability_mixed_inspectors_rejected() {
        let sql = format!(
            r#"INSERT INTO availability (id, inspector_id, weekday, start, "end", active)
               VALUES ('{U1}', '{U1}', 1, 540, 1020, true),
                      ('{U1}', '{U2}', 3, 480, 720, true)"#
        );
        assert!(parse_sql(&sql).is_err());
    }

    #[test]
    fn clear_availability() {
        let cmd =
            parse_sql(&format!("DELETE FROM availability WHERE inspector_id = '{U1}'")).unwrap();
        assert!(matches!(cmd, Command::ClearAvailability { .. }));
    }

    #[test]
    fn upsert_blackout() {
        let sql = format!(
            "INSERT INTO blackouts (id, inspector_id, start_date, end_date, reason, recurring) \
             VALUES ('{U1}', '{U2}', '2026-12-24', '2026-12-26', 'holidays', true)"
        );
        let cmd = parse_sql(&sql).unwrap();
        match cmd {
            Command::UpsertBlackout {
                start_date,
                end_date,
                reason,
                recurring,
                ..
            } => {
                assert_eq!(start_date, NaiveDate::from_ymd_opt(2026, 12, 24).unwrap());
                assert_eq!(end_date, NaiveDate::from_ymd_opt(2026, 12, 26).unwrap());
                assert_eq!(reason.as_deref(), Some("holidays"));
                assert!(recurring);
            }
            _ => panic!("expected UpsertBlackout, got {cmd:?}"),
        }
    }

    #[test]
    fn blackout_null_reason() {
        let sql = format!(
            "INSERT INTO blackouts (id, inspector_id, start_date, end_date, reason, recurring) \
             VALUES ('{U1}', '{U2}', '2026-12-24', '2026-12-26', NULL, false)"
        );
        match parse_sql(&sql).unwrap() {
            Command::UpsertBlackout { reason, .. } => assert_eq!(reason, None),
            cmd => panic!("expected UpsertBlackout, got {cmd:?}"),
        }
    }

    #[test]
    fn update_settings_patch() {
        let sql = format!(
            "UPDATE settings SET buffer_minutes = 30, widget_enabled = true \
             WHERE inspector_id = '{U1}'"
        );
        match parse_sql(&sql).unwrap() {
            Command::UpdateSettings { patch, .. } => {
                assert_eq!(patch.buffer_min, Some(30));
                assert_eq!(patch.widget_enabled, Some(true));
                assert_eq!(patch.max_daily_bookings, None);
                assert_eq!(patch.advance_days, None);
            }
            cmd => panic!("expected UpdateSettings, got {cmd:?}"),
        }
    }

    #[test]
    fn update_settings_unknown_column_rejected() {
        let sql = format!("UPDATE settings SET timezone = 'UTC' WHERE inspector_id = '{U1}'");
        assert!(parse_sql(&sql).is_err());
    }

    #[test]
    fn insert_booking_full() {
        let sql = format!(
            "INSERT INTO bookings (id, inspector_id, date, start, duration, client_name, \
             client_email, client_phone, address, notes) \
             VALUES ('{U1}', '{U2}', '2026-09-14', 540, 120, 'Ana Ruiz', 'ana@example.com', \
             NULL, '12 Elm St', 'bring ladder')"
        );
        match parse_sql(&sql).unwrap() {
            Command::InsertBooking {
                date,
                start,
                duration,
                client,
                address,
                notes,
                ..
            } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 9, 14).unwrap());
                assert_eq!(start, 540);
                assert_eq!(duration, 120);
                assert_eq!(client.name, "Ana Ruiz");
                assert_eq!(client.phone, None);
                assert_eq!(address, "12 Elm St");
                assert_eq!(notes.as_deref(), Some("bring ladder"));
            }
            cmd => panic!("expected InsertBooking, got {cmd:?}"),
        }
    }

    #[test]
    fn update_booking_status() {
        let cmd = parse_sql(&format!(
            "UPDATE bookings SET status = 'confirmed' WHERE id = '{U1}'"
        ))
        .unwrap();
        match cmd {
            Command::UpdateBookingStatus { status, .. } => {
                assert_eq!(status, BookingStatus::Confirmed);
            }
            _ => panic!("expected UpdateBookingStatus, got {cmd:?}"),
        }
    }

    #[test]
    fn update_booking_bad_status_rejected() {
        let sql = format!("UPDATE bookings SET status = 'no-show' WHERE id = '{U1}'");
        assert!(parse_sql(&sql).is_err());
    }

    #[test]
    fn revoke_token() {
        let cmd =
            parse_sql(&format!("UPDATE bookings SET token = NULL WHERE id = '{U1}'")).unwrap();
        assert!(matches!(cmd, Command::RevokeToken { .. }));
    }

    #[test]
    fn token_cannot_be_assigned() {
        let sql = format!("UPDATE bookings SET token = 'forged' WHERE id = '{U1}'");
        assert!(parse_sql(&sql).is_err());
    }

    #[test]
    fn select_slots() {
        let sql = format!(
            "SELECT * FROM slots WHERE inspector_id = '{U1}' AND date >= '2026-09-01' \
             AND date <= '2026-09-07' AND duration = 90"
        );
        match parse_sql(&sql).unwrap() {
            Command::SelectSlots {
                from, to, duration, ..
            } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
                assert_eq!(to, NaiveDate::from_ymd_opt(2026, 9, 7).unwrap());
                assert_eq!(duration, 90);
            }
            cmd => panic!("expected SelectSlots, got {cmd:?}"),
        }
    }

    #[test]
    fn select_slots_missing_duration_rejected() {
        let sql = format!(
            "SELECT * FROM slots WHERE inspector_id = '{U1}' AND date >= '2026-09-01' \
             AND date <= '2026-09-07'"
        );
        assert!(matches!(
            parse_sql(&sql),
            Err(SqlError::MissingFilter("duration"))
        ));
    }

    #[test]
    fn select_bookings_with_range() {
        let sql = format!(
            "SELECT * FROM bookings WHERE inspector_id = '{U1}' AND date >= '2026-09-01' \
             AND date <= '2026-09-30'"
        );
        match parse_sql(&sql).unwrap() {
            Command::SelectBookings { from, to, .. } => {
                assert!(from.is_some());
                assert!(to.is_some());
            }
            cmd => panic!("expected SelectBookings, got {cmd:?}"),
        }
    }

    #[test]
    fn select_booking_by_token() {
        let cmd = parse_sql("SELECT * FROM bookings WHERE token = 'tok123'").unwrap();
        match cmd {
            Command::SelectBookingByToken { token } => assert_eq!(token, "tok123"),
            _ => panic!("expected SelectBookingByToken, got {cmd:?}"),
        }
    }

    #[test]
    fn select_bookings_pinned_date() {
        let sql = format!("SELECT * FROM bookings WHERE inspector_id = '{U1}' AND date = '2026-09-14'");
        match parse_sql(&sql).unwrap() {
            Command::SelectBookings { from, to, .. } => {
                assert_eq!(from, to);
                assert!(from.is_some());
            }
            cmd => panic!("expected SelectBookings, got {cmd:?}"),
        }
    }

    #[test]
    fn select_widget_and_settings() {
        assert!(matches!(
            parse_sql(&format!("SELECT * FROM widget WHERE inspector_id = '{U1}'")).unwrap(),
            Command::SelectWidget { .. }
        ));
        assert!(matches!(
            parse_sql(&format!("SELECT * FROM settings WHERE inspector_id = '{U1}'")).unwrap(),
            Command::SelectSettings { .. }
        ));
    }

    #[test]
    fn listen_channel() {
        let cmd = parse_sql(&format!("LISTEN inspector_{U1}")).unwrap();
        match cmd {
            Command::Listen { channel } => assert_eq!(channel, format!("inspector_{U1}")),
            _ => panic!("expected Listen, got {cmd:?}"),
        }
    }

    #[test]
    fn unknown_table_rejected() {
        assert!(parse_sql(&format!("INSERT INTO parcels (id) VALUES ('{U1}')")).is_err());
        assert!(parse_sql("SELECT * FROM parcels").is_err());
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(parse_sql(""), Err(SqlError::Empty)));
    }

    #[test]
    fn bookings_multi_row_rejected() {
        let sql = format!(
            "INSERT INTO bookings (id, inspector_id, date, start, duration, client_name, \
             client_email, client_phone, address) \
             VALUES ('{U1}', '{U2}', '2026-09-14', 540, 60, 'A', 'a@x.com', NULL, '1 St'), \
                    ('{U2}', '{U2}', '2026-09-14', 660, 60, 'B', 'b@x.com', NULL, '2 St')"
        );
        assert!(parse_sql(&sql).is_err());
    }
}
