//! Query execution and result shaping
//!
//! [`QueryExecutor`] runs one statement on the connection supplied by the
//! [`ConnectionManager`] and returns it in one of two shapes:
//!
//! - [`ResultShape::Structured`]: a [`QueryResult`] envelope. Never fails; engine errors
//!   become `success: false` with the message in `error`.
//! - [`ResultShape::Tabulated`]: a fixed-width text table. Errors propagate as
//!   [`GatewayError::QueryFailed`].

use comfy_table::presets::ASCII_FULL_CONDENSED;
use comfy_table::Table;
use duckdb::core::{LogicalTypeHandle, LogicalTypeId};
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use serde::Serialize;
use serde_json::Value as Json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::engine::extension::{ExtensionStatus, SPREADSHEET_EXTENSION};
use crate::engine::manager::ConnectionManager;
use crate::engine::{QueryResult, Record, ResultShape, MAX_STRUCTURED_ROWS};
use crate::error::{GatewayError, Result};

/// Days between 0001-01-01 (day 1 of the common era) and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Offset appended to `TIMESTAMP WITH TIME ZONE` values
const UTC_OFFSET: &str = "+00";

/// Table function that needs the spreadsheet extension
const SPREADSHEET_READER: &str = "read_xlsx(";

/// Result of [`QueryExecutor::execute`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    Text(String),
    Structured(QueryResult),
}

/// Declared type of a result column
struct ColumnType {
    label: String,
    /// `TIMESTAMP WITH TIME ZONE` values arrive as UTC instants
    zoned: bool,
}

/// Rows pulled from the engine before shaping
struct Materialized {
    columns: Vec<String>,
    types: Vec<ColumnType>,
    rows: Vec<Vec<Value>>,
}

/// Runs statements against a shared [`ConnectionManager`]
#[derive(Clone)]
pub struct QueryExecutor {
    manager: Arc<ConnectionManager>,
}

impl QueryExecutor {
    pub const fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    #[must_use]
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Execute `query` and shape the result
    ///
    /// # Errors
    /// Only the tabulated shape returns errors; structured failures are reported in the result.
    pub fn execute(&self, query: &str, shape: ResultShape) -> Result<QueryOutput> {
        match shape {
            ResultShape::Structured => Ok(QueryOutput::Structured(self.structured(query))),
            ResultShape::Tabulated => self.tabulated(query).map(QueryOutput::Text),
        }
    }

    /// Execute `query` and return the JSON envelope
    pub fn structured(&self, query: &str) -> QueryResult {
        let start = Instant::now();

        // one row past the cap is enough to know the result was truncated
        let outcome = self
            .manager
            .with_connection(|conn| materialize(conn, query, Some(MAX_STRUCTURED_ROWS + 1)));

        match outcome {
            Ok(result) => {
                let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                let data = result
                    .rows
                    .into_iter()
                    .map(|values| to_record(&result.columns, &result.types, values))
                    .collect();
                let shaped = QueryResult::success(query, result.columns, data, elapsed);
                debug!(
                    "Query returned {} rows in {elapsed}ms (truncated: {})",
                    shaped.row_count, shaped.truncated
                );
                shaped
            }
            Err(e) => {
                warn!("Query failed: {e}");
                let message = annotate_failure(e.detail(), query, self.manager.extensions());
                QueryResult::failure(query, message)
            }
        }
    }

    /// Execute `query` and render it as a text table
    ///
    /// Every column header carries the column name and, on the next line, its engine type.
    /// No row cap is applied.
    pub fn tabulated(&self, query: &str) -> Result<String> {
        let result = self.manager.with_connection(|conn| materialize(conn, query, None))?;
        Ok(render_table(&result))
    }
}

/// Run `query` and collect at most `limit` rows
fn materialize(conn: &Connection, query: &str, limit: Option<usize>) -> Result<Materialized> {
    let mut stmt = conn.prepare(query).map_err(|e| GatewayError::query_failed(e.to_string()))?;
    let mut rows = stmt.query([]).map_err(|e| GatewayError::query_failed(e.to_string()))?;

    let (columns, types) = match rows.as_ref() {
        Some(stmt) => {
            let columns = stmt.column_names();
            let types = (0..columns.len())
                .map(|i| {
                    let logical = stmt.column_logical_type(i);
                    ColumnType {
                        label: type_label(&logical),
                        zoned: matches!(logical.id(), LogicalTypeId::TimestampTZ),
                    }
                })
                .collect();
            (columns, types)
        }
        None => (Vec::new(), Vec::new()),
    };

    let mut collected = Vec::new();
    while let Some(row) = rows.next().map_err(|e| GatewayError::query_failed(e.to_string()))? {
        if limit.is_some_and(|max| collected.len() >= max) {
            break;
        }
        let values = (0..columns.len())
            .map(|i| row.get::<_, Value>(i))
            .collect::<duckdb::Result<Vec<_>>>()
            .map_err(|e| GatewayError::query_failed(format!("Failed to read row: {e}")))?;
        collected.push(values);
    }

    Ok(Materialized { columns, types, rows: collected })
}

/// Failure text of a structured query: the engine message, noting a missing spreadsheet reader
fn annotate_failure(detail: &str, query: &str, extensions: Option<ExtensionStatus>) -> String {
    let reader_missing = extensions.is_some_and(|status| !status.spreadsheet);
    if reader_missing && query.to_ascii_lowercase().contains(SPREADSHEET_READER) {
        format!("{detail} ({SPREADSHEET_EXTENSION} extension unavailable)")
    } else {
        detail.to_string()
    }
}

fn to_record(columns: &[String], types: &[ColumnType], values: Vec<Value>) -> Record {
    columns
        .iter()
        .cloned()
        .zip(types.iter().zip(values).map(|(ty, value)| cell_to_json(value, ty)))
        .collect()
}

fn cell_to_json(value: Value, ty: &ColumnType) -> Json {
    match value {
        Value::Timestamp(unit, raw) if ty.zoned => timestamp_to_json(unit, raw, UTC_OFFSET),
        other => value_to_json(other),
    }
}

fn render_table(result: &Materialized) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL_CONDENSED).set_header(
        result.columns.iter().zip(&result.types).map(|(name, ty)| format!("{name}\n{}", ty.label)),
    );

    for row in &result.rows {
        table.add_row(
            row.iter().cloned().zip(&result.types).map(|(v, ty)| display_json(&cell_to_json(v, ty))),
        );
    }

    table.to_string()
}

fn display_json(value: &Json) -> String {
    match value {
        Json::Null => "NULL".to_string(),
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Engine type name for a result column
fn type_label(logical: &LogicalTypeHandle) -> String {
    if let Some(alias) = logical.get_alias() {
        return alias;
    }

    let label = match logical.id() {
        LogicalTypeId::Boolean => "BOOLEAN",
        LogicalTypeId::Tinyint => "TINYINT",
        LogicalTypeId::Smallint => "SMALLINT",
        LogicalTypeId::Integer => "INTEGER",
        LogicalTypeId::Bigint => "BIGINT",
        LogicalTypeId::Hugeint => "HUGEINT",
        LogicalTypeId::UTinyint => "UTINYINT",
        LogicalTypeId::USmallint => "USMALLINT",
        LogicalTypeId::UInteger => "UINTEGER",
        LogicalTypeId::UBigint => "UBIGINT",
        LogicalTypeId::UHugeint => "UHUGEINT",
        LogicalTypeId::Float => "FLOAT",
        LogicalTypeId::Double => "DOUBLE",
        LogicalTypeId::Varchar => "VARCHAR",
        LogicalTypeId::Blob => "BLOB",
        LogicalTypeId::Bit => "BIT",
        LogicalTypeId::Uuid => "UUID",
        LogicalTypeId::Date => "DATE",
        LogicalTypeId::Time => "TIME",
        LogicalTypeId::TimeTZ => "TIME WITH TIME ZONE",
        LogicalTypeId::Timestamp => "TIMESTAMP",
        LogicalTypeId::TimestampS => "TIMESTAMP_S",
        LogicalTypeId::TimestampMs => "TIMESTAMP_MS",
        LogicalTypeId::TimestampNs => "TIMESTAMP_NS",
        LogicalTypeId::TimestampTZ => "TIMESTAMP WITH TIME ZONE",
        LogicalTypeId::Interval => "INTERVAL",
        LogicalTypeId::Enum => "ENUM",
        LogicalTypeId::List => "LIST",
        LogicalTypeId::Array => "ARRAY",
        LogicalTypeId::Map => "MAP",
        LogicalTypeId::Union => "UNION",
        LogicalTypeId::Decimal => {
            return format!("DECIMAL({},{})", logical.decimal_width(), logical.decimal_scale())
        }
        LogicalTypeId::Struct => {
            let fields: Vec<String> = (0..logical.num_children())
                .map(|i| format!("{} {}", logical.child_name(i), type_label(&logical.child(i))))
                .collect();
            return format!("STRUCT({})", fields.join(", "));
        }
        other => return format!("{other:?}").to_uppercase(),
    };
    label.to_string()
}

/// Convert an engine value to JSON
///
/// Numbers stay numbers (non-finite floats become null, 128-bit integers outside the `i64`
/// range become strings). Decimals are strings to keep their precision. Temporal values are
/// ISO-8601 strings, intervals use the engine's text form and blobs are Base64. Lists and
/// arrays become JSON arrays; structs and maps become objects in engine order.
pub fn value_to_json(value: Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(b),
        Value::TinyInt(i) => Json::from(i),
        Value::SmallInt(i) => Json::from(i),
        Value::Int(i) => Json::from(i),
        Value::BigInt(i) => Json::from(i),
        Value::HugeInt(i) => i64::try_from(i).map_or_else(|_| Json::String(i.to_string()), Json::from),
        Value::UTinyInt(i) => Json::from(i),
        Value::USmallInt(i) => Json::from(i),
        Value::UInt(i) => Json::from(i),
        Value::UBigInt(i) => Json::from(i),
        Value::Float(f) => float_to_json(f64::from(f)),
        Value::Double(f) => float_to_json(f),
        Value::Decimal(d) => Json::String(d.to_string()),
        Value::Text(s) | Value::Enum(s) => Json::String(s),
        Value::Blob(bytes) => {
            use base64::Engine;
            Json::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        Value::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(chrono::NaiveDate::from_num_days_from_ce_opt)
            .map_or(Json::Null, |date| Json::String(date.format("%Y-%m-%d").to_string())),
        Value::Timestamp(unit, raw) => timestamp_to_json(unit, raw, ""),
        Value::Time64(unit, raw) => time_of_day(to_micros(unit, raw))
            .map_or(Json::Null, |t| Json::String(t.format(TIME_FORMAT).to_string())),
        Value::Interval { months, days, nanos } => Json::String(interval_text(months, days, nanos)),
        Value::List(items) | Value::Array(items) => {
            Json::Array(items.into_iter().map(value_to_json).collect())
        }
        Value::Struct(fields) => Json::Object(
            fields.iter().map(|(name, v)| (name.clone(), value_to_json(v.clone()))).collect(),
        ),
        Value::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (display_json(&value_to_json(k.clone())), value_to_json(v.clone())))
                .collect(),
        ),
        Value::Union(member) => value_to_json(*member),
    }
}

/// Timestamp text with `suffix` appended (the UTC offset for zoned columns)
fn timestamp_to_json(unit: TimeUnit, raw: i64, suffix: &str) -> Json {
    chrono::DateTime::from_timestamp_micros(to_micros(unit, raw)).map_or(Json::Null, |ts| {
        Json::String(format!("{}{suffix}", ts.naive_utc().format(TIMESTAMP_FORMAT)))
    })
}

/// Interval in the engine's text form (`1 year 2 months 3 days 04:05:06.5`)
fn interval_text(months: i32, days: i32, nanos: i64) -> String {
    let mut parts = Vec::new();
    for (amount, unit) in [(months / 12, "year"), (months % 12, "month"), (days, "day")] {
        if amount != 0 {
            let plural = if amount.unsigned_abs() == 1 { "" } else { "s" };
            parts.push(format!("{amount} {unit}{plural}"));
        }
    }

    let micros = nanos / 1_000;
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let total = micros.unsigned_abs();
        let secs = total / 1_000_000;
        let mut time = format!("{sign}{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
        let fraction = total % 1_000_000;
        if fraction != 0 {
            time.push('.');
            time.push_str(format!("{fraction:06}").trim_end_matches('0'));
        }
        parts.push(time);
    }

    parts.join(" ")
}

fn float_to_json(f: f64) -> Json {
    serde_json::Number::from_f64(f).map_or(Json::Null, Json::Number)
}

fn to_micros(unit: TimeUnit, raw: i64) -> i64 {
    match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    }
}

fn time_of_day(micros: i64) -> Option<chrono::NaiveTime> {
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok()?;
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::engine::resolve::resolve_with_env;
    use duckdb::types::OrderedMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn memory_executor() -> QueryExecutor {
        let target = resolve_with_env(":memory:", None, false, |_| None).unwrap();
        let manager = ConnectionManager::open(target, ConnectionConfig::default().offline()).unwrap();
        QueryExecutor::new(Arc::new(manager))
    }

    #[test]
    fn test_structured_select() {
        let executor = memory_executor();
        let result = executor.structured("SELECT 1 AS id, 'alice' AS name");

        assert!(result.success);
        assert_eq!(result.columns, vec!["id".to_string(), "name".to_string()]);
        assert_eq!(result.row_count, 1);
        assert_eq!(Json::Object(result.data[0].clone()), json!({"id": 1, "name": "alice"}));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_structured_preserves_column_order() {
        let executor = memory_executor();
        let result = executor.structured("SELECT 3 AS z, 2 AS y, 1 AS x");
        let keys: Vec<&String> = result.data[0].keys().collect();
        assert_eq!(keys, vec!["z", "y", "x"]);
    }

    #[test]
    fn test_structured_truncates_at_cap() {
        let executor = memory_executor();
        let result = executor.structured("SELECT range AS n FROM range(1500) ORDER BY n");

        assert!(result.success);
        assert!(result.truncated);
        assert_eq!(result.row_count, 1000);
        assert_eq!(result.data.len(), 1000);
        for (i, row) in result.data.iter().enumerate() {
            assert_eq!(row["n"], json!(i));
        }
    }

    #[test]
    fn test_structured_failure_is_data() {
        let executor = memory_executor();
        let result = executor.structured("SELECT * FROM no_such_table");

        assert!(!result.success);
        assert!(result.data.is_empty());
        assert!(result.columns.is_empty());
        assert_eq!(result.row_count, 0);
        assert_eq!(result.execution_time_ms, 0);
        assert!(!result.truncated);
        assert!(result.error.unwrap().contains("no_such_table"));
    }

    #[test]
    fn test_tabulated_failure_propagates() {
        let executor = memory_executor();
        let err = executor.tabulated("SELEC 1").unwrap_err();
        assert!(matches!(err, GatewayError::QueryFailed(_)));
    }

    #[test]
    fn test_tabulated_headers_carry_types() {
        let executor = memory_executor();
        let text = executor.tabulated("SELECT 42::INTEGER AS answer, 'x' AS label").unwrap();

        assert!(text.contains("answer"));
        assert!(text.contains("INTEGER"));
        assert!(text.contains("label"));
        assert!(text.contains("VARCHAR"));
        assert!(text.contains("42"));
        assert!(text.find("answer") < text.find("label"));
    }

    #[test]
    fn test_tabulated_has_no_row_cap() {
        let executor = memory_executor();
        let text = executor.tabulated("SELECT range AS n FROM range(1200)").unwrap();
        assert!(text.contains("1199"));
    }

    #[test]
    fn test_execute_dispatches_on_shape() {
        let executor = memory_executor();
        assert!(matches!(
            executor.execute("SELECT 1", ResultShape::Structured).unwrap(),
            QueryOutput::Structured(_)
        ));
        assert!(matches!(
            executor.execute("SELECT 1", ResultShape::Tabulated).unwrap(),
            QueryOutput::Text(_)
        ));
        assert!(executor.execute("SELEC", ResultShape::Tabulated).is_err());
        assert!(executor.execute("SELEC", ResultShape::Structured).is_ok());
    }

    #[test]
    fn test_value_conversion_from_engine() {
        let executor = memory_executor();
        let result = executor.structured(
            "SELECT NULL AS n, true AS b, 1.5::DOUBLE AS d, 12.50::DECIMAL(5,2) AS dec,
                    DATE '2024-03-01' AS day, [1, 2] AS list, 'abc'::BLOB AS blob",
        );
        let row = Json::Object(result.data[0].clone());

        assert_eq!(row["n"], Json::Null);
        assert_eq!(row["b"], json!(true));
        assert_eq!(row["d"], json!(1.5));
        assert_eq!(row["dec"], json!("12.50"));
        assert_eq!(row["day"], json!("2024-03-01"));
        assert_eq!(row["list"], json!([1, 2]));
        assert_eq!(row["blob"], json!("YWJj"));
    }

    #[test]
    fn test_huge_int_outside_i64_is_string() {
        assert_eq!(value_to_json(Value::HugeInt(42)), json!(42));
        assert_eq!(
            value_to_json(Value::HugeInt(i128::from(i64::MAX) + 1)),
            json!("9223372036854775808")
        );
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(value_to_json(Value::Double(f64::NAN)), Json::Null);
        assert_eq!(value_to_json(Value::Float(f32::INFINITY)), Json::Null);
    }

    #[test]
    fn test_time_units() {
        assert_eq!(to_micros(TimeUnit::Second, 2), 2_000_000);
        assert_eq!(to_micros(TimeUnit::Nanosecond, 5_000), 5);
        assert_eq!(
            value_to_json(Value::Time64(TimeUnit::Microsecond, 3_600_000_000)),
            json!("01:00:00")
        );
    }

    #[test]
    fn test_nested_and_interval_values_from_engine() {
        let executor = memory_executor();
        let result = executor.structured(
            "SELECT {'k': 1, 'tag': 'x'} AS st, INTERVAL 1 DAY AS iv, MAP {'a': 1} AS m,
                    [1, 2]::INTEGER[2] AS arr",
        );
        assert!(result.success, "{:?}", result.error);
        let row = Json::Object(result.data[0].clone());

        assert_eq!(row["st"], json!({"k": 1, "tag": "x"}));
        assert_eq!(row["iv"], json!("1 day"));
        assert_eq!(row["m"], json!({"a": 1}));
        assert_eq!(row["arr"], json!([1, 2]));
    }

    #[test]
    fn test_nested_values() {
        let fields = OrderedMap::from(vec![
            ("id".to_string(), Value::Int(3)),
            ("tags".to_string(), Value::List(vec![Value::Text("a".into())])),
        ]);
        assert_eq!(value_to_json(Value::Struct(fields)), json!({"id": 3, "tags": ["a"]}));

        let entries = OrderedMap::from(vec![
            (Value::Int(1), Value::Text("one".into())),
            (Value::Text("two".into()), Value::Null),
        ]);
        assert_eq!(value_to_json(Value::Map(entries)), json!({"1": "one", "two": null}));

        assert_eq!(value_to_json(Value::Array(vec![Value::Double(0.5)])), json!([0.5]));
        assert_eq!(value_to_json(Value::Union(Box::new(Value::BigInt(9)))), json!(9));
    }

    #[test]
    fn test_interval_text() {
        assert_eq!(interval_text(0, 1, 0), "1 day");
        assert_eq!(interval_text(0, 2, 0), "2 days");
        assert_eq!(interval_text(14, 3, 5_400_000_000_000), "1 year 2 months 3 days 01:30:00");
        assert_eq!(interval_text(0, 0, 0), "00:00:00");
        assert_eq!(interval_text(0, 0, -1_500_000_000), "-00:00:01.5");
        assert_eq!(interval_text(-1, 0, 0), "-1 month");
    }

    #[test]
    fn test_zoned_timestamp_keeps_offset() {
        let executor = memory_executor();
        let result = executor.structured(
            "SELECT TIMESTAMPTZ '2024-01-01 00:00:00+00' AS tz, TIMESTAMP '2024-01-01 00:00:00' AS ts",
        );
        assert!(result.success, "{:?}", result.error);

        assert_eq!(result.data[0]["tz"], json!("2024-01-01 00:00:00+00"));
        assert_eq!(result.data[0]["ts"], json!("2024-01-01 00:00:00"));
    }

    #[test]
    fn test_tabulated_headers_use_engine_types() {
        let executor = memory_executor();
        let text = executor
            .tabulated(
                "SELECT SUM(i) AS s, TIMESTAMPTZ '2024-01-01 00:00:00+00' AS tz FROM range(4) t(i)",
            )
            .unwrap();

        assert!(text.contains("HUGEINT"), "{text}");
        assert!(!text.contains("DECIMAL(38,0)"));
        assert!(text.contains("TIMESTAMP WITH TIME ZONE"), "{text}");
        assert!(text.contains("2024-01-01 00:00:00+00"));
    }

    #[test]
    fn test_structured_error_is_bare_engine_message() {
        let executor = memory_executor();
        let error = executor.structured("SELECT * FROM no_such_table").error.unwrap();
        assert!(!error.starts_with("Query execution failed"), "{error}");
        assert!(error.contains("no_such_table"));
    }

    #[test]
    fn test_failure_notes_missing_spreadsheet_reader() {
        let query = "SELECT * FROM read_xlsx('/data/book.xlsx')";
        let without = ExtensionStatus { spreadsheet: false, remote_fs: false };
        let with = ExtensionStatus { spreadsheet: true, remote_fs: false };

        assert_eq!(
            annotate_failure("Catalog Error", query, Some(without)),
            "Catalog Error (excel extension unavailable)"
        );
        assert_eq!(annotate_failure("Catalog Error", query, Some(with)), "Catalog Error");
        assert_eq!(annotate_failure("Catalog Error", query, None), "Catalog Error");
        assert_eq!(annotate_failure("Parser Error", "SELEC", Some(without)), "Parser Error");
    }

    #[test]
    fn test_spreadsheet_failure_reports_extension_state() {
        let executor = memory_executor();
        let result = executor.structured("SELECT * FROM read_xlsx('/no/such/book.xlsx')");
        assert!(!result.success);

        let error = result.error.unwrap();
        let spreadsheet = executor.manager().extensions().is_some_and(|s| s.spreadsheet);
        assert_eq!(error.ends_with("(excel extension unavailable)"), !spreadsheet, "{error}");
    }

    #[test]
    fn test_type_labels() {
        assert_eq!(type_label(&LogicalTypeHandle::from(LogicalTypeId::Bigint)), "BIGINT");
        assert_eq!(type_label(&LogicalTypeHandle::from(LogicalTypeId::Hugeint)), "HUGEINT");
        assert_eq!(type_label(&LogicalTypeHandle::decimal(18, 3)), "DECIMAL(18,3)");
        assert_eq!(type_label(&LogicalTypeHandle::from(LogicalTypeId::Varchar)), "VARCHAR");
        assert_eq!(
            type_label(&LogicalTypeHandle::from(LogicalTypeId::TimestampTZ)),
            "TIMESTAMP WITH TIME ZONE"
        );
    }
}
