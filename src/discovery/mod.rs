//! Spreadsheet Structure Discovery
//!
//! Samples the sheets of a workbook through the query engine and summarizes each one:
//! inferred column types, distinct and non-null counts over the sample, total row count and
//! the sample rows themselves.
//!
//! Sheet names come from the workbook file itself ([`SheetCatalog`]), not from the engine,
//! so `*` can expand to every sheet. Rows are read with the spreadsheet extension's
//! `read_xlsx` table function with every cell as text.
//!
//! Failures are reported in the [`DiscoveryReport`], never returned as errors. A sheet whose
//! sample query fails carries its own error while the other sheets are still analyzed.

use calamine::Reader;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, error, warn};

use crate::engine::executor::QueryExecutor;
use crate::engine::{sql_literal, QueryResult, Record};
use crate::error::{GatewayError, Result};

pub mod infer;

pub use infer::{infer, InferredType};

/// Sheet filter selecting every sheet
pub const ALL_SHEETS: &str = "*";

/// Sample size used when the caller does not supply one
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

/// Alias of the count column in the row-count query
const COUNT_ALIAS: &str = "total";

/// Sheet-name enumeration from workbook metadata
pub trait SheetCatalog {
    /// Sheet names in workbook order
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>>;
}

/// Reads sheet names with `calamine` (xlsx, xlsm, xlsb, xls, ods)
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbookCatalog;

impl SheetCatalog for WorkbookCatalog {
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        let workbook = calamine::open_workbook_auto(path).map_err(|e| {
            GatewayError::invalid_input(format!("Failed to read workbook {}: {e}", path.display()))
        })?;
        Ok(workbook.sheet_names())
    }
}

/// Structured-shape query execution
pub trait StructuredQuery {
    fn run_structured(&self, query: &str) -> QueryResult;
}

impl StructuredQuery for QueryExecutor {
    fn run_structured(&self, query: &str) -> QueryResult {
        self.structured(query)
    }
}

/// Profile of one sampled column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub inferred_type: InferredType,
    /// Distinct string forms among the non-null sample values
    pub distinct_count: usize,
    pub non_null_count: usize,
}

/// Summary of one sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSchema {
    /// Key of this entry in the report's `sheets` map
    #[serde(skip)]
    pub sheet_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub columns: Vec<ColumnProfile>,

    /// Total rows in the sheet (not limited by the sample size)
    pub row_count: u64,

    #[serde(rename = "sampleData")]
    pub sample_rows: Vec<Record>,
}

impl SheetSchema {
    fn failed(sheet_name: &str, error: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            error: Some(error.into()),
            columns: Vec::new(),
            row_count: 0,
            sample_rows: Vec::new(),
        }
    }
}

/// Result of [`StructureDiscoverer::discover`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryReport {
    pub success: bool,

    /// File stem of the analyzed workbook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Sheets present in the workbook, reported when the requested one is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_sheets: Option<Vec<String>>,

    /// Serialized as an object keyed by sheet name, in workbook order
    #[serde(serialize_with = "sheets_by_name")]
    pub sheets: Vec<SheetSchema>,
}

impl DiscoveryReport {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            file_id: None,
            error: Some(error.into()),
            available_sheets: None,
            sheets: Vec::new(),
        }
    }

    /// Look up a sheet entry by name
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&SheetSchema> {
        self.sheets.iter().find(|s| s.sheet_name == name)
    }
}

fn sheets_by_name<S: Serializer>(
    sheets: &[SheetSchema],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(sheets.iter().map(|sheet| (&sheet.sheet_name, sheet)))
}

/// `read_xlsx` call reading `sheet` of `path` as text, tolerating malformed rows
#[must_use]
pub fn read_sheet_call(path: &str, sheet: &str) -> String {
    format!(
        "read_xlsx({}, sheet={}, all_varchar=true, ignore_errors=true)",
        sql_literal(path),
        sql_literal(sheet)
    )
}

/// Workbook profiler
pub struct StructureDiscoverer<C, Q> {
    catalog: C,
    engine: Q,
}

impl<Q: StructuredQuery> StructureDiscoverer<WorkbookCatalog, Q> {
    /// Discoverer reading sheet names with `calamine`
    pub const fn with_workbooks(engine: Q) -> Self {
        Self::new(WorkbookCatalog, engine)
    }
}

impl<C: SheetCatalog, Q: StructuredQuery> StructureDiscoverer<C, Q> {
    pub const fn new(catalog: C, engine: Q) -> Self {
        Self { catalog, engine }
    }

    /// Profile the sheets of `path` selected by `sheet_filter` (`*` for all)
    pub fn discover(&self, path: &Path, sheet_filter: &str, sample_rows: usize) -> DiscoveryReport {
        if !path.exists() {
            let missing = GatewayError::not_found(format!("File not found: {}", path.display()));
            return DiscoveryReport::failure(missing.message());
        }

        let available = match self.catalog.sheet_names(path) {
            Ok(names) => names,
            Err(e) => {
                error!("Error discovering workbook structure: {e}");
                return DiscoveryReport::failure(e.message());
            }
        };

        let targets: Vec<&String> = if sheet_filter == ALL_SHEETS {
            available.iter().collect()
        } else {
            available.iter().filter(|name| name.as_str() == sheet_filter).collect()
        };

        if targets.is_empty() {
            let missing = GatewayError::not_found(format!("Sheet '{sheet_filter}' not found"));
            return DiscoveryReport {
                available_sheets: Some(available.clone()),
                ..DiscoveryReport::failure(missing.message())
            };
        }

        let path_text = path.to_string_lossy().replace('\\', "/");
        let sheets = targets
            .into_iter()
            .map(|sheet| self.profile_sheet(&path_text, sheet, sample_rows))
            .collect();

        DiscoveryReport {
            success: true,
            file_id: path.file_stem().map(|stem| stem.to_string_lossy().into_owned()),
            error: None,
            available_sheets: None,
            sheets,
        }
    }

    fn profile_sheet(&self, path: &str, sheet: &str, sample_rows: usize) -> SheetSchema {
        let source = read_sheet_call(path, sheet);

        let sample =
            self.engine.run_structured(&format!("SELECT * FROM {source} LIMIT {sample_rows}"));
        if !sample.success {
            let message = sample.error.unwrap_or_else(|| "Sample query failed".to_string());
            warn!("Error analyzing sheet {sheet}: {message}");
            return SheetSchema::failed(sheet, message);
        }

        let columns = sample
            .columns
            .iter()
            .map(|name| profile_column(name, &sample.data))
            .collect();

        let count =
            self.engine.run_structured(&format!("SELECT COUNT(*) AS {COUNT_ALIAS} FROM {source}"));
        let row_count = if count.success {
            count
                .data
                .first()
                .and_then(|row| row.get(COUNT_ALIAS))
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0)
        } else {
            debug!("Row count for sheet {sheet} unavailable: {:?}", count.error);
            0
        };

        SheetSchema {
            sheet_name: sheet.to_string(),
            error: None,
            columns,
            row_count,
            sample_rows: sample.data,
        }
    }
}

fn profile_column(name: &str, rows: &[Record]) -> ColumnProfile {
    let values: Vec<serde_json::Value> = rows
        .iter()
        .filter_map(|row| row.get(name))
        .filter(|v| !v.is_null())
        .cloned()
        .collect();

    let distinct: HashSet<String> = values.iter().map(infer::string_form).collect();

    ColumnProfile {
        name: name.to_string(),
        inferred_type: infer(&values),
        distinct_count: distinct.len(),
        non_null_count: values.len(),
    }
}
