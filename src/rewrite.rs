//! Query rewriting for uploaded spreadsheets
//!
//! Tool callers refer to an uploaded workbook by file id. Before execution the query is
//! rewritten to read the file directly:
//!
//! - with a sheet: `FROM Sales` (bare, `"Sales"` or `'Sales'`) becomes
//!   `FROM read_xlsx('<path>', sheet='Sales', ...)`
//! - without a sheet: every `{{file}}` token becomes the file path

use regex::{Captures, Regex};
use std::path::Path;

use crate::discovery::read_sheet_call;
use crate::error::{GatewayError, Result};

/// Token replaced by the workbook path
pub const FILE_PLACEHOLDER: &str = "{{file}}";

/// Extension of uploaded workbooks
pub const WORKBOOK_EXTENSION: &str = "xlsx";

/// Path of the workbook with id `file_id`, always with `/` separators
#[must_use]
pub fn file_path_for(files_dir: &Path, file_id: &str) -> String {
    files_dir
        .join(format!("{file_id}.{WORKBOOK_EXTENSION}"))
        .to_string_lossy()
        .replace('\\', "/")
}

/// Replace every [`FILE_PLACEHOLDER`] in `query` with `path`
#[must_use]
pub fn substitute_file(query: &str, path: &str) -> String {
    query.replace(FILE_PLACEHOLDER, path)
}

/// Point `FROM <sheet>` clauses at the sheet of the workbook at `path`
///
/// `FROM` and the sheet name match case-insensitively. Other occurrences of the sheet name
/// (column aliases, string literals) are left alone.
pub fn rewrite_sheet_reference(query: &str, path: &str, sheet: &str) -> Result<String> {
    let name = regex::escape(sheet);
    let pattern = Regex::new(&format!(r#"(?i)\bFROM\s+(?:"{name}"|'{name}'|{name})(?P<tail>\W|$)"#))
        .map_err(|e| GatewayError::invalid_input(format!("Unusable sheet name {sheet:?}: {e}")))?;

    let source = read_sheet_call(path, sheet);
    let rewritten = pattern.replace_all(query, |caps: &Captures<'_>| {
        let tail = caps.name("tail").map_or("", |m| m.as_str());
        format!("FROM {source}{tail}")
    });

    Ok(rewritten.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PATH: &str = "/files/report.xlsx";

    fn call(sheet: &str) -> String {
        read_sheet_call(PATH, sheet)
    }

    #[test]
    fn test_file_path_for() {
        assert_eq!(file_path_for(Path::new("/app/excel_files"), "abc123"), "/app/excel_files/abc123.xlsx");
        assert_eq!(file_path_for(Path::new("/data/"), "x"), "/data/x.xlsx");
    }

    #[test]
    fn test_substitute_every_placeholder() {
        let query = "SELECT * FROM '{{file}}' UNION ALL SELECT * FROM '{{file}}'";
        assert_eq!(
            substitute_file(query, PATH),
            format!("SELECT * FROM '{PATH}' UNION ALL SELECT * FROM '{PATH}'")
        );
        assert_eq!(substitute_file("SELECT 1", PATH), "SELECT 1");
    }

    #[test]
    fn test_rewrite_bare_and_quoted_sheet() {
        for reference in ["Sales", "\"Sales\"", "'Sales'"] {
            let query = format!("SELECT * FROM {reference} LIMIT 3");
            assert_eq!(
                rewrite_sheet_reference(&query, PATH, "Sales").unwrap(),
                format!("SELECT * FROM {} LIMIT 3", call("Sales"))
            );
        }
    }

    #[test]
    fn test_rewrite_is_case_insensitive() {
        let rewritten = rewrite_sheet_reference("select * from sales", PATH, "Sales").unwrap();
        assert_eq!(rewritten, format!("select * FROM {}", call("Sales")));
    }

    #[test]
    fn test_rewrite_at_end_of_query() {
        let rewritten = rewrite_sheet_reference("SELECT count(*) FROM Sales", PATH, "Sales").unwrap();
        assert_eq!(rewritten, format!("SELECT count(*) FROM {}", call("Sales")));
    }

    #[test]
    fn test_rewrite_keeps_trailing_punctuation() {
        let rewritten = rewrite_sheet_reference("SELECT * FROM Sales;", PATH, "Sales").unwrap();
        assert_eq!(rewritten, format!("SELECT * FROM {};", call("Sales")));
    }

    #[test]
    fn test_rewrite_does_not_touch_prefix_matches() {
        let query = "SELECT * FROM SalesArchive";
        assert_eq!(rewrite_sheet_reference(query, PATH, "Sales").unwrap(), query);
    }

    #[test]
    fn test_rewrite_sheet_with_regex_metacharacters() {
        let query = r#"SELECT * FROM "Q1 (draft)+" WHERE x > 1"#;
        assert_eq!(
            rewrite_sheet_reference(query, PATH, "Q1 (draft)+").unwrap(),
            format!("SELECT * FROM {} WHERE x > 1", call("Q1 (draft)+"))
        );
    }

    #[test]
    fn test_rewrite_all_occurrences() {
        let query = "SELECT * FROM Sales s JOIN (SELECT * FROM Sales) t ON true";
        let rewritten = rewrite_sheet_reference(query, PATH, "Sales").unwrap();
        assert_eq!(rewritten.matches("read_xlsx(").count(), 2);
    }
}
