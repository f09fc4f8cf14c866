// 🏗️ Parser Framework - spreadsheet ingestion
// One pass over the first sheet: header skipped, col 0 = barcode, col 1 = price

use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceType - file format of the document being ingested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    Xlsx,
    Xlsm,
    Xlsb,
    Xls,
    Ods,
    Csv,
}

impl SourceType {
    pub const ALL: [SourceType; 6] = [
        SourceType::Xlsx,
        SourceType::Xlsm,
        SourceType::Xlsb,
        SourceType::Xls,
        SourceType::Ods,
        SourceType::Csv,
    ];

    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            SourceType::Xlsx => "Excel Workbook",
            SourceType::Xlsm => "Excel Macro-Enabled Workbook",
            SourceType::Xlsb => "Excel Binary Workbook",
            SourceType::Xls => "Excel 97-2003 Workbook",
            SourceType::Ods => "OpenDocument Spreadsheet",
            SourceType::Csv => "CSV",
        }
    }

    /// File extension (lowercase, no dot)
    pub fn extension(&self) -> &str {
        match self {
            SourceType::Xlsx => "xlsx",
            SourceType::Xlsm => "xlsm",
            SourceType::Xlsb => "xlsb",
            SourceType::Xls => "xls",
            SourceType::Ods => "ods",
            SourceType::Csv => "csv",
        }
    }
}

/// CellValue - what ingestion sees in a single cell
///
/// Absent and empty cells are represented as `None` by the row sources,
/// so there is no `Empty` variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    /// Booleans, error cells, ISO dates/durations
    Other(&'static str),
}

impl CellValue {
    /// Convert a calamine cell. Date cells keep their serial number.
    #[allow(unreachable_patterns)]
    pub fn from_data(data: &Data) -> Option<CellValue> {
        match data {
            Data::Empty => None,
            Data::Int(i) => Some(CellValue::Number(*i as f64)),
            Data::Float(f) => Some(CellValue::Number(*f)),
            Data::String(s) => Some(CellValue::Text(s.clone())),
            Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
            Data::Bool(_) => Some(CellValue::Other("boolean")),
            Data::DateTimeIso(_) => Some(CellValue::Other("date")),
            Data::DurationIso(_) => Some(CellValue::Other("duration")),
            Data::Error(_) => Some(CellValue::Other("error")),
            _ => Some(CellValue::Other("unknown")),
        }
    }

    /// Convert a CSV field. Empty fields count as absent.
    pub fn from_field(field: &[u8]) -> Option<CellValue> {
        if field.is_empty() {
            return None;
        }
        Some(CellValue::Text(String::from_utf8_lossy(field).into_owned()))
    }

    /// Barcode key for this cell, trimmed. `None` for cells that have no
    /// sensible text form.
    pub fn barcode_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => Some(s.trim().to_string()),
            // 4006381333931.0 → "4006381333931"
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Other(_) => None,
        }
    }
}

/// SheetRow - one row of the first sheet, only the two columns we read
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// Absolute row index in the sheet (0 = header)
    pub index: usize,
    pub barcode: Option<CellValue>,
    pub price: Option<CellValue>,
}

impl SheetRow {
    pub fn new(index: usize, barcode: Option<CellValue>, price: Option<CellValue>) -> Self {
        SheetRow {
            index,
            barcode,
            price,
        }
    }
}

/// IngestOptions - how row-level price failures are handled
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Abort on a reported price failure instead of substituting 0.0
    #[serde(default)]
    pub strict: bool,

    /// Report unsupported price cells (booleans, error cells...) the same
    /// way as malformed text. Off: they become 0.0 silently.
    #[serde(default)]
    pub warn_unsupported_cells: bool,
}

/// RowWarning - a price that could not be read and was replaced by 0.0
#[derive(Debug, Clone, PartialEq)]
pub struct RowWarning {
    /// 1-based row number as shown by spreadsheet applications
    pub line: usize,
    pub barcode: String,
    pub error: PriceError,
}

/// IngestReport - output of a successful ingestion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub catalog: Catalog,
    /// Data rows seen (header excluded)
    pub rows_read: usize,
    /// Data rows dropped because cell 0 or cell 1 was missing
    pub rows_skipped: usize,
    /// Unsupported price cells replaced by 0.0 without a warning
    pub silent_substitutions: usize,
    pub warnings: Vec<RowWarning>,
}

// ============================================================================
// ERRORS
// ============================================================================

/// PriceError - a price cell that could not be turned into a number
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceError {
    #[error("Invalid price format: {text}")]
    Malformed { text: String },

    #[error("Unsupported price cell: {kind}")]
    Unsupported { kind: &'static str },
}

impl PriceError {
    /// Value used in place of the unreadable price
    pub fn substitute(&self) -> f64 {
        0.0
    }

    /// Cell content for messages
    pub fn text(&self) -> String {
        match self {
            PriceError::Malformed { text } => text.clone(),
            PriceError::Unsupported { kind } => format!("<{}>", kind),
        }
    }

    fn is_reported(&self, options: &IngestOptions) -> bool {
        match self {
            PriceError::Malformed { .. } => true,
            PriceError::Unsupported { .. } => options.warn_unsupported_cells,
        }
    }
}

/// IngestError - file-level failures (and price failures in strict mode)
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file type: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to open spreadsheet: {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: calamine::Error,
    },

    #[error("No sheets found in {}", .path.display())]
    NoSheets { path: PathBuf },

    #[error("Failed to read first sheet of {}: {source}", .path.display())]
    Sheet {
        path: PathBuf,
        source: calamine::Error,
    },

    #[error("Failed to open file: {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse CSV record in {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Invalid price format on row {line}: {text}")]
    MalformedPrice { line: usize, text: String },
}

// ============================================================================
// PRICE PARSING
// ============================================================================

/// Parse a price cell.
///
/// Numbers pass through. Text is trimmed, an empty string is 0.0, and every
/// comma becomes a period before parsing ("1,50" → 1.5). Non-finite results
/// are treated as malformed.
pub fn parse_price(cell: &CellValue) -> Result<f64, PriceError> {
    match cell {
        CellValue::Number(n) => Ok(*n),
        CellValue::Text(raw) => {
            let text = raw.trim();
            if text.is_empty() {
                return Ok(0.0);
            }

            match text.replace(',', ".").parse::<f64>() {
                Ok(price) if price.is_finite() => Ok(price),
                _ => Err(PriceError::Malformed {
                    text: text.to_string(),
                }),
            }
        }
        CellValue::Other(kind) => Err(PriceError::Unsupported { kind }),
    }
}

// ============================================================================
// INGESTION
// ============================================================================

/// Fold a row sequence into a catalog.
///
/// Row 0 is the header. Rows missing either cell are skipped. Later
/// duplicates overwrite earlier ones. Row-level price failures never abort
/// unless `options.strict` is set; row source errors always do.
pub fn ingest_rows<I>(rows: I, options: &IngestOptions) -> Result<IngestReport, IngestError>
where
    I: IntoIterator<Item = Result<SheetRow, IngestError>>,
{
    let mut report = IngestReport::default();

    for row in rows {
        let row = row?;
        if row.index == 0 {
            continue;
        }
        report.rows_read += 1;

        let line = row.index + 1;
        let (Some(barcode_cell), Some(price_cell)) = (row.barcode, row.price) else {
            debug!(line, "skipping row with a missing cell");
            report.rows_skipped += 1;
            continue;
        };

        let Some(barcode) = barcode_cell.barcode_text() else {
            debug!(line, "skipping row with an unreadable barcode cell");
            report.rows_skipped += 1;
            continue;
        };

        let price = match parse_price(&price_cell) {
            Ok(price) => price,
            Err(err) if err.is_reported(options) => {
                if options.strict {
                    return Err(IngestError::MalformedPrice {
                        line,
                        text: err.text(),
                    });
                }
                warn!(line, barcode = %barcode, "Invalid price format: {}", err.text());
                let price = err.substitute();
                report.warnings.push(RowWarning {
                    line,
                    barcode: barcode.clone(),
                    error: err,
                });
                price
            }
            Err(err) => {
                report.silent_substitutions += 1;
                err.substitute()
            }
        };

        report.catalog.insert(barcode, price);
    }

    Ok(report)
}

/// Rows of a calamine range, addressed by absolute sheet position
pub fn range_rows(range: &Range<Data>) -> impl Iterator<Item = SheetRow> + '_ {
    let rows = match (range.start(), range.end()) {
        (Some(start), Some(end)) => start.0..=end.0,
        #[allow(clippy::reversed_empty_ranges)]
        _ => 1..=0,
    };

    rows.map(move |row| {
        SheetRow::new(
            row as usize,
            range.get_value((row, 0)).and_then(CellValue::from_data),
            range.get_value((row, 1)).and_then(CellValue::from_data),
        )
    })
}

// ============================================================================
// PARSERS
// ============================================================================

/// CatalogParser - turns one file format into an IngestReport
pub trait CatalogParser: Send + Sync {
    /// Parse a file and return the catalog it describes
    ///
    /// # Returns
    /// * `Ok(IngestReport)` - catalog plus row statistics
    /// * `Err(IngestError)` - the file could not be opened or read
    fn parse(&self, file_path: &Path, options: &IngestOptions) -> Result<IngestReport, IngestError>;

    /// Get the source type this parser handles
    fn source_type(&self) -> SourceType;
}

/// Spreadsheet Parser (xlsx, xlsm, xlsb, xls, ods)
pub struct SpreadsheetParser {
    source_type: SourceType,
}

impl SpreadsheetParser {
    pub fn new(source_type: SourceType) -> Self {
        SpreadsheetParser { source_type }
    }
}

impl CatalogParser for SpreadsheetParser {
    fn parse(&self, file_path: &Path, options: &IngestOptions) -> Result<IngestReport, IngestError> {
        let mut workbook = open_workbook_auto(file_path).map_err(|source| IngestError::Open {
            path: file_path.to_path_buf(),
            source,
        })?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| IngestError::NoSheets {
                path: file_path.to_path_buf(),
            })?
            .map_err(|source| IngestError::Sheet {
                path: file_path.to_path_buf(),
                source,
            })?;

        ingest_rows(range_rows(&range).map(Ok), options)
    }

    fn source_type(&self) -> SourceType {
        self.source_type
    }
}

/// CSV Parser
pub struct CsvParser;

impl CsvParser {
    pub fn new() -> Self {
        CsvParser
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogParser for CsvParser {
    fn parse(&self, file_path: &Path, options: &IngestOptions) -> Result<IngestReport, IngestError> {
        use csv::ReaderBuilder;

        let file = File::open(file_path).map_err(|source| IngestError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;

        // Header is row 0 like in a sheet, so the reader must not eat it
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let rows = reader.byte_records().enumerate().map(|(index, result)| {
            let record = result.map_err(|source| IngestError::Csv {
                path: file_path.to_path_buf(),
                source,
            })?;

            Ok(SheetRow::new(
                index,
                record.get(0).and_then(CellValue::from_field),
                record.get(1).and_then(CellValue::from_field),
            ))
        });

        ingest_rows(rows, options)
    }

    fn source_type(&self) -> SourceType {
        SourceType::Csv
    }
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Detect source type from the file extension (case-insensitive)
pub fn detect_source(file_path: &Path) -> Result<SourceType, IngestError> {
    let extension = file_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    SourceType::ALL
        .iter()
        .copied()
        .find(|source| source.extension() == extension)
        .ok_or_else(|| IngestError::UnsupportedFormat {
            path: file_path.to_path_buf(),
        })
}

/// Get appropriate parser for a source type
pub fn get_parser(source_type: SourceType) -> Box<dyn CatalogParser> {
    match source_type {
        SourceType::Csv => Box::new(CsvParser::new()),
        other => Box::new(SpreadsheetParser::new(other)),
    }
}

/// Detect the format, parse the file, and log the outcome
pub fn read_catalog(file_path: &Path, options: &IngestOptions) -> Result<IngestReport, IngestError> {
    let result = detect_source(file_path).and_then(|source| {
        debug!(format = source.name(), "parsing {}", file_path.display());
        get_parser(source).parse(file_path, options)
    });

    match &result {
        Ok(report) => info!(
            entries = report.catalog.len(),
            rows = report.rows_read,
            skipped = report.rows_skipped,
            warnings = report.warnings.len(),
            "ingested {}",
            file_path.display()
        ),
        Err(err) => error!("{}", err),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn text(s: &str) -> Option<CellValue> {
        Some(CellValue::Text(s.to_string()))
    }

    fn num(n: f64) -> Option<CellValue> {
        Some(CellValue::Number(n))
    }

    fn rows(rows: Vec<SheetRow>) -> impl Iterator<Item = Result<SheetRow, IngestError>> {
        rows.into_iter().map(Ok)
    }

    fn header() -> SheetRow {
        SheetRow::new(0, text("Barcode"), text("Price"))
    }

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    // ============================================================================
    // Price parsing
    // ============================================================================

    #[test]
    fn test_parse_price_numeric_cell() {
        assert_eq!(parse_price(&CellValue::Number(19.99)), Ok(19.99));
    }

    #[test]
    fn test_parse_price_comma_decimal() {
        assert_eq!(parse_price(&CellValue::Text("1,50".into())), Ok(1.5));
        assert_eq!(parse_price(&CellValue::Text(" 9,99 ".into())), Ok(9.99));
        assert_eq!(parse_price(&CellValue::Text("2.50".into())), Ok(2.5));
    }

    #[test]
    fn test_parse_price_blank_text_is_zero() {
        assert_eq!(parse_price(&CellValue::Text("   ".into())), Ok(0.0));
        assert_eq!(parse_price(&CellValue::Text(String::new())), Ok(0.0));
    }

    #[test]
    fn test_parse_price_malformed() {
        let err = parse_price(&CellValue::Text("abc".into())).unwrap_err();
        assert_eq!(err, PriceError::Malformed { text: "abc".into() });
        assert_eq!(err.substitute(), 0.0);
        assert_eq!(err.to_string(), "Invalid price format: abc");
    }

    #[test]
    fn test_parse_price_rejects_non_finite() {
        assert!(parse_price(&CellValue::Text("NaN".into())).is_err());
        assert!(parse_price(&CellValue::Text("inf".into())).is_err());
    }

    #[test]
    fn test_parse_price_thousands_separator_is_malformed() {
        // "1,234.50" → "1.234.50"
        assert!(parse_price(&CellValue::Text("1,234.50".into())).is_err());
    }

    #[test]
    fn test_parse_price_unsupported_cell() {
        let err = parse_price(&CellValue::Other("boolean")).unwrap_err();
        assert_eq!(err, PriceError::Unsupported { kind: "boolean" });
        assert_eq!(err.substitute(), 0.0);
    }

    // ============================================================================
    // Row ingestion
    // ============================================================================

    #[test]
    fn test_ingest_end_to_end_example() {
        let input = vec![
            header(),
            SheetRow::new(1, text("BC001"), text("2.50")),
            SheetRow::new(2, text("BC002"), num(3.0)),
            SheetRow::new(3, text("BC001"), text("9,99")),
        ];

        let report = ingest_rows(rows(input), &IngestOptions::default()).unwrap();

        assert_eq!(report.catalog.len(), 2);
        assert_eq!(report.catalog.get("BC001"), Some(9.99));
        assert_eq!(report.catalog.get("BC002"), Some(3.0));
        assert_eq!(report.rows_read, 3);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_ingest_skips_header_unconditionally() {
        // Header row that looks like data is still skipped
        let input = vec![
            SheetRow::new(0, text("BC000"), num(1.0)),
            SheetRow::new(1, text("BC001"), num(2.0)),
        ];

        let report = ingest_rows(rows(input), &IngestOptions::default()).unwrap();
        assert!(!report.catalog.contains("BC000"));
        assert_eq!(report.catalog.get("BC001"), Some(2.0));
    }

    #[test]
    fn test_ingest_only_header() {
        let report = ingest_rows(rows(vec![header()]), &IngestOptions::default()).unwrap();
        assert!(report.catalog.is_empty());
        assert_eq!(report.rows_read, 0);
    }

    #[test]
    fn test_ingest_skips_rows_with_missing_cells() {
        let input = vec![
            header(),
            SheetRow::new(1, text("BC001"), num(1.0)),
            SheetRow::new(2, text("BC002"), None),
            SheetRow::new(3, None, num(5.0)),
            SheetRow::new(4, text("BC004"), num(4.0)),
        ];

        let report = ingest_rows(rows(input), &IngestOptions::default()).unwrap();

        assert_eq!(report.catalog.len(), 2);
        assert_eq!(report.catalog.get("BC001"), Some(1.0));
        assert_eq!(report.catalog.get("BC004"), Some(4.0));
        assert_eq!(report.rows_skipped, 2);
        assert!(report.warnings.is_empty(), "skipped rows are not warnings");
    }

    #[test]
    fn test_ingest_trims_barcode() {
        let input = vec![header(), SheetRow::new(1, text("  BC001 \t"), num(1.0))];

        let report = ingest_rows(rows(input), &IngestOptions::default()).unwrap();
        assert_eq!(report.catalog.get("BC001"), Some(1.0));
    }

    #[test]
    fn test_ingest_accepts_empty_barcode_after_trim() {
        let input = vec![header(), SheetRow::new(1, text("   "), num(1.0))];

        let report = ingest_rows(rows(input), &IngestOptions::default()).unwrap();
        assert_eq!(report.catalog.get(""), Some(1.0));
    }

    #[test]
    fn test_ingest_numeric_barcode() {
        let input = vec![header(), SheetRow::new(1, num(4006381333931.0), num(1.25))];

        let report = ingest_rows(rows(input), &IngestOptions::default()).unwrap();
        assert_eq!(report.catalog.get("4006381333931"), Some(1.25));
    }

    #[test]
    fn test_ingest_malformed_price_continues() {
        let input = vec![
            header(),
            SheetRow::new(1, text("BC001"), text("abc")),
            SheetRow::new(2, text("BC002"), text("1,50")),
        ];

        let report = ingest_rows(rows(input), &IngestOptions::default()).unwrap();

        assert_eq!(report.catalog.get("BC001"), Some(0.0));
        assert_eq!(report.catalog.get("BC002"), Some(1.5));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].line, 2);
        assert_eq!(report.warnings[0].barcode, "BC001");
        assert_eq!(
            report.warnings[0].error,
            PriceError::Malformed { text: "abc".into() }
        );
    }

    #[test]
    fn test_ingest_unsupported_price_is_silent_by_default() {
        let input = vec![
            header(),
            SheetRow::new(1, text("BC001"), Some(CellValue::Other("boolean"))),
        ];

        let report = ingest_rows(rows(input), &IngestOptions::default()).unwrap();

        assert_eq!(report.catalog.get("BC001"), Some(0.0));
        assert!(report.warnings.is_empty());
        assert_eq!(report.silent_substitutions, 1);
    }

    #[test]
    fn test_ingest_unsupported_price_reported_when_unified() {
        let options = IngestOptions {
            warn_unsupported_cells: true,
            ..Default::default()
        };
        let input = vec![
            header(),
            SheetRow::new(1, text("BC001"), Some(CellValue::Other("error"))),
        ];

        let report = ingest_rows(rows(input), &options).unwrap();

        assert_eq!(report.catalog.get("BC001"), Some(0.0));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.silent_substitutions, 0);
    }

    #[test]
    fn test_ingest_strict_mode_aborts_on_malformed_price() {
        let options = IngestOptions {
            strict: true,
            ..Default::default()
        };
        let input = vec![
            header(),
            SheetRow::new(1, text("BC001"), num(1.0)),
            SheetRow::new(2, text("BC002"), text("twelve")),
        ];

        let err = ingest_rows(rows(input), &options).unwrap_err();
        match err {
            IngestError::MalformedPrice { line, text } => {
                assert_eq!(line, 3);
                assert_eq!(text, "twelve");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ingest_strict_mode_keeps_unsupported_silent() {
        let options = IngestOptions {
            strict: true,
            ..Default::default()
        };
        let input = vec![
            header(),
            SheetRow::new(1, text("BC001"), Some(CellValue::Other("boolean"))),
        ];

        let report = ingest_rows(rows(input), &options).unwrap();
        assert_eq!(report.catalog.get("BC001"), Some(0.0));
    }

    #[test]
    fn test_ingest_skips_unreadable_barcode_cell() {
        let input = vec![
            header(),
            SheetRow::new(1, Some(CellValue::Other("boolean")), num(1.0)),
            SheetRow::new(2, text("BC002"), num(2.0)),
        ];

        let report = ingest_rows(rows(input), &IngestOptions::default()).unwrap();
        assert_eq!(report.catalog.len(), 1);
        assert_eq!(report.rows_skipped, 1);
    }

    #[test]
    fn test_ingest_propagates_row_source_error() {
        let input: Vec<Result<SheetRow, IngestError>> = vec![
            Ok(header()),
            Err(IngestError::NoSheets {
                path: PathBuf::from("broken.xlsx"),
            }),
        ];

        assert!(ingest_rows(input, &IngestOptions::default()).is_err());
    }

    // ============================================================================
    // Calamine ranges
    // ============================================================================

    #[test]
    fn test_cell_value_from_data() {
        assert_eq!(CellValue::from_data(&Data::Empty), None);
        assert_eq!(CellValue::from_data(&Data::Int(3)), Some(CellValue::Number(3.0)));
        assert_eq!(CellValue::from_data(&Data::Float(19.99)), Some(CellValue::Number(19.99)));
        assert_eq!(
            CellValue::from_data(&Data::String("1,50".into())),
            Some(CellValue::Text("1,50".into()))
        );
        assert_eq!(CellValue::from_data(&Data::Bool(true)), Some(CellValue::Other("boolean")));
    }

    #[test]
    fn test_range_rows_end_to_end() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 1));
        range.set_value((0, 0), Data::String("Barcode".into()));
        range.set_value((0, 1), Data::String("Price".into()));
        range.set_value((1, 0), Data::String("BC001".into()));
        range.set_value((1, 1), Data::String("2.50".into()));
        range.set_value((2, 0), Data::String("BC002".into()));
        range.set_value((2, 1), Data::Int(3));
        range.set_value((3, 0), Data::String("BC001".into()));
        range.set_value((3, 1), Data::String("9,99".into()));

        let report = ingest_rows(range_rows(&range).map(Ok), &IngestOptions::default()).unwrap();

        assert_eq!(report.catalog.len(), 2);
        assert_eq!(report.catalog.get("BC001"), Some(9.99));
        assert_eq!(report.catalog.get("BC002"), Some(3.0));
    }

    #[test]
    fn test_range_rows_use_absolute_positions() {
        // Used area starts at B2: column A and row 1 are empty
        let mut range: Range<Data> = Range::new((1, 1), (2, 2));
        range.set_value((1, 1), Data::Float(10.0));
        range.set_value((2, 1), Data::Float(20.0));

        let collected: Vec<SheetRow> = range_rows(&range).collect();

        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].index, 1);
        assert_eq!(collected[0].barcode, None);
        assert_eq!(collected[0].price, Some(CellValue::Number(10.0)));

        let report = ingest_rows(collected.into_iter().map(Ok), &IngestOptions::default()).unwrap();
        assert!(report.catalog.is_empty());
        assert_eq!(report.rows_skipped, 2);
    }

    #[test]
    fn test_range_rows_empty_range() {
        let range: Range<Data> = Range::empty();
        assert_eq!(range_rows(&range).count(), 0);
    }

    // ============================================================================
    // Files
    // ============================================================================

    #[test]
    fn test_detect_source() {
        assert_eq!(detect_source(Path::new("prices.xlsx")).unwrap(), SourceType::Xlsx);
        assert_eq!(detect_source(Path::new("PRICES.XLS")).unwrap(), SourceType::Xls);
        assert_eq!(detect_source(Path::new("shop/prices.ods")).unwrap(), SourceType::Ods);
        assert_eq!(detect_source(Path::new("prices.csv")).unwrap(), SourceType::Csv);

        for source in SourceType::ALL {
            let path = format!("prices.{}", source.extension());
            assert_eq!(detect_source(Path::new(&path)).unwrap(), source);
        }
    }

    #[test]
    fn test_detect_source_unknown() {
        let result = detect_source(Path::new("prices.txt"));
        assert!(matches!(result, Err(IngestError::UnsupportedFormat { .. })));

        let result = detect_source(Path::new("prices"));
        assert!(matches!(result, Err(IngestError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_get_parser() {
        assert_eq!(get_parser(SourceType::Csv).source_type(), SourceType::Csv);
        assert_eq!(get_parser(SourceType::Ods).source_type(), SourceType::Ods);
    }

    #[test]
    fn test_csv_parser_end_to_end() {
        let file = write_temp(".csv", "Barcode,Price\nBC001,2.50\nBC002,3\nBC001,\"9,99\"\n");

        let report = CsvParser::new()
            .parse(file.path(), &IngestOptions::default())
            .unwrap();

        assert_eq!(report.catalog.len(), 2);
        assert_eq!(report.catalog.get("BC001"), Some(9.99));
        assert_eq!(report.catalog.get("BC002"), Some(3.0));
    }

    #[test]
    fn test_csv_parser_short_and_empty_fields() {
        let file = write_temp(".csv", "Barcode,Price\nBC001\nBC002,\n,4\nBC005,abc,extra\n");

        let report = CsvParser::new()
            .parse(file.path(), &IngestOptions::default())
            .unwrap();

        assert_eq!(report.catalog.len(), 1);
        assert_eq!(report.catalog.get("BC005"), Some(0.0));
        assert_eq!(report.rows_skipped, 3);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_read_catalog_is_idempotent() {
        let file = write_temp(".csv", "Barcode,Price\nBC001,\"1,5\"\nBC002,7\n");

        let first = read_catalog(file.path(), &IngestOptions::default()).unwrap();
        let second = read_catalog(file.path(), &IngestOptions::default()).unwrap();

        assert_eq!(first.catalog, second.catalog);
    }

    #[test]
    fn test_read_catalog_missing_file() {
        let result = read_catalog(Path::new("/nonexistent/prices.csv"), &IngestOptions::default());
        assert!(matches!(result, Err(IngestError::Io { .. })));

        let result = read_catalog(Path::new("/nonexistent/prices.xlsx"), &IngestOptions::default());
        assert!(matches!(result, Err(IngestError::Open { .. })));
    }

    #[test]
    fn test_spreadsheet_parser_rejects_invalid_workbook() {
        let file = write_temp(".xlsx", "this is not a zip archive");

        let result = SpreadsheetParser::new(SourceType::Xlsx).parse(file.path(), &IngestOptions::default());
        assert!(matches!(result, Err(IngestError::Open { .. })));
    }

    #[test]
    fn test_open_errors_include_cause() {
        let err = read_catalog(Path::new("/nonexistent/prices.csv"), &IngestOptions::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Failed to open file: /nonexistent/prices.csv: "));
        assert!(message.len() > "Failed to open file: /nonexistent/prices.csv: ".len());

        let file = write_temp(".xlsx", "this is not a zip archive");
        let err = read_catalog(file.path(), &IngestOptions::default()).unwrap_err();
        let prefix = format!("Failed to open spreadsheet: {}: ", file.path().display());
        assert!(err.to_string().starts_with(&prefix));
        assert!(err.to_string().len() > prefix.len());
    }

    /// Two-sheet workbook: the price list first, an unrelated sheet second
    fn write_workbook() -> tempfile::NamedTempFile {
        use rust_xlsxwriter::Workbook;

        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = Workbook::new();

        let prices = workbook.add_worksheet();
        prices.set_name("Prices").unwrap();
        prices.write_string(0, 0, "Barcode").unwrap();
        prices.write_string(0, 1, "Price").unwrap();
        prices.write_string(1, 0, "BC001").unwrap();
        prices.write_string(1, 1, "2.50").unwrap();
        prices.write_string(2, 0, "BC002").unwrap();
        prices.write_number(2, 1, 3.0).unwrap();
        prices.write_string(3, 0, "BC001").unwrap();
        prices.write_string(3, 1, "9,99").unwrap();
        prices.write_string(4, 0, " BC005 ").unwrap();
        prices.write_boolean(4, 1, true).unwrap();
        prices.write_string(5, 0, "BC006").unwrap();

        let other = workbook.add_worksheet();
        other.set_name("Archive").unwrap();
        other.write_string(0, 0, "Barcode").unwrap();
        other.write_string(0, 1, "Price").unwrap();
        other.write_string(1, 0, "OTHER").unwrap();
        other.write_number(1, 1, 42.0).unwrap();
        other.write_string(2, 0, "BC002").unwrap();
        other.write_number(2, 1, 100.0).unwrap();

        workbook.save(file.path()).unwrap();
        file
    }

    #[test]
    fn test_xlsx_file_reads_first_sheet_only() {
        let file = write_workbook();

        let report = read_catalog(file.path(), &IngestOptions::default()).unwrap();

        assert_eq!(report.catalog.len(), 3);
        assert_eq!(report.catalog.get("BC001"), Some(9.99));
        assert_eq!(report.catalog.get("BC002"), Some(3.0));
        assert_eq!(report.catalog.get("BC005"), Some(0.0));
        assert!(!report.catalog.contains("OTHER"));
        assert_eq!(report.rows_read, 5);
        assert_eq!(report.rows_skipped, 1);
        assert_eq!(report.silent_substitutions, 1);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_xlsx_file_boolean_price_reported_when_unified() {
        let file = write_workbook();
        let options = IngestOptions {
            warn_unsupported_cells: true,
            ..Default::default()
        };

        let report = read_catalog(file.path(), &options).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].line, 5);
        assert_eq!(report.warnings[0].barcode, "BC005");
        assert_eq!(
            report.warnings[0].error,
            PriceError::Unsupported { kind: "boolean" }
        );
    }
}
