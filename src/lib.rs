// Barcode Catalog - Core Library
// Exposes ingestion, catalog and session for the CLI, the TUI, and tests

pub mod catalog;
pub mod config;
pub mod logging;
pub mod parser;
pub mod session;

// Re-export commonly used types
pub use catalog::{delete, format_price, Catalog, DeleteOutcome, Entry, Listing, LISTING_HEADER, NO_DATA};
pub use config::{LoggingConfig, Settings};
pub use parser::{
    detect_source, get_parser, ingest_rows, parse_price, range_rows, read_catalog,
    CatalogParser, CellValue, CsvParser, IngestError, IngestOptions, IngestReport,
    PriceError, RowWarning, SheetRow, SourceType, SpreadsheetParser,
};
pub use session::{fingerprint_file, LoadSummary, Session, SessionError, SourceFile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
