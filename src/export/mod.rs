pub mod csv;

pub use csv::{to_csv, write_csv, CsvColumn, RecordField, EXPORT_COLUMNS, EXPORT_FILE_NAME};
