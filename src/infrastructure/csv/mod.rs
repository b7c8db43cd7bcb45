// ============================================================
// TABULAR INFRASTRUCTURE LAYER
// ============================================================
// CSV parsing with encoding detection, and Excel worksheet reading

mod csv_parser;
mod xlsx_reader;

pub use csv_parser::{decode, CsvParser};
pub use xlsx_reader::read_first_sheet;
