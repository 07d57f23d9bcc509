// Provider response parsers

pub mod csv;
pub mod response;

pub use csv::{parse_csv, parse_csv_line};
pub use response::{parse_response, strip_code_fences, PARSE_SNIPPET_CHARS};
