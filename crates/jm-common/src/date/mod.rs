pub mod precision;
pub mod range;

pub use precision::{parse_record_date, DateParseError, DatePrecision, ParsedDate};
pub use range::{merge_ranges, resolve_range, total_years, DateRange, DateRangeError};
