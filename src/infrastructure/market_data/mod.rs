pub mod csv_price_source;
pub mod stooq;

pub use csv_price_source::{CsvPriceSource, parse_price_csv};
pub use stooq::StooqClient;
