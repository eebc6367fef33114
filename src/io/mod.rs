/// CSV and JSON result export.
pub mod export;
/// CSV price import.
pub mod prices;
