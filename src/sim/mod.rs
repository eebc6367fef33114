/// Rule-based plant and battery controllers.
pub mod controller;
pub mod economics;
pub mod engine;
pub mod kpi;
/// Dispatch threshold from a target margin.
pub mod price_cap;
/// Battery dispatch engine.
pub mod storage;
pub mod sweep;
pub mod tolling;
pub mod types;
