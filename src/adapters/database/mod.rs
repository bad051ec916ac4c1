//! Database Adapters
//!
//! Connectivity probes implementing `crate::ports::DatabaseProbe`.

pub mod tcp_probe;

pub use tcp_probe::TcpDatabaseProbe;
