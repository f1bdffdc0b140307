pub mod config;
pub mod database;
pub mod error;
pub mod model;
pub mod output;
pub mod parser;
pub mod scanner;

pub use config::Config;
pub use database::VulnerabilityDatabase;
pub use error::{DatabaseError, ParseError, ScanError, ScanErrors};
pub use model::{InfectedPackage, LockfileKind, ScanResult};
pub use scanner::{execute_scan, ScanConfig, ScanOutcome, ScanTask};
