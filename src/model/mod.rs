//! Core data types for lockfiles, findings, and scan results.
//!
//! This module contains the fundamental types used throughout fremen:
//!
//! - [`LockfileKind`] - One of the three recognized lockfile formats
//! - [`InfectedPackage`] - A `(name, version)` pair flagged by the database
//! - [`ScanResult`] - Findings for one project directory
//!
//! # Example
//!
//! ```
//! use fremen::{InfectedPackage, ScanResult};
//!
//! let result = ScanResult::new(
//!     "/work/app",
//!     vec!["package-lock.json".to_string()],
//!     vec![InfectedPackage::new("test-package", "1.0.0")],
//! );
//!
//! assert!(result.is_infected());
//! assert_eq!(result.infected_count(), 1);
//! ```

mod package;
mod result;

pub use package::*;
pub use result::*;
