//! Scan gate library
//!
//! Decides which barcode detection from a camera pipeline is reported as the
//! scan: symbology filter, payload check, full containment in a scan zone and
//! a minimum interval between accepted scans.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
