//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before any ballot operation
//! touches the environment. This is storage-level only; hash-chain
//! verification lives in `ballot-ledger`.

use std::path::Path;
use std::sync::Arc;

use heed::Env;

use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that we expect to exist in a valid ballot environment.
const EXPECTED_DATABASES: &[&str] = &[
    "roster",
    "registrations",
    "delegations",
    "delegation_index",
    "settings",
    "topics",
    "options",
    "votes",
    "vote_index",
    "meta",
];

/// Open each expected database and count its entries.
///
/// Read failures and missing databases are recorded in the report rather
/// than causing a hard error.
pub fn check_integrity(env: &Arc<Env>) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{db_name}': {e}")),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{db_name}' is missing")),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{db_name}': {e}")),
        }
    }

    Ok(report)
}

/// Check if a data directory looks valid before opening.
///
/// A missing or empty directory is a fresh start. A non-empty directory
/// without `data.mdb` suggests a wrong path or a damaged environment.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let mut entries = path
        .read_dir()
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    if entries.next().is_none() {
        return Ok(());
    }
    if !path.join("data.mdb").exists() {
        return Err(format!(
            "directory {} is not empty but data.mdb is missing",
            path.display()
        ));
    }
    Ok(())
}
