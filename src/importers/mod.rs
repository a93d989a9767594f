// Import module - holdings snapshots exported by the ledger

pub mod holdings_csv;

use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::info;

use crate::holdings::Holding;

pub use holdings_csv::load_from_csv;

/// Import holdings from a snapshot file (only CSV is supported)
pub fn import_file<P: AsRef<Path>>(file_path: P) -> Result<Vec<Holding>> {
    let path = file_path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("File has no extension"))?
        .to_lowercase();

    info!("Importing holdings file: {:?} (type: {})", path, extension);

    match extension.as_str() {
        "csv" | "txt" => holdings_csv::parse_holdings_csv(path),
        _ => Err(anyhow!(
            "Unsupported file format: {}. Supported formats: .csv",
            extension
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unknown_extension() {
        let err = import_file("holdings.xlsx").unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn test_rejects_missing_extension() {
        assert!(import_file("holdings").is_err());
    }
}
