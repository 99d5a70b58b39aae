//! Ledger analysis pipeline.
//!
//! Loads and normalizes the export, computes the global reporting period and
//! partitions the rows by branch, returning everything the renderers need.

use std::path::Path;
use std::time::Instant;

use report_core::error::{IngestError, Result};
use report_core::models::{BranchGroup, LedgerTable, Period, ReportOptions};
use tracing::{info, warn};

use crate::aggregator::PeriodCalculator;
use crate::normalizer::normalize_table;
use crate::partition::partition_by_branch;
use crate::reader::load_table;

// ── Public types ──────────────────────────────────────────────────────────────

/// Counters gathered while analysing one ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisMetadata {
    pub rows_loaded: usize,
    /// Rows left out of every group because they have no branch code.
    pub rows_unassigned: usize,
    pub branches: usize,
    pub load_time_seconds: f64,
}

/// The complete output of [`analyze_ledger`].
#[derive(Debug, Clone)]
pub struct LedgerAnalysis {
    pub table: LedgerTable,
    /// Earliest to latest issue date over the whole ledger.
    pub period: Period,
    /// Ascending by branch code.
    pub groups: Vec<BranchGroup>,
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the ingestion half of the pipeline.
///
/// 1. Load the raw table from `source`.
/// 2. Check the branch column exists.
/// 3. Normalize fields.
/// 4. Compute the global period (fails when no row has a valid date).
/// 5. Partition by branch.
pub fn analyze_ledger(source: &Path, options: &ReportOptions) -> Result<LedgerAnalysis> {
    let started = Instant::now();
    let names = &options.columns;

    let raw = load_table(source)?;

    if !raw.has_column(&names.branch) {
        return Err(IngestError::MissingColumn {
            column: names.branch.clone(),
            path: source.to_path_buf(),
        }
        .into());
    }
    if !raw.has_column(&names.document_value) {
        warn!(
            "Column '{}' not found in {}; totals will be zero",
            names.document_value,
            source.display()
        );
    }

    let table = normalize_table(&raw, names)?;
    let period = PeriodCalculator::global_period(&table)?;
    let groups = partition_by_branch(&table);

    let assigned: usize = groups.iter().map(|g| g.rows.len()).sum();
    let metadata = AnalysisMetadata {
        rows_loaded: table.len(),
        rows_unassigned: table.len() - assigned,
        branches: groups.len(),
        load_time_seconds: started.elapsed().as_secs_f64(),
    };

    info!(
        "Analysed {} rows from {}: {} branches, period {} to {}",
        metadata.rows_loaded,
        source.display(),
        metadata.branches,
        period.start,
        period.end
    );

    Ok(LedgerAnalysis {
        table,
        period,
        groups,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use report_core::error::ReportError;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_ledger(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("pendencias.csv");
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(content);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_analyze_ledger_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = write_ledger(
            &dir,
            "Loja;Dt. Emissão;Vlr. Documento;Observações\n\
             5;01/03/2024;100,00;\n\
             12;15/02/2024;50,50;x\n\
             ;20/03/2024;1,00;\n\
             5;10/03/2024;0,50;\n",
        );

        let analysis = analyze_ledger(&path, &ReportOptions::default()).unwrap();

        assert_eq!(analysis.period.start, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(analysis.period.end, NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        let codes: Vec<&str> = analysis.groups.iter().map(|g| g.branch_code.as_str()).collect();
        assert_eq!(codes, vec!["05", "12"]);
        assert_eq!(analysis.metadata.rows_loaded, 4);
        assert_eq!(analysis.metadata.rows_unassigned, 1);
        assert_eq!(analysis.metadata.branches, 2);
    }

    #[test]
    fn test_missing_branch_column() {
        let dir = TempDir::new().unwrap();
        let path = write_ledger(&dir, "Dt. Emissão;Vlr. Documento\n01/03/2024;1,00\n");

        let err = analyze_ledger(&path, &ReportOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ReportError::Ingest(IngestError::MissingColumn { ref column, .. }) if column == "Loja"
        ));
    }

    #[test]
    fn test_no_valid_dates() {
        let dir = TempDir::new().unwrap();
        let path = write_ledger(&dir, "Loja;Dt. Emissão;Vlr. Documento\n5;;1,00\n6;abc;2,00\n");

        let err = analyze_ledger(&path, &ReportOptions::default()).unwrap_err();
        assert!(matches!(err, ReportError::NoValidDates));
    }

    #[test]
    fn test_missing_date_column_is_no_valid_dates() {
        let dir = TempDir::new().unwrap();
        let path = write_ledger(&dir, "Loja;Vlr. Documento\n5;1,00\n");

        let err = analyze_ledger(&path, &ReportOptions::default()).unwrap_err();
        assert!(matches!(err, ReportError::NoValidDates));
    }

    #[test]
    fn test_invalid_currency_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_ledger(&dir, "Loja;Dt. Emissão;Vlr. Documento\n5;01/03/2024;R$ 10\n");

        let err = analyze_ledger(&path, &ReportOptions::default()).unwrap_err();
        assert!(matches!(err, ReportError::Normalization(_)));
    }
}
