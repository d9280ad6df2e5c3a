//! CSV-file series store, one `<code>.csv` per instrument.

use crate::domain::error::FundwatchError;
use crate::domain::series::ValuationRecord;
use crate::ports::series_store::SeriesStore;
use std::fs;
use std::path::PathBuf;

pub struct CsvStore {
    base_path: PathBuf,
}

impl CsvStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{code}.csv"))
    }

    fn store_err(context: &str, e: impl std::fmt::Display) -> FundwatchError {
        FundwatchError::Store {
            reason: format!("{context}: {e}"),
        }
    }
}

impl SeriesStore for CsvStore {
    fn load(&self, code: &str) -> Result<Vec<ValuationRecord>, FundwatchError> {
        let path = self.csv_path(code);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| Self::store_err(&format!("failed to read {}", path.display()), e))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: ValuationRecord = result
                .map_err(|e| Self::store_err(&format!("CSV parse error in {code}.csv"), e))?;
            records.push(record);
        }
        records.sort_by_key(|r| r.date);
        Ok(records)
    }

    fn save(&self, code: &str, records: &[ValuationRecord]) -> Result<(), FundwatchError> {
        fs::create_dir_all(&self.base_path)
            .map_err(|e| Self::store_err("failed to create data directory", e))?;

        // Write to a sibling temp file then rename, so a crash mid-write
        // never leaves a truncated series behind.
        let path = self.csv_path(code);
        let tmp = self.base_path.join(format!("{code}.csv.tmp"));

        let mut wtr = csv::Writer::from_path(&tmp)
            .map_err(|e| Self::store_err(&format!("failed to open {}", tmp.display()), e))?;
        for record in records {
            wtr.serialize(record)
                .map_err(|e| Self::store_err(&format!("CSV write error for {code}"), e))?;
        }
        wtr.flush()
            .map_err(|e| Self::store_err(&format!("CSV flush error for {code}"), e))?;
        drop(wtr);

        fs::rename(&tmp, &path)
            .map_err(|e| Self::store_err(&format!("failed to replace {}", path.display()), e))?;
        Ok(())
    }

    fn invalidate(&self, code: &str) -> Result<(), FundwatchError> {
        let path = self.csv_path(code);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Self::store_err(&format!("failed to remove {}", path.display()), e))?;
        }
        Ok(())
    }
}
