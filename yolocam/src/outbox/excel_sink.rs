//! EXCEL sink: decisions are appended as rows to a bucketed CSV (daily,
//! weekly, or monthly per `options`); on bucket rollover, older CSVs are
//! converted to `.xlsx` workbooks (§4.4).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use rust_xlsxwriter::Workbook;

use crate::decision::Decision;
use crate::error::{Result, YoloCamError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Daily,
    Weekly,
    Monthly,
}

impl Bucket {
    pub fn from_options(options: &str) -> Bucket {
        match options.to_lowercase().as_str() {
            "weekly" => Bucket::Weekly,
            "monthly" => Bucket::Monthly,
            _ => Bucket::Daily,
        }
    }

    fn bucket_key(&self, ts: DateTime<Utc>) -> String {
        match self {
            Bucket::Daily => ts.format("%Y-%m-%d").to_string(),
            Bucket::Weekly => format!("{}-W{:02}", ts.year(), ts.iso_week().week()),
            Bucket::Monthly => ts.format("%Y-%m").to_string(),
        }
    }
}

const HEADER: &[&str] = &[
    "timestamp", "plate", "direction", "score", "speed", "region", "uuid",
];

fn row(decision: &Decision) -> Vec<String> {
    vec![
        decision.timestamp.clone(),
        decision.plate.clone(),
        format!("{:?}", decision.direction),
        decision.score.to_string(),
        decision.speed.to_string(),
        decision.region.code.clone(),
        decision.uuid.to_string(),
    ]
}

/// Append one decision row to the CSV for its time bucket, creating the
/// header row if the file is new.
pub fn add_row(dir: &Path, bucket: Bucket, decision: &Decision, now: DateTime<Utc>) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| YoloCamError::io(dir, e))?;
    let path = dir.join(format!("{}.csv", bucket.bucket_key(now)));
    let is_new = !path.exists();

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| YoloCamError::io(&path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    if is_new {
        writer.write_record(HEADER)?;
    }
    writer.write_record(row(decision))?;
    writer.flush().map_err(|e| YoloCamError::io(&path, e))?;
    Ok(())
}

/// Convert every `.csv` in `dir` older than `current_bucket_key` into a
/// `.xlsx` workbook of the same stem, deleting the source CSV on success.
/// Returns the paths of newly written workbooks (for the email-notification
/// follow-up).
pub fn roll_over(dir: &Path, current_bucket_key: &str) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Ok(written),
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("csv") {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if stem == current_bucket_key {
            continue;
        }
        if let Ok(xlsx_path) = convert_to_xlsx(&path) {
            let _ = std::fs::remove_file(&path);
            written.push(xlsx_path);
        }
    }
    Ok(written)
}

fn convert_to_xlsx(csv_path: &Path) -> Result<PathBuf> {
    let mut reader = csv::Reader::from_path(csv_path)?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        for (col, field) in record.iter().enumerate() {
            sheet.write_string((row_idx + 1) as u32, col as u16, field)?;
        }
    }

    let xlsx_path = csv_path.with_extension("xlsx");
    workbook.save(&xlsx_path)?;
    Ok(xlsx_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Direction;
    use crate::reading::BBox;
    use std::collections::HashSet;

    fn sample() -> Decision {
        Decision {
            device_address: "cam0".into(),
            uuid: uuid::Uuid::new_v4(),
            timestamp: "2026-01-01T00:00:00Z".into(),
            plate: "ABC123".into(),
            direction: Direction::Front,
            score: 0.9,
            dscore: 0.9,
            image: String::new(),
            full_image: None,
            rectangle: BBox::default(),
            speed: 10.0,
            region: Default::default(),
            vehicle: None,
            candidates: vec![],
            pending: false,
            delete: false,
            index: 0,
            acked_by: HashSet::new(),
            dispatched: false,
        }
    }

    #[test]
    fn bucket_key_selection() {
        let ts = DateTime::parse_from_rfc3339("2026-03-05T10:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(Bucket::Daily.bucket_key(ts), "2026-03-05");
        assert_eq!(Bucket::Monthly.bucket_key(ts), "2026-03");
    }

    #[test]
    fn add_row_creates_header_once() {
        let dir = std::env::temp_dir().join(format!("yolocam-excel-test-{}", uuid::Uuid::new_v4()));
        let now = Utc::now();
        add_row(&dir, Bucket::Daily, &sample(), now).unwrap();
        add_row(&dir, Bucket::Daily, &sample(), now).unwrap();
        let path = dir.join(format!("{}.csv", Bucket::Daily.bucket_key(now)));
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 3);
        let _ = std::fs::remove_dir_all(dir);
    }
}
