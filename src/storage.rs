use crate::errors::AppError;
use crate::models::{AppData, Book, Observation};
use chrono::NaiveDate;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{debug, error};

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/state.json"))
}

/// Missing or unreadable files yield an empty library, so the dashboard
/// degrades to "no data" instead of failing to start.
pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

/// The roster and the valid observations dated `since` or later, ordered by
/// date. Records sharing a date keep their stored order.
pub fn fetch_progress_inputs(data: &AppData, since: NaiveDate) -> (Vec<Book>, Vec<Observation>) {
    let mut observations: Vec<Observation> = data
        .observations
        .iter()
        .filter_map(|record| {
            let observation = record.validate();
            if observation.is_none() {
                debug!(?record, "skipping malformed observation");
            }
            observation
        })
        .filter(|observation| observation.date >= since)
        .collect();
    observations.sort_by_key(|observation| observation.date);

    (data.books.clone(), observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObservationRecord;

    fn record(date: &str, book_id: u64, total_words: i64) -> ObservationRecord {
        ObservationRecord {
            date: Some(date.to_string()),
            book_id: Some(book_id),
            total_words: Some(total_words),
        }
    }

    #[test]
    fn fetch_filters_sorts_and_skips_malformed() {
        let mut data = AppData::default();
        data.observations = vec![
            record("2025-12-22", 1, 30),
            record("2025-12-01", 1, 99),
            record("not a date", 1, 5),
            record("2025-12-20", 1, 10),
            record("2025-12-22", 1, 40),
        ];

        let since = NaiveDate::from_ymd_opt(2025, 12, 17).unwrap();
        let (_, observations) = fetch_progress_inputs(&data, since);
        let words: Vec<u64> = observations.iter().map(|o| o.total_words).collect();
        assert_eq!(words, vec![10, 30, 40]);
    }

    #[tokio::test]
    async fn missing_file_loads_default() {
        let path = std::env::temp_dir().join(format!("writing_progress_missing_{}.json", std::process::id()));
        let data = load_data(&path).await;
        assert!(data.books.is_empty());
        assert_eq!(data.next_id, 1);
    }

    #[tokio::test]
    async fn corrupt_file_loads_default() {
        let path = std::env::temp_dir().join(format!("writing_progress_corrupt_{}.json", std::process::id()));
        fs::write(&path, b"{not json").await.unwrap();
        let data = load_data(&path).await;
        assert!(data.observations.is_empty());
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn persisted_data_loads_back() {
        let path = std::env::temp_dir().join(format!("writing_progress_roundtrip_{}.json", std::process::id()));
        let mut data = AppData::default();
        let id = data.allocate_id();
        data.books.push(Book {
            id,
            title: "BTL".to_string(),
            description: String::new(),
        });
        persist_data(&path, &data).await.unwrap();

        let loaded = load_data(&path).await;
        assert_eq!(loaded.books, data.books);
        assert_eq!(loaded.next_id, 2);
        let _ = fs::remove_file(&path).await;
    }
}
