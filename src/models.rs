use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::num::TryFromIntError;

pub type Id = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: Id,
    pub book_id: Id,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub archived: bool,
}

/// A word-count measurement as it sits in the store. Every field is optional
/// because the file may be edited by hand; see [`ObservationRecord::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservationRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub book_id: Option<Id>,
    #[serde(default)]
    pub total_words: Option<i64>,
}

impl ObservationRecord {
    /// Returns `None` when the date is malformed or a field is missing.
    pub fn validate(&self) -> Option<Observation> {
        let date = NaiveDate::parse_from_str(self.date.as_deref()?.trim(), "%Y-%m-%d").ok()?;
        let total_words = u64::try_from(self.total_words?).ok()?;
        Some(Observation {
            date,
            book_id: self.book_id?,
            total_words,
        })
    }
}

/// Fails when the word count does not fit the store's signed field.
impl TryFrom<&Observation> for ObservationRecord {
    type Error = TryFromIntError;

    fn try_from(observation: &Observation) -> Result<Self, Self::Error> {
        Ok(Self {
            date: Some(observation.date.to_string()),
            book_id: Some(observation.book_id),
            total_words: Some(i64::try_from(observation.total_words)?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub date: NaiveDate,
    pub book_id: Id,
    pub total_words: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordColor {
    pub id: Id,
    pub book_id: Id,
    pub word: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppData {
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub observations: Vec<ObservationRecord>,
    #[serde(default)]
    pub word_colors: Vec<WordColor>,
    #[serde(default = "first_id")]
    pub next_id: Id,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            books: Vec::new(),
            chapters: Vec::new(),
            observations: Vec::new(),
            word_colors: Vec::new(),
            next_id: first_id(),
        }
    }
}

fn first_id() -> Id {
    1
}

impl AppData {
    pub fn allocate_id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    pub fn book(&self, id: Id) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }
}

/// One (day, book) point of the trailing window, zero-filled when nothing was
/// recorded. `date` is kept next to the display string so consumers can order
/// by calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingRow {
    pub date: NaiveDate,
    pub display_date: String,
    pub book_title: String,
    pub words: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<u64>,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Deserialize)]
pub struct NewBookRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewChapterRequest {
    pub name: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChapterRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub archived: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ObservationRequest {
    pub date: String,
    pub book_id: Id,
    pub total_words: u64,
}

#[derive(Debug, Deserialize)]
pub struct WordColorRequest {
    pub word: String,
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWordColorRequest {
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChapterResponse {
    pub id: Id,
    pub book_id: Id,
    pub name: String,
    pub content: String,
    pub completed: bool,
    pub archived: bool,
    pub word_count: usize,
    pub char_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeaturedResponse {
    pub index: Option<usize>,
    pub book: Option<Book>,
    pub running: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: u64,
    pub applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_with_bad_date_is_rejected() {
        let record = ObservationRecord {
            date: Some("22 Dec 2025".to_string()),
            book_id: Some(1),
            total_words: Some(10),
        };
        assert_eq!(record.validate(), None);
    }

    #[test]
    fn record_missing_fields_is_rejected() {
        let record = ObservationRecord {
            date: Some("2025-12-22".to_string()),
            book_id: None,
            total_words: Some(10),
        };
        assert_eq!(record.validate(), None);

        let negative = ObservationRecord {
            date: Some("2025-12-22".to_string()),
            book_id: Some(1),
            total_words: Some(-4),
        };
        assert_eq!(negative.validate(), None);
    }

    #[test]
    fn observation_round_trips_through_record() {
        let observation = Observation {
            date: NaiveDate::from_ymd_opt(2025, 12, 22).unwrap(),
            book_id: 4,
            total_words: 1500,
        };
        let record = ObservationRecord::try_from(&observation).unwrap();
        assert_eq!(record.validate(), Some(observation));
    }

    #[test]
    fn oversized_word_count_does_not_become_a_record() {
        let observation = Observation {
            date: NaiveDate::from_ymd_opt(2025, 12, 22).unwrap(),
            book_id: 4,
            total_words: u64::MAX,
        };
        assert!(ObservationRecord::try_from(&observation).is_err());
    }

    #[test]
    fn record_validates_into_observation() {
        let record = ObservationRecord {
            date: Some(" 2025-12-22 ".to_string()),
            book_id: Some(3),
            total_words: Some(1500),
        };
        let observation = record.validate().expect("valid record");
        assert_eq!(observation.date, NaiveDate::from_ymd_opt(2025, 12, 22).unwrap());
        assert_eq!(observation.book_id, 3);
        assert_eq!(observation.total_words, 1500);
    }

    #[test]
    fn ids_are_monotonic() {
        let mut data = AppData::default();
        assert_eq!(data.allocate_id(), 1);
        assert_eq!(data.allocate_id(), 2);
        assert_eq!(data.next_id, 3);
    }
}
