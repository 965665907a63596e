use crate::models::{Book, Id, Observation, WritingRow};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

pub const WINDOW_DAYS: i64 = 7;

/// Builds one row per (day, book) over the trailing window ending at `today`.
///
/// Rows are ordered by day, then by roster order. Pairs with no observation
/// get zero words; observations for books outside the roster are ignored.
/// When several observations share a (day, book) key the last one wins.
pub fn compute_weekly_rows(
    books: &[Book],
    observations: &[Observation],
    today: NaiveDate,
) -> Vec<WritingRow> {
    if books.is_empty() {
        return Vec::new();
    }

    let mut lookup: HashMap<(NaiveDate, Id), u64> = HashMap::with_capacity(observations.len());
    for observation in observations {
        lookup.insert((observation.date, observation.book_id), observation.total_words);
    }

    let days = window(today);
    let mut rows = Vec::with_capacity(days.len() * books.len());
    for date in days {
        let display = display_date(date);
        for book in books {
            rows.push(WritingRow {
                date,
                display_date: display.clone(),
                book_title: book.title.clone(),
                words: lookup.get(&(date, book.id)).copied().unwrap_or(0),
            });
        }
    }

    rows
}

/// The window's days, oldest first.
pub fn window(today: NaiveDate) -> Vec<NaiveDate> {
    (0..WINDOW_DAYS)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect()
}

pub fn window_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(WINDOW_DAYS - 1)
}

pub fn display_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}
