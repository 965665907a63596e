use crate::aggregate::{compute_weekly_rows, window_start};
use crate::chart::{LineChart, SvgSurface};
use crate::config::{CHART_HEIGHT, CHART_WIDTH};
use crate::models::{ChartData, Id, WritingRow};
use crate::state::AppState;
use crate::storage::fetch_progress_inputs;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Why a recompute was requested. The payload never narrows the work: every
/// event triggers a full recompute.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    InitialLoad,
    BookAdded { book_id: Id },
    ObservationWritten { book_id: Id, date: NaiveDate },
    External { payload: serde_json::Value },
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshToken(u64);

impl RefreshToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues increasing tokens so a slow recompute cannot overwrite the result
/// of one that was requested after it.
#[derive(Debug, Default)]
pub struct RefreshGate {
    latest: AtomicU64,
}

impl RefreshGate {
    pub fn issue(&self) -> RefreshToken {
        RefreshToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RefreshToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

/// Latest aggregation result and the chart drawn from it.
#[derive(Default)]
pub struct ProgressView {
    rows: Vec<WritingRow>,
    chart: Option<LineChart<SvgSurface>>,
}

impl ProgressView {
    pub fn rows(&self) -> &[WritingRow] {
        &self.rows
    }

    pub fn chart_data(&self) -> ChartData {
        self.chart
            .as_ref()
            .map(|chart| chart.data().clone())
            .unwrap_or_default()
    }

    pub fn svg(&self) -> Option<&str> {
        self.chart
            .as_ref()
            .and_then(|chart| chart.surface())
            .and_then(SvgSurface::svg)
    }

    /// Stores the rows and redraws. A chart that cannot be drawn is dropped
    /// and mounted again on the next apply; the rows are kept either way.
    pub fn apply(&mut self, rows: Vec<WritingRow>) {
        match self.chart.as_mut() {
            Some(chart) => {
                if let Err(err) = chart.update(&rows) {
                    warn!("chart update failed: {err}");
                    self.chart = None;
                }
            }
            None => match LineChart::mount(SvgSurface::new(CHART_WIDTH, CHART_HEIGHT), &rows) {
                Ok(chart) => self.chart = Some(chart),
                Err(err) => warn!("chart construction failed: {err}"),
            },
        }
        self.rows = rows;
    }

    pub fn teardown(&mut self) {
        if let Some(chart) = self.chart.as_mut() {
            chart.teardown();
        }
        self.chart = None;
    }
}

/// Re-reads the store, aggregates the window ending today, and applies the
/// result if no newer refresh was issued meanwhile. Returns the token and
/// whether the result was applied.
pub async fn refresh_progress(state: &AppState, event: ChangeEvent) -> (RefreshToken, bool) {
    let token = state.gate.issue();
    let today = Local::now().date_naive();
    debug!(token = token.value(), ?event, "refreshing progress");

    let (books, observations) = {
        let data = state.data.lock().await;
        fetch_progress_inputs(&data, window_start(today))
    };
    let rows = compute_weekly_rows(&books, &observations, today);

    let mut progress = state.progress.lock().await;
    if !state.gate.is_current(token) {
        info!(token = token.value(), "discarding superseded progress refresh");
        return (token, false);
    }
    progress.apply(rows);
    (token, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppData, Book, ObservationRecord};
    use std::time::Duration;

    fn row(words: u64) -> WritingRow {
        let date = NaiveDate::from_ymd_opt(2025, 12, 22).unwrap();
        WritingRow {
            date,
            display_date: "22 Dec 2025".to_string(),
            book_title: "BTL".to_string(),
            words,
        }
    }

    #[test]
    fn only_latest_token_is_current() {
        let gate = RefreshGate::default();
        let first = gate.issue();
        let second = gate.issue();
        assert!(first.value() < second.value());
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }

    #[test]
    fn apply_mounts_then_updates_chart() {
        let mut view = ProgressView::default();
        view.apply(vec![row(5)]);
        assert_eq!(view.chart_data().series[0].values, vec![5]);
        assert!(view.svg().is_some());

        view.apply(vec![row(8)]);
        assert_eq!(view.rows(), &[row(8)][..]);
        assert_eq!(view.chart_data().series[0].values, vec![8]);
    }

    #[test]
    fn teardown_drops_chart_but_keeps_rows() {
        let mut view = ProgressView::default();
        view.apply(vec![row(5)]);
        view.teardown();
        assert!(view.svg().is_none());
        assert_eq!(view.rows().len(), 1);
    }

    fn record_today(data: &mut AppData, book_id: Id, total_words: i64) {
        data.observations.push(ObservationRecord {
            date: Some(Local::now().date_naive().to_string()),
            book_id: Some(book_id),
            total_words: Some(total_words),
        });
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn superseded_refresh_is_discarded() {
        let mut data = AppData::default();
        let book_id = data.allocate_id();
        data.books.push(Book {
            id: book_id,
            title: "BTL".to_string(),
            description: String::new(),
        });
        record_today(&mut data, book_id, 100);
        let state = AppState::new(std::env::temp_dir(), data, Duration::ZERO);

        let held = state.progress.lock().await;
        let older = tokio::spawn({
            let state = state.clone();
            async move { refresh_progress(&state, ChangeEvent::Tick).await }
        });
        settle().await;

        record_today(&mut *state.data.lock().await, book_id, 900);
        let newer = tokio::spawn({
            let state = state.clone();
            async move { refresh_progress(&state, ChangeEvent::Tick).await }
        });
        settle().await;
        drop(held);

        let (older_token, older_applied) = older.await.unwrap();
        let (newer_token, newer_applied) = newer.await.unwrap();
        assert!(older_token.value() < newer_token.value());
        assert!(!older_applied);
        assert!(newer_applied);

        let progress = state.progress.lock().await;
        assert_eq!(progress.rows().last().map(|row| row.words), Some(900));
        assert_eq!(progress.chart_data().series[0].values.last(), Some(&900));
    }

    #[test]
    fn events_parse_from_tagged_json() {
        let event: ChangeEvent =
            serde_json::from_str(r#"{"kind":"observation_written","book_id":3,"date":"2025-12-22"}"#)
                .unwrap();
        assert!(matches!(event, ChangeEvent::ObservationWritten { book_id: 3, .. }));

        let missing: Result<ChangeEvent, _> = serde_json::from_str(r#"{"kind":"book_added"}"#);
        assert!(missing.is_err());
    }
}
