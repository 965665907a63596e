use crate::errors::AppError;
use crate::models::{
    AppData, Book, Chapter, ChapterResponse, ChartData, FeaturedResponse, Id, NewBookRequest,
    NewChapterRequest, Observation, ObservationRecord, ObservationRequest, RefreshResponse,
    UpdateChapterRequest, UpdateWordColorRequest, WordColor, WordColorRequest, WritingRow,
};
use crate::refresh::{refresh_progress, ChangeEvent};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::text::{count_chars, count_words, find_highlights, is_hex_color, plain_text, Highlight};
use crate::ui::{render_index, IndexView};
use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use chrono::{Local, NaiveDate};
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let books = state.data.lock().await.books.clone();
    let featured = featured_response(&state).await;
    let progress = state.progress.lock().await;
    Html(render_index(&IndexView {
        today: Local::now().date_naive(),
        books: &books,
        featured: featured.book.as_ref(),
        chart_svg: progress.svg(),
    }))
}

pub async fn list_books(State(state): State<AppState>) -> Json<Vec<Book>> {
    let data = state.data.lock().await;
    Json(data.books.clone())
}

pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<NewBookRequest>,
) -> Result<Json<Book>, AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }

    let book = {
        let mut data = state.data.lock().await;
        let mut next = data.clone();
        let book = Book {
            id: next.allocate_id(),
            title: title.to_string(),
            description: payload.description.unwrap_or_default().trim().to_string(),
        };
        next.books.push(book.clone());
        commit(&state, &mut data, next).await?;
        book
    };
    info!(book_id = book.id, title = %book.title, "book added");

    refresh_progress(&state, ChangeEvent::BookAdded { book_id: book.id }).await;
    Ok(Json(book))
}

pub async fn list_chapters(
    State(state): State<AppState>,
    Path(book_id): Path<Id>,
) -> Result<Json<Vec<ChapterResponse>>, AppError> {
    let data = state.data.lock().await;
    require_book(&data.books, book_id)?;
    let chapters = data
        .chapters
        .iter()
        .filter(|chapter| chapter.book_id == book_id)
        .map(to_chapter_response)
        .collect();
    Ok(Json(chapters))
}

pub async fn create_chapter(
    State(state): State<AppState>,
    Path(book_id): Path<Id>,
    Json(payload): Json<NewChapterRequest>,
) -> Result<Json<ChapterResponse>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("chapter name must not be empty"));
    }

    let mut data = state.data.lock().await;
    require_book(&data.books, book_id)?;
    let mut next = data.clone();
    let chapter = Chapter {
        id: next.allocate_id(),
        book_id,
        name: name.to_string(),
        content: payload.content.unwrap_or_default(),
        completed: false,
        archived: false,
    };
    next.chapters.push(chapter.clone());
    commit(&state, &mut data, next).await?;

    Ok(Json(to_chapter_response(&chapter)))
}

pub async fn update_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<Id>,
    Json(payload): Json<UpdateChapterRequest>,
) -> Result<Json<ChapterResponse>, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let updated = {
        let chapter = next
            .chapters
            .iter_mut()
            .find(|chapter| chapter.id == chapter_id)
            .ok_or_else(|| AppError::not_found(format!("chapter {chapter_id} not found")))?;
        if let Some(content) = payload.content {
            chapter.content = content;
        }
        if let Some(completed) = payload.completed {
            chapter.completed = completed;
        }
        if let Some(archived) = payload.archived {
            chapter.archived = archived;
        }
        chapter.clone()
    };
    commit(&state, &mut data, next).await?;

    Ok(Json(to_chapter_response(&updated)))
}

pub async fn record_observation(
    State(state): State<AppState>,
    Json(payload): Json<ObservationRequest>,
) -> Result<Json<Vec<WritingRow>>, AppError> {
    let date = NaiveDate::parse_from_str(payload.date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("date must be formatted YYYY-MM-DD"))?;
    let observation = Observation {
        date,
        book_id: payload.book_id,
        total_words: payload.total_words,
    };

    let record = ObservationRecord::try_from(&observation)
        .map_err(|_| AppError::bad_request("total_words is too large"))?;

    {
        let mut data = state.data.lock().await;
        require_book(&data.books, observation.book_id)?;
        let mut next = data.clone();
        next.observations.push(record);
        commit(&state, &mut data, next).await?;
    }

    refresh_progress(
        &state,
        ChangeEvent::ObservationWritten {
            book_id: observation.book_id,
            date,
        },
    )
    .await;
    let progress = state.progress.lock().await;
    Ok(Json(progress.rows().to_vec()))
}

pub async fn get_progress(State(state): State<AppState>) -> Json<Vec<WritingRow>> {
    let progress = state.progress.lock().await;
    Json(progress.rows().to_vec())
}

pub async fn get_chart(State(state): State<AppState>) -> Json<ChartData> {
    let progress = state.progress.lock().await;
    Json(progress.chart_data())
}

pub async fn get_chart_svg(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let progress = state.progress.lock().await;
    let svg = progress
        .svg()
        .ok_or_else(|| AppError::not_found("chart is not available"))?
        .to_string();
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

/// Accepts a tagged [`ChangeEvent`] or any other JSON payload; either way the
/// whole window is recomputed.
pub async fn notify_change(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Json<RefreshResponse> {
    let event = serde_json::from_value::<ChangeEvent>(payload.clone())
        .unwrap_or(ChangeEvent::External { payload });
    let (token, applied) = refresh_progress(&state, event).await;
    Json(RefreshResponse {
        token: token.value(),
        applied,
    })
}

pub async fn list_word_colors(
    State(state): State<AppState>,
    Path(book_id): Path<Id>,
) -> Result<Json<Vec<WordColor>>, AppError> {
    let data = state.data.lock().await;
    require_book(&data.books, book_id)?;
    Ok(Json(book_word_colors(&data.word_colors, book_id)))
}

pub async fn create_word_color(
    State(state): State<AppState>,
    Path(book_id): Path<Id>,
    Json(payload): Json<WordColorRequest>,
) -> Result<Json<WordColor>, AppError> {
    let word = payload.word.trim();
    if word.is_empty() {
        return Err(AppError::bad_request("word must not be empty"));
    }
    let color = payload.color.trim();
    if !is_hex_color(color) {
        return Err(AppError::bad_request("color must be formatted #rrggbb"));
    }

    let mut data = state.data.lock().await;
    require_book(&data.books, book_id)?;
    if data
        .word_colors
        .iter()
        .any(|entry| entry.book_id == book_id && entry.word.eq_ignore_ascii_case(word))
    {
        return Err(AppError::conflict("word already exists"));
    }

    let mut next = data.clone();
    let entry = WordColor {
        id: next.allocate_id(),
        book_id,
        word: word.to_string(),
        color: color.to_string(),
    };
    next.word_colors.push(entry.clone());
    commit(&state, &mut data, next).await?;

    Ok(Json(entry))
}

pub async fn update_word_color(
    State(state): State<AppState>,
    Path(entry_id): Path<Id>,
    Json(payload): Json<UpdateWordColorRequest>,
) -> Result<Json<WordColor>, AppError> {
    let color = payload.color.trim();
    if !is_hex_color(color) {
        return Err(AppError::bad_request("color must be formatted #rrggbb"));
    }

    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let updated = {
        let entry = next
            .word_colors
            .iter_mut()
            .find(|entry| entry.id == entry_id)
            .ok_or_else(|| AppError::not_found(format!("word color {entry_id} not found")))?;
        entry.color = color.to_string();
        entry.clone()
    };
    commit(&state, &mut data, next).await?;

    Ok(Json(updated))
}

pub async fn chapter_highlights(
    State(state): State<AppState>,
    Path(chapter_id): Path<Id>,
) -> Result<Json<Vec<Highlight>>, AppError> {
    let data = state.data.lock().await;
    let chapter = data
        .chapters
        .iter()
        .find(|chapter| chapter.id == chapter_id)
        .ok_or_else(|| AppError::not_found(format!("chapter {chapter_id} not found")))?;
    let words = book_word_colors(&data.word_colors, chapter.book_id);
    Ok(Json(find_highlights(&plain_text(&chapter.content), &words)))
}

pub async fn get_featured(State(state): State<AppState>) -> Json<FeaturedResponse> {
    Json(featured_response(&state).await)
}

pub async fn featured_next(State(state): State<AppState>) -> Json<FeaturedResponse> {
    let len = state.data.lock().await.books.len();
    state.carousel.lock().await.next(len);
    Json(featured_response(&state).await)
}

pub async fn featured_prev(State(state): State<AppState>) -> Json<FeaturedResponse> {
    let len = state.data.lock().await.books.len();
    state.carousel.lock().await.prev(len);
    Json(featured_response(&state).await)
}

pub async fn featured_go_to(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<FeaturedResponse>, AppError> {
    let len = state.data.lock().await.books.len();
    state
        .carousel
        .lock()
        .await
        .go_to(index, len)
        .ok_or_else(|| AppError::bad_request(format!("index {index} is out of range")))?;
    Ok(Json(featured_response(&state).await))
}

pub async fn featured_pause(State(state): State<AppState>) -> Json<FeaturedResponse> {
    state.pause_carousel().await;
    Json(featured_response(&state).await)
}

pub async fn featured_resume(State(state): State<AppState>) -> Json<FeaturedResponse> {
    state.resume_carousel().await;
    Json(featured_response(&state).await)
}

async fn featured_response(state: &AppState) -> FeaturedResponse {
    let books = state.data.lock().await.books.clone();
    let index = state.carousel.lock().await.current(books.len());
    let running = state.carousel_ticker.lock().await.is_running();
    FeaturedResponse {
        index,
        book: index.and_then(|index| books.get(index).cloned()),
        running,
    }
}

/// Writes `next` to disk and only then makes it the live library, so a failed
/// write leaves memory matching the file.
async fn commit(state: &AppState, live: &mut AppData, next: AppData) -> Result<(), AppError> {
    persist_data(&state.data_path, &next).await?;
    *live = next;
    Ok(())
}

fn require_book(books: &[Book], book_id: Id) -> Result<(), AppError> {
    if books.iter().any(|book| book.id == book_id) {
        Ok(())
    } else {
        Err(AppError::not_found(format!("book {book_id} not found")))
    }
}

fn book_word_colors(entries: &[WordColor], book_id: Id) -> Vec<WordColor> {
    entries
        .iter()
        .filter(|entry| entry.book_id == book_id)
        .cloned()
        .collect()
}

fn to_chapter_response(chapter: &Chapter) -> ChapterResponse {
    ChapterResponse {
        id: chapter.id,
        book_id: chapter.book_id,
        name: chapter.name.clone(),
        content: chapter.content.clone(),
        completed: chapter.completed,
        archived: chapter.archived,
        word_count: count_words(&chapter.content),
        char_count: count_chars(&chapter.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unwritable_state(data: AppData) -> AppState {
        // A directory cannot be overwritten as a file.
        AppState::new(std::env::temp_dir(), data, Duration::ZERO)
    }

    fn library_with_book() -> AppData {
        let mut data = AppData::default();
        let id = data.allocate_id();
        data.books.push(Book {
            id,
            title: "BTL".to_string(),
            description: String::new(),
        });
        data
    }

    #[tokio::test]
    async fn failed_write_leaves_books_untouched() {
        let state = unwritable_state(AppData::default());
        let result = create_book(
            State(state.clone()),
            Json(NewBookRequest {
                title: "Lost".to_string(),
                description: None,
            }),
        )
        .await;

        assert!(result.is_err());
        let data = state.data.lock().await;
        assert!(data.books.is_empty());
        assert_eq!(data.next_id, AppData::default().next_id);
    }

    #[tokio::test]
    async fn failed_write_leaves_observations_untouched() {
        let state = unwritable_state(library_with_book());
        let book_id = state.data.lock().await.books[0].id;
        let result = record_observation(
            State(state.clone()),
            Json(ObservationRequest {
                date: "2025-12-22".to_string(),
                book_id,
                total_words: 1500,
            }),
        )
        .await;

        assert!(result.is_err());
        assert!(state.data.lock().await.observations.is_empty());
    }

    #[tokio::test]
    async fn oversized_word_count_is_rejected_before_storing() {
        let state = unwritable_state(library_with_book());
        let book_id = state.data.lock().await.books[0].id;
        let result = record_observation(
            State(state.clone()),
            Json(ObservationRequest {
                date: "2025-12-22".to_string(),
                book_id,
                total_words: u64::MAX,
            }),
        )
        .await;

        let err = result.err().expect("oversized count must fail");
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert!(state.data.lock().await.observations.is_empty());
    }
}
