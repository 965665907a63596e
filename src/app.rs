use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/chart.svg", get(handlers::get_chart_svg))
        .route("/api/books", get(handlers::list_books).post(handlers::create_book))
        .route(
            "/api/books/:id/chapters",
            get(handlers::list_chapters).post(handlers::create_chapter),
        )
        .route("/api/chapters/:id", put(handlers::update_chapter))
        .route("/api/chapters/:id/highlights", get(handlers::chapter_highlights))
        .route(
            "/api/books/:id/word-colors",
            get(handlers::list_word_colors).post(handlers::create_word_color),
        )
        .route("/api/word-colors/:id", put(handlers::update_word_color))
        .route("/api/observations", post(handlers::record_observation))
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/chart", get(handlers::get_chart))
        .route("/api/events", post(handlers::notify_change))
        .route("/api/featured", get(handlers::get_featured))
        .route("/api/featured/next", post(handlers::featured_next))
        .route("/api/featured/prev", post(handlers::featured_prev))
        .route("/api/featured/pause", post(handlers::featured_pause))
        .route("/api/featured/resume", post(handlers::featured_resume))
        .route("/api/featured/:index", post(handlers::featured_go_to))
        .with_state(state)
}
