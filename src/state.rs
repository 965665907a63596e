use crate::carousel::Carousel;
use crate::models::AppData;
use crate::refresh::{ProgressView, RefreshGate};
use crate::ticker::Ticker;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub progress: Arc<Mutex<ProgressView>>,
    pub gate: Arc<RefreshGate>,
    pub carousel: Arc<Mutex<Carousel>>,
    pub carousel_ticker: Arc<Mutex<Ticker>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData, carousel_interval: Duration) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            progress: Arc::new(Mutex::new(ProgressView::default())),
            gate: Arc::new(RefreshGate::default()),
            carousel: Arc::new(Mutex::new(Carousel::default())),
            carousel_ticker: Arc::new(Mutex::new(Ticker::new("carousel", carousel_interval))),
        }
    }

    /// Starts rotating the featured book. Safe to call while already running.
    pub async fn resume_carousel(&self) {
        let data = Arc::clone(&self.data);
        let carousel = Arc::clone(&self.carousel);
        self.carousel_ticker.lock().await.start(move || {
            let data = Arc::clone(&data);
            let carousel = Arc::clone(&carousel);
            async move {
                let len = data.lock().await.books.len();
                carousel.lock().await.next(len);
            }
        });
    }

    pub async fn pause_carousel(&self) {
        self.carousel_ticker.lock().await.stop();
    }
}
