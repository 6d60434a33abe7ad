use crate::controller::ExpenseApp;
use std::{sync::Arc, time::Instant};
use tokio::{sync::Mutex, task::JoinHandle, time};

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<Mutex<ExpenseApp>>,
}

impl AppState {
    pub fn new(app: ExpenseApp) -> Self {
        Self {
            app: Arc::new(Mutex::new(app)),
        }
    }

    /// Commits debounced budget edits once their quiet period has passed.
    pub fn spawn_settings_flusher(&self) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let quiet = state.app.lock().await.config().debounce;
            let mut ticker = time::interval((quiet / 4).max(time::Duration::from_millis(10)));
            loop {
                ticker.tick().await;
                let mut app = state.app.lock().await;
                if app.has_pending_settings() {
                    app.flush_pending_settings(Instant::now()).await;
                }
            }
        })
    }
}
