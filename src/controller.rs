//! Session controller: owns the repository, budget settings and view state,
//! and persists after every mutation.

use crate::calendar::{CalendarMonth, CalendarView};
use crate::config::AppConfig;
use crate::errors::TrackerError;
use crate::modal::{CategoryFilter, DailyModal, ModalView};
use crate::models::{
    BudgetSettings, Expense, ExpenseForm, ExpensePatch, ExportDocument, NewExpense, Notice,
    PersistedDocument,
};
use crate::repository::ExpenseRepository;
use crate::stats::{build_stats_at, BudgetStats};
use crate::storage::{export_file_name, JsonStore};
use crate::utils::Debouncer;
use chrono::{Local, NaiveDate, Utc};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything the page needs for one render.
#[derive(Debug, Clone)]
pub struct PageView {
    pub today: NaiveDate,
    pub stats: BudgetStats,
    pub settings: BudgetSettings,
    pub categories: Vec<String>,
    pub calendar: CalendarMonth,
    pub modal: Option<ModalView>,
    pub notice: Option<Notice>,
    pub draft: Option<ExpenseForm>,
    pub storage_ok: bool,
    pub expense_count: usize,
    pub debounce_ms: u64,
}

#[derive(Debug)]
pub struct ExpenseApp {
    config: AppConfig,
    store: JsonStore,
    repo: ExpenseRepository,
    settings: BudgetSettings,
    calendar: CalendarView,
    modal: DailyModal,
    pending_settings: Debouncer<BudgetSettings>,
    notice: Option<Notice>,
    draft: Option<ExpenseForm>,
    storage_ok: bool,
    initialized: bool,
}

impl ExpenseApp {
    pub fn new(config: AppConfig) -> Self {
        let today = today();
        let store = JsonStore::new(config.data_path.clone(), config.default_end_date);
        let settings = store.default_document(today).settings;
        Self {
            pending_settings: Debouncer::new(config.debounce),
            store,
            repo: ExpenseRepository::default(),
            settings,
            calendar: CalendarView::new(today),
            modal: DailyModal::default(),
            notice: None,
            draft: None,
            storage_ok: true,
            initialized: false,
            config,
        }
    }

    /// Loads the stored document and resets every view. Later calls are no-ops.
    pub async fn init(&mut self) -> bool {
        if self.initialized {
            debug!("init called twice, ignoring");
            return false;
        }

        let today = today();
        let document = self.store.load_at(today).await;
        self.apply_document(document);
        self.calendar.go_to(today);
        self.modal = DailyModal::default();
        self.storage_ok = self.store.is_available().await;
        if !self.storage_ok {
            warn!("storage at {} is not writable", self.store.path().display());
        }
        self.initialized = true;

        info!(
            "loaded {} expenses and {} categories from {}",
            self.repo.len(),
            self.repo.categories().len(),
            self.store.path().display()
        );
        true
    }

    fn apply_document(&mut self, document: PersistedDocument) {
        self.repo.init(document.expenses, document.categories);
        self.settings = sanitize_settings(document.settings);
        self.pending_settings.cancel();
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn repo(&self) -> &ExpenseRepository {
        &self.repo
    }

    pub fn settings(&self) -> &BudgetSettings {
        &self.settings
    }

    pub fn calendar(&self) -> &CalendarView {
        &self.calendar
    }

    pub fn modal(&self) -> &DailyModal {
        &self.modal
    }

    pub fn storage_ok(&self) -> bool {
        self.storage_ok
    }

    pub fn document(&self) -> PersistedDocument {
        PersistedDocument {
            expenses: self.repo.all().to_vec(),
            categories: self.repo.categories().to_vec(),
            settings: self.settings.clone(),
            last_updated: None,
        }
    }

    pub fn stats(&self) -> BudgetStats {
        self.stats_at(today())
    }

    pub fn stats_at(&self, today: NaiveDate) -> BudgetStats {
        build_stats_at(today, &self.settings, &self.repo, self.config.low_budget_threshold)
    }

    pub async fn add_expense(&mut self, data: NewExpense) -> Result<Expense, TrackerError> {
        let expense = self.repo.add(data)?;
        info!(
            "added expense {} ({} on {})",
            expense.id, expense.amount, expense.date
        );
        self.after_mutation().await;
        Ok(expense)
    }

    pub async fn update_expense(
        &mut self,
        id: u64,
        patch: ExpensePatch,
    ) -> Result<Option<Expense>, TrackerError> {
        let updated = self.repo.update(id, patch)?;
        if updated.is_some() {
            info!("updated expense {id}");
            self.after_mutation().await;
        }
        Ok(updated)
    }

    pub async fn delete_expense(&mut self, id: u64) -> Result<Expense, TrackerError> {
        let Some(expense) = self.repo.by_id(id).cloned() else {
            return Err(TrackerError::NotFound(id));
        };
        self.repo.delete(id);
        info!("deleted expense {id} from {}", expense.date);
        self.after_mutation().await;
        Ok(expense)
    }

    /// Replaces all data with the imported document. On error nothing changes.
    pub async fn import(&mut self, text: &str) -> Result<usize, TrackerError> {
        let document = self.store.import_document(text, today())?;
        self.apply_document(document);
        info!("imported {} expenses", self.repo.len());
        self.after_mutation().await;
        Ok(self.repo.len())
    }

    pub fn export(&self) -> ExportDocument {
        self.store.export_document(&self.document(), Utc::now())
    }

    pub fn export_file_name(&self) -> String {
        export_file_name(today())
    }

    /// Applies settings immediately and drops any queued edit.
    pub async fn update_settings(&mut self, settings: BudgetSettings) {
        self.pending_settings.cancel();
        self.commit_settings(settings).await;
    }

    /// Queues settings until the quiet period passes without another edit.
    pub fn queue_settings(&mut self, settings: BudgetSettings, now: Instant) {
        self.pending_settings.schedule(settings, now);
    }

    pub fn has_pending_settings(&self) -> bool {
        self.pending_settings.is_pending()
    }

    pub async fn flush_pending_settings(&mut self, now: Instant) -> bool {
        match self.pending_settings.take_ready(now) {
            Some(settings) => {
                self.commit_settings(settings).await;
                true
            }
            None => false,
        }
    }

    async fn commit_settings(&mut self, settings: BudgetSettings) {
        self.settings = sanitize_settings(settings);
        info!(
            "budget set to {} from {:?} to {:?}",
            self.settings.total_budget, self.settings.start_date, self.settings.end_date
        );
        self.persist().await;
    }

    pub async fn add_category(&mut self, name: &str) -> bool {
        let added = self.repo.add_category(name);
        if added {
            self.persist().await;
        }
        added
    }

    pub async fn remove_category(&mut self, name: &str) -> bool {
        let removed = self.repo.remove_category(name);
        if removed {
            self.persist().await;
        }
        removed
    }

    pub fn previous_month(&mut self) {
        self.calendar.previous_month();
    }

    pub fn next_month(&mut self) {
        self.calendar.next_month();
    }

    pub fn current_month(&mut self) {
        self.calendar.go_to_today();
    }

    pub fn calendar_month(&self) -> CalendarMonth {
        self.calendar.render(&self.repo)
    }

    pub fn show_day(&mut self, date: NaiveDate, filter: CategoryFilter) {
        self.modal.show(&self.repo, date, filter);
    }

    pub fn filter_day(&mut self, filter: CategoryFilter) {
        self.modal.filter_by_category(filter);
    }

    pub fn hide_day(&mut self) {
        self.modal.hide();
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Keeps rejected form input so the page can offer it again.
    pub fn retain_draft(&mut self, form: ExpenseForm) {
        self.draft = Some(form);
    }

    /// Builds the page and consumes the one-shot notice and draft.
    pub fn page_view(&mut self) -> PageView {
        let today = today();
        PageView {
            today,
            stats: self.stats_at(today),
            settings: self.settings.clone(),
            categories: self.repo.categories().to_vec(),
            calendar: self.calendar.render_at(&self.repo, today),
            modal: self.modal.view(),
            notice: self.notice.take(),
            draft: self.draft.take(),
            storage_ok: self.storage_ok,
            expense_count: self.repo.len(),
            debounce_ms: self.config.debounce.as_millis() as u64,
        }
    }

    /// Re-fetches an open day view so it matches the repository, then saves.
    async fn after_mutation(&mut self) {
        if self.modal.is_visible() {
            self.modal.refresh(&self.repo);
        }
        self.persist().await;
    }

    async fn persist(&mut self) {
        self.storage_ok = self.store.save(&self.document()).await;
    }
}

fn sanitize_settings(mut settings: BudgetSettings) -> BudgetSettings {
    if !settings.total_budget.is_finite() || settings.total_budget < 0.0 {
        settings.total_budget = 0.0;
    }
    settings
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
