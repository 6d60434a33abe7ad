use crate::calendar::{parse_month, CalendarMonth, CalendarView};
use crate::config::messages;
use crate::errors::{AppError, TrackerError};
use crate::modal::{CategoryFilter, DailyModal, ModalView};
use crate::models::{
    BudgetForm, BudgetSettings, CategoryForm, CategoryQuery, Expense, ExpenseForm, ExpensePatch,
    ExpenseQuery, ExpenseSummary, ExportDocument, FilterForm, HealthResponse, ImportForm,
    ImportResponse, MonthQuery, NewExpense, Notice, RangeQuery,
};
use crate::state::AppState;
use crate::stats::BudgetStats;
use crate::ui::render_page;
use crate::utils::{parse_amount, parse_optional_date};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderName, StatusCode},
    response::Redirect,
    Form, Json,
};
use chrono::NaiveDate;
use maud::Markup;
use std::time::Instant;
use tracing::warn;

pub async fn index(State(state): State<AppState>) -> Markup {
    let mut app = state.app.lock().await;
    render_page(&app.page_view())
}

pub async fn add_expense_form(
    State(state): State<AppState>,
    Form(form): Form<ExpenseForm>,
) -> Redirect {
    let mut app = state.app.lock().await;
    match app.add_expense(expense_from_form(&form)).await {
        Ok(_) => app.set_notice(Notice::ok(messages::EXPENSE_ADDED)),
        Err(err) => {
            app.set_notice(Notice::error(err.to_string()));
            app.retain_draft(form);
        }
    }
    Redirect::to("/")
}

pub async fn delete_expense_form(State(state): State<AppState>, Path(id): Path<u64>) -> Redirect {
    let mut app = state.app.lock().await;
    match app.delete_expense(id).await {
        Ok(_) => app.set_notice(Notice::ok(messages::EXPENSE_DELETED)),
        Err(TrackerError::NotFound(_)) => app.set_notice(Notice::error(messages::EXPENSE_NOT_FOUND)),
        Err(err) => app.set_notice(Notice::error(err.to_string())),
    }
    Redirect::to("/")
}

pub async fn save_settings_form(
    State(state): State<AppState>,
    Form(form): Form<BudgetForm>,
) -> Redirect {
    let mut app = state.app.lock().await;
    app.update_settings(settings_from_form(&form)).await;
    app.set_notice(Notice::ok(messages::SETTINGS_SAVED));
    Redirect::to("/")
}

pub async fn add_category_form(
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Redirect {
    state.app.lock().await.add_category(&form.name).await;
    Redirect::to("/")
}

pub async fn remove_category_form(
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Redirect {
    state.app.lock().await.remove_category(&form.name).await;
    Redirect::to("/")
}

pub async fn calendar_prev(State(state): State<AppState>) -> Redirect {
    state.app.lock().await.previous_month();
    Redirect::to("/")
}

pub async fn calendar_next(State(state): State<AppState>) -> Redirect {
    state.app.lock().await.next_month();
    Redirect::to("/")
}

pub async fn calendar_today(State(state): State<AppState>) -> Redirect {
    state.app.lock().await.current_month();
    Redirect::to("/")
}

pub async fn open_day(State(state): State<AppState>, Path(date): Path<NaiveDate>) -> Redirect {
    state.app.lock().await.show_day(date, CategoryFilter::All);
    Redirect::to("/")
}

pub async fn filter_day(State(state): State<AppState>, Form(form): Form<FilterForm>) -> Redirect {
    state
        .app
        .lock()
        .await
        .filter_day(CategoryFilter::parse(Some(form.category.as_str())));
    Redirect::to("/")
}

pub async fn close_day(State(state): State<AppState>) -> Redirect {
    state.app.lock().await.hide_day();
    Redirect::to("/")
}

pub async fn export_download(
    State(state): State<AppState>,
) -> ([(HeaderName, String); 1], Json<ExportDocument>) {
    let app = state.app.lock().await;
    let disposition = format!("attachment; filename=\"{}\"", app.export_file_name());
    ([(header::CONTENT_DISPOSITION, disposition)], Json(app.export()))
}

pub async fn import_form(State(state): State<AppState>, Form(form): Form<ImportForm>) -> Redirect {
    let mut app = state.app.lock().await;
    match app.import(&form.payload).await {
        Ok(count) => app.set_notice(Notice::ok(format!(
            "{} ({count})",
            messages::IMPORT_SUCCESS
        ))),
        Err(err) => {
            warn!("import failed: {err}");
            app.set_notice(Notice::error(err.to_string()));
        }
    }
    Redirect::to("/")
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ExpenseQuery>,
) -> Json<Vec<Expense>> {
    let app = state.app.lock().await;
    let repo = app.repo();
    let selected: Vec<&Expense> = if let Some(date) = query.date {
        repo.by_date(date)
    } else if query.from.is_some() || query.to.is_some() {
        repo.by_range(query.from, query.to)
    } else {
        repo.all().iter().collect()
    };

    let filter = CategoryFilter::parse(query.category.as_deref());
    Json(
        selected
            .into_iter()
            .filter(|expense| filter.matches(expense))
            .cloned()
            .collect(),
    )
}

pub async fn create_expense(
    State(state): State<AppState>,
    payload: Result<Json<NewExpense>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let payload = json_body(payload)?;
    let expense = state.app.lock().await.add_expense(payload).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Expense>, AppError> {
    let app = state.app.lock().await;
    app.repo()
        .by_id(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| TrackerError::NotFound(id).into())
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    patch: Result<Json<ExpensePatch>, JsonRejection>,
) -> Result<Json<Expense>, AppError> {
    let patch = json_body(patch)?;
    let updated = state.app.lock().await.update_expense(id, patch).await?;
    updated.map(Json).ok_or_else(|| TrackerError::NotFound(id).into())
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    state.app.lock().await.delete_expense(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_stats(State(state): State<AppState>) -> Json<BudgetStats> {
    Json(state.app.lock().await.stats())
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<CalendarMonth>, AppError> {
    let app = state.app.lock().await;
    let Some(raw) = query.month else {
        return Ok(Json(app.calendar_month()));
    };
    let month = parse_month(&raw)
        .ok_or_else(|| AppError::bad_request("month must look like YYYY-MM"))?;
    Ok(Json(CalendarView::new(month).render(app.repo())))
}

pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    Query(query): Query<CategoryQuery>,
) -> Json<ModalView> {
    let app = state.app.lock().await;
    Json(DailyModal::preview(
        app.repo(),
        date,
        CategoryFilter::parse(query.category.as_deref()),
    ))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<ExpenseSummary>, AppError> {
    let range = match (query.from, query.to) {
        (Some(from), Some(to)) => Some((from, to)),
        (None, None) => None,
        _ => return Err(AppError::bad_request("from and to must be given together")),
    };
    Ok(Json(state.app.lock().await.repo().summary(range)))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.app.lock().await.repo().categories().to_vec())
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryForm>,
) -> (StatusCode, Json<Vec<String>>) {
    let mut app = state.app.lock().await;
    let status = if app.add_category(&payload.name).await {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(app.repo().categories().to_vec()))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<Vec<String>> {
    let mut app = state.app.lock().await;
    app.remove_category(&name).await;
    Json(app.repo().categories().to_vec())
}

pub async fn get_settings(State(state): State<AppState>) -> Json<BudgetSettings> {
    Json(state.app.lock().await.settings().clone())
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<BudgetSettings>,
) -> Json<BudgetSettings> {
    let mut app = state.app.lock().await;
    app.update_settings(settings).await;
    Json(app.settings().clone())
}

pub async fn draft_settings(
    State(state): State<AppState>,
    Json(form): Json<BudgetForm>,
) -> StatusCode {
    state
        .app
        .lock()
        .await
        .queue_settings(settings_from_form(&form), Instant::now());
    StatusCode::ACCEPTED
}

pub async fn import_json(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    let mut app = state.app.lock().await;
    let expenses = app.import(&body).await?;
    Ok(Json(ImportResponse {
        expenses,
        categories: app.repo().categories().len(),
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let app = state.app.lock().await;
    Json(HealthResponse {
        storage_available: app.storage_ok(),
        expenses: app.repo().len(),
    })
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        warn!("rejected request body: {rejection}");
        AppError::bad_request(rejection.body_text())
    })
}

fn expense_from_form(form: &ExpenseForm) -> NewExpense {
    NewExpense {
        description: form.description.clone(),
        // non-numeric input fails the amount check during validation
        amount: parse_amount(&form.amount).unwrap_or(f64::NAN),
        category: Some(form.category.clone()),
        date: parse_optional_date(&form.date),
    }
}

fn settings_from_form(form: &BudgetForm) -> BudgetSettings {
    BudgetSettings {
        total_budget: parse_amount(&form.total_budget).unwrap_or(0.0),
        start_date: parse_optional_date(&form.start_date),
        end_date: parse_optional_date(&form.end_date),
    }
}
