//! Daily expense list with category filter chips.

use crate::config::messages;
use crate::models::Expense;
use crate::repository::ExpenseRepository;
use crate::utils::format_date;
use chrono::NaiveDate;
use serde::Serialize;

/// Wire value of the "all" chip. Blank names are never stored as categories.
pub const ALL_CATEGORIES: &str = "";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "category", rename_all = "snake_case")]
pub enum CategoryFilter {
    All,
    Category(String),
}

impl CategoryFilter {
    /// Missing or blank input selects every category.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some(ALL_CATEGORIES) => Self::All,
            Some(category) => Self::Category(category.to_string()),
        }
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => expense.category == *category,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Category(category) => category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterChip {
    pub label: String,
    pub value: String,
    pub count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    NoExpenses,
    NoneInCategory,
}

impl EmptyState {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoExpenses => messages::NO_EXPENSES_DAY,
            Self::NoneInCategory => messages::NO_EXPENSES_CATEGORY,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModalView {
    pub date: NaiveDate,
    pub title: String,
    pub chips: Vec<FilterChip>,
    pub expenses: Vec<Expense>,
    pub total: f64,
    pub empty: Option<EmptyState>,
}

#[derive(Debug, Clone)]
pub struct DailyModal {
    date: Option<NaiveDate>,
    filter: CategoryFilter,
    expenses: Vec<Expense>,
    categories: Vec<String>,
    visible: bool,
}

impl Default for DailyModal {
    fn default() -> Self {
        Self {
            date: None,
            filter: CategoryFilter::All,
            expenses: Vec::new(),
            categories: Vec::new(),
            visible: false,
        }
    }
}

impl DailyModal {
    pub fn show(&mut self, repo: &ExpenseRepository, date: NaiveDate, filter: CategoryFilter) {
        self.expenses = repo.by_date(date).into_iter().cloned().collect();
        self.categories = repo.categories_on(date);
        self.date = Some(date);
        self.filter = filter;
        self.visible = true;
    }

    /// Re-filters the already fetched list.
    pub fn filter_by_category(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Re-fetches the last shown date with the current filter.
    pub fn refresh(&mut self, repo: &ExpenseRepository) {
        if let Some(date) = self.date {
            let filter = self.filter.clone();
            self.show(repo, date, filter);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn is_showing(&self, date: NaiveDate) -> bool {
        self.visible && self.date == Some(date)
    }

    /// Builds the view for `date` without touching any open modal.
    pub fn preview(repo: &ExpenseRepository, date: NaiveDate, filter: CategoryFilter) -> ModalView {
        let mut modal = Self::default();
        modal.show(repo, date, filter);
        modal.render(date)
    }

    pub fn view(&self) -> Option<ModalView> {
        if !self.visible {
            return None;
        }
        self.date.map(|date| self.render(date))
    }

    fn render(&self, date: NaiveDate) -> ModalView {
        let mut chips = Vec::with_capacity(self.categories.len() + 1);
        chips.push(FilterChip {
            label: "Tất cả".to_string(),
            value: ALL_CATEGORIES.to_string(),
            count: self.expenses.len(),
            active: self.filter == CategoryFilter::All,
        });
        for category in &self.categories {
            chips.push(FilterChip {
                label: category.clone(),
                value: category.clone(),
                count: self
                    .expenses
                    .iter()
                    .filter(|expense| expense.category == *category)
                    .count(),
                active: matches!(&self.filter, CategoryFilter::Category(selected) if selected == category),
            });
        }

        let expenses: Vec<Expense> = self
            .expenses
            .iter()
            .filter(|expense| self.filter.matches(expense))
            .cloned()
            .collect();

        let empty = if self.expenses.is_empty() {
            Some(EmptyState::NoExpenses)
        } else if expenses.is_empty() {
            Some(EmptyState::NoneInCategory)
        } else {
            None
        };

        ModalView {
            date,
            title: format!("Chi tiêu ngày {}", format_date(date)),
            chips,
            total: ExpenseRepository::total(&expenses),
            expenses,
            empty,
        }
    }
}
