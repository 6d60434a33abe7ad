//! In-memory store of expenses and the category list.

use crate::config::{default_categories, FALLBACK_CATEGORY};
use crate::errors::TrackerError;
use crate::models::{Expense, ExpensePatch, ExpenseSummary, NewExpense};
use crate::utils::{validate_expense, IdGenerator};
use chrono::{DateTime, Local, NaiveDate, Utc};

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    expenses: Vec<Expense>,
    categories: Vec<String>,
    ids: IdGenerator,
}

impl Default for ExpenseRepository {
    fn default() -> Self {
        Self {
            expenses: Vec::new(),
            categories: default_categories(),
            ids: IdGenerator::default(),
        }
    }
}

impl ExpenseRepository {
    /// Replaces all state, e.g. at startup or after an import.
    pub fn init(&mut self, expenses: Vec<Expense>, categories: Vec<String>) {
        self.categories.clear();
        for category in categories {
            self.add_category(&category);
        }
        for expense in &expenses {
            self.add_category(&expense.category);
        }

        self.ids.reset();
        for expense in &expenses {
            self.ids.observe(expense.id);
        }
        self.expenses = expenses;
    }

    pub fn add(&mut self, data: NewExpense) -> Result<Expense, TrackerError> {
        self.add_at(data, Utc::now())
    }

    pub fn add_at(&mut self, data: NewExpense, now: DateTime<Utc>) -> Result<Expense, TrackerError> {
        validate_expense(&data.description, data.amount)?;

        let category = data
            .category
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());
        let date = data
            .date
            .unwrap_or_else(|| now.with_timezone(&Local).date_naive());

        let expense = Expense {
            id: self.ids.next(now),
            description: data.description.trim().to_string(),
            amount: data.amount,
            category,
            date,
            created_at: now,
        };

        self.add_category(&expense.category);
        self.expenses.insert(0, expense.clone());
        Ok(expense)
    }

    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.expenses.len();
        self.expenses.retain(|expense| expense.id != id);
        self.expenses.len() != before
    }

    /// Merges `patch` into the expense with `id`. Returns `Ok(None)` when no
    /// such expense exists; an invalid merge leaves the record untouched.
    pub fn update(&mut self, id: u64, patch: ExpensePatch) -> Result<Option<Expense>, TrackerError> {
        let Some(index) = self.expenses.iter().position(|expense| expense.id == id) else {
            return Ok(None);
        };

        let mut merged = self.expenses[index].clone();
        if let Some(description) = patch.description {
            merged.description = description.trim().to_string();
        }
        if let Some(amount) = patch.amount {
            merged.amount = amount;
        }
        if let Some(category) = patch.category {
            let category = category.trim();
            merged.category = if category.is_empty() {
                FALLBACK_CATEGORY.to_string()
            } else {
                category.to_string()
            };
        }
        if let Some(date) = patch.date {
            merged.date = date;
        }

        validate_expense(&merged.description, merged.amount)?;

        self.add_category(&merged.category);
        self.expenses[index] = merged.clone();
        Ok(Some(merged))
    }

    pub fn all(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    pub fn by_id(&self, id: u64) -> Option<&Expense> {
        self.expenses.iter().find(|expense| expense.id == id)
    }

    pub fn by_date(&self, date: NaiveDate) -> Vec<&Expense> {
        self.expenses
            .iter()
            .filter(|expense| expense.date == date)
            .collect()
    }

    /// Inclusive on both ends; empty unless both bounds are given.
    pub fn by_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<&Expense> {
        let (Some(start), Some(end)) = (start, end) else {
            return Vec::new();
        };
        self.expenses
            .iter()
            .filter(|expense| expense.date >= start && expense.date <= end)
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<&Expense> {
        self.expenses
            .iter()
            .filter(|expense| expense.category == category)
            .collect()
    }

    pub fn total<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> f64 {
        expenses.into_iter().map(|expense| expense.amount).sum()
    }

    pub fn total_all(&self) -> f64 {
        Self::total(&self.expenses)
    }

    /// Distinct categories used on `date`, sorted by name.
    pub fn categories_on(&self, date: NaiveDate) -> Vec<String> {
        let mut categories: Vec<String> = self
            .by_date(date)
            .into_iter()
            .map(|expense| expense.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Count and total per category and per day, optionally limited to an
    /// inclusive date range.
    pub fn summary(&self, range: Option<(NaiveDate, NaiveDate)>) -> ExpenseSummary {
        let selected: Vec<&Expense> = match range {
            Some((start, end)) => self.by_range(Some(start), Some(end)),
            None => self.expenses.iter().collect(),
        };

        let mut summary = ExpenseSummary::default();
        for expense in selected {
            summary
                .by_category
                .entry(expense.category.clone())
                .or_default()
                .record(expense.amount);
            summary
                .by_day
                .entry(expense.date)
                .or_default()
                .record(expense.amount);
        }
        summary
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.categories.iter().any(|existing| existing == name) {
            return false;
        }
        self.categories.push(name.to_string());
        true
    }

    pub fn remove_category(&mut self, name: &str) -> bool {
        let before = self.categories.len();
        self.categories.retain(|existing| existing != name);
        self.categories.len() != before
    }
}
