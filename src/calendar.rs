//! Month grid with per-day spending totals.

use crate::repository::ExpenseRepository;
use crate::utils::month_title;
use chrono::{Datelike, Local, Months, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarCell {
    Blank,
    Day {
        date: NaiveDate,
        day: u32,
        count: usize,
        total: f64,
        has_expenses: bool,
        is_today: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    pub title: String,
    pub year: i32,
    pub month: u32,
    pub total: f64,
    pub cells: Vec<CalendarCell>,
}

impl CalendarMonth {
    pub fn day(&self, date: NaiveDate) -> Option<&CalendarCell> {
        self.cells.iter().find(|cell| match cell {
            CalendarCell::Day { date: cell_date, .. } => *cell_date == date,
            CalendarCell::Blank => false,
        })
    }
}

/// Tracks which month is on screen. Only the year and month are kept.
#[derive(Debug, Clone)]
pub struct CalendarView {
    displayed: NaiveDate,
}

impl CalendarView {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            displayed: first_of_month(today),
        }
    }

    pub fn month(&self) -> NaiveDate {
        self.displayed
    }

    pub fn set_month(&mut self, date: NaiveDate) {
        self.displayed = first_of_month(date);
    }

    pub fn previous_month(&mut self) {
        if let Some(previous) = self.displayed.checked_sub_months(Months::new(1)) {
            self.displayed = previous;
        }
    }

    pub fn next_month(&mut self) {
        if let Some(next) = self.displayed.checked_add_months(Months::new(1)) {
            self.displayed = next;
        }
    }

    pub fn go_to_today(&mut self) {
        self.go_to(Local::now().date_naive());
    }

    pub fn go_to(&mut self, today: NaiveDate) {
        self.set_month(today);
    }

    pub fn render(&self, repo: &ExpenseRepository) -> CalendarMonth {
        self.render_at(repo, Local::now().date_naive())
    }

    pub fn render_at(&self, repo: &ExpenseRepository, today: NaiveDate) -> CalendarMonth {
        let first = self.displayed;
        let leading = first.weekday().num_days_from_monday() as usize;
        let days = days_in_month(first);

        let mut cells = Vec::with_capacity(leading + days as usize);
        cells.extend(std::iter::repeat(CalendarCell::Blank).take(leading));

        let mut month_total = 0.0;
        for day in 1..=days {
            let Some(date) = first.with_day(day) else {
                continue;
            };
            let expenses = repo.by_date(date);
            let count = expenses.len();
            let total = ExpenseRepository::total(expenses);
            month_total += total;
            cells.push(CalendarCell::Day {
                date,
                day,
                count,
                total,
                has_expenses: count > 0,
                is_today: date == today,
            });
        }

        CalendarMonth {
            title: month_title(first),
            year: first.year(),
            month: first.month(),
            total: month_total,
            cells,
        }
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next) => (next - first).num_days() as u32,
        None => 31,
    }
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewExpense;
    use chrono::{DateTime, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add(repo: &mut ExpenseRepository, date: NaiveDate, amount: f64) {
        let now = DateTime::parse_from_rfc3339("2025-01-05T05:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        repo.add_at(
            NewExpense {
                description: "chi".to_string(),
                amount,
                category: None,
                date: Some(date),
            },
            now,
        )
        .unwrap();
    }

    #[test]
    fn grid_starts_on_monday() {
        // 2025-01-01 is a Wednesday
        let view = CalendarView::new(day(2025, 1, 20));
        let month = view.render_at(&ExpenseRepository::default(), day(2025, 1, 20));

        assert_eq!(month.title, "Tháng 1 năm 2025");
        assert_eq!(month.cells.len(), 2 + 31);
        assert_eq!(month.cells[0], CalendarCell::Blank);
        assert_eq!(month.cells[1], CalendarCell::Blank);
        assert!(matches!(month.cells[2], CalendarCell::Day { day: 1, .. }));
        assert!(matches!(
            month.day(day(2025, 1, 20)),
            Some(CalendarCell::Day { is_today: true, has_expenses: false, .. })
        ));
    }

    #[test]
    fn day_totals_match_repository() {
        let mut repo = ExpenseRepository::default();
        add(&mut repo, day(2025, 1, 5), 100_000.0);
        add(&mut repo, day(2025, 1, 5), 25_000.0);
        add(&mut repo, day(2025, 1, 9), 10_000.0);
        add(&mut repo, day(2025, 2, 1), 99.0);

        let month = CalendarView::new(day(2025, 1, 1)).render_at(&repo, day(2025, 3, 1));
        for cell in &month.cells {
            if let CalendarCell::Day { date, total, count, .. } = cell {
                assert_eq!(*total, ExpenseRepository::total(repo.by_date(*date)));
                assert_eq!(*count, repo.by_date(*date).len());
            }
        }
        assert!(matches!(
            month.day(day(2025, 1, 5)),
            Some(CalendarCell::Day { count: 2, has_expenses: true, .. })
        ));
        assert_eq!(month.total, 135_000.0);
    }

    #[test]
    fn navigation_wraps_years() {
        let mut view = CalendarView::new(day(2025, 1, 31));
        view.previous_month();
        assert_eq!(view.month(), day(2024, 12, 1));
        view.next_month();
        view.next_month();
        assert_eq!(view.month(), day(2025, 2, 1));

        view.set_month(day(2025, 12, 15));
        view.next_month();
        assert_eq!(view.month(), day(2026, 1, 1));

        view.go_to(day(2025, 6, 9));
        assert_eq!(view.month(), day(2025, 6, 1));
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(day(2024, 2, 10)), 29);
        assert_eq!(days_in_month(day(2025, 2, 10)), 28);
        assert_eq!(days_in_month(day(2025, 4, 1)), 30);
        assert_eq!(parse_month("2025-03"), Some(day(2025, 3, 1)));
        assert_eq!(parse_month("2025-13"), None);
    }
}
