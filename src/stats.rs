use crate::config::messages;
use crate::models::BudgetSettings;
use crate::repository::ExpenseRepository;
use chrono::{Local, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetWarning {
    None,
    OverBudget,
    LowBudget,
}

impl BudgetWarning {
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::OverBudget => Some(messages::OVER_BUDGET),
            Self::LowBudget => Some(messages::LOW_BUDGET),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStats {
    pub total_budget: f64,
    pub spent: f64,
    pub remaining: f64,
    pub days_remaining: i64,
    pub days_elapsed: i64,
    pub daily_allowance: f64,
    pub average_daily: f64,
    pub percent_used: f64,
    pub over_budget: bool,
    pub low_budget: bool,
    pub warning: BudgetWarning,
}

impl BudgetStats {
    pub fn neutral() -> Self {
        Self {
            total_budget: 0.0,
            spent: 0.0,
            remaining: 0.0,
            days_remaining: 0,
            days_elapsed: 0,
            daily_allowance: 0.0,
            average_daily: 0.0,
            percent_used: 0.0,
            over_budget: false,
            low_budget: false,
            warning: BudgetWarning::None,
        }
    }
}

pub fn build_stats(
    settings: &BudgetSettings,
    repo: &ExpenseRepository,
    low_budget_threshold: f64,
) -> BudgetStats {
    build_stats_at(Local::now().date_naive(), settings, repo, low_budget_threshold)
}

/// Budget metrics as of `today`. Settings without a valid period yield
/// [`BudgetStats::neutral`].
pub fn build_stats_at(
    today: NaiveDate,
    settings: &BudgetSettings,
    repo: &ExpenseRepository,
    low_budget_threshold: f64,
) -> BudgetStats {
    let Some((start, end)) = settings.period() else {
        return BudgetStats::neutral();
    };

    let total_budget = settings.total_budget.max(0.0);
    let spent = ExpenseRepository::total(repo.by_range(Some(start), Some(end)));
    let remaining = total_budget - spent;

    let days_remaining = ((end - today).num_days() + 1).max(0);
    let daily_allowance = if days_remaining > 0 {
        (remaining / days_remaining as f64).max(0.0)
    } else {
        0.0
    };

    let days_elapsed = (today.min(end) - start).num_days().max(0);
    let average_daily = if days_elapsed > 0 && spent > 0.0 {
        spent / days_elapsed as f64
    } else {
        0.0
    };

    let percent_used = if total_budget > 0.0 {
        spent / total_budget * 100.0
    } else {
        0.0
    };

    let over_budget = remaining < 0.0;
    let low_budget = daily_allowance > 0.0 && daily_allowance < low_budget_threshold;
    let warning = if over_budget {
        BudgetWarning::OverBudget
    } else if low_budget {
        BudgetWarning::LowBudget
    } else {
        BudgetWarning::None
    };

    BudgetStats {
        total_budget,
        spent,
        remaining,
        days_remaining,
        days_elapsed,
        daily_allowance,
        average_daily,
        percent_used,
        over_budget,
        low_budget,
        warning,
    }
}
