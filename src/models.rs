use crate::utils::parse_amount;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: u64,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Input for a new expense. Category and date fall back to defaults when absent.
/// A missing description or an unreadable amount is left for validation to reject.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewExpense {
    #[serde(default)]
    pub description: String,
    #[serde(default = "unset_amount", deserialize_with = "lenient_amount")]
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

fn unset_amount() -> f64 {
    f64::NAN
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(raw) => parse_amount(&raw).unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

/// Partial update merged over an existing expense.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePatch {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSettings {
    pub total_budget: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BudgetSettings {
    pub fn new(total_budget: f64, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            total_budget,
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    /// The budget period, when both ends are set and start precedes end.
    pub fn period(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start < end => Some((start, end)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDocument {
    pub expenses: Vec<Expense>,
    pub categories: Vec<String>,
    pub settings: BudgetSettings,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(flatten)]
    pub document: PersistedDocument,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub count: usize,
    pub total: f64,
}

impl CategoryTotals {
    pub fn record(&mut self, amount: f64) {
        self.count += 1;
        self.total += amount;
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpenseSummary {
    pub by_category: BTreeMap<String, CategoryTotals>,
    pub by_day: BTreeMap<NaiveDate, CategoryTotals>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseQuery {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetForm {
    #[serde(default)]
    pub total_budget: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FilterForm {
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportForm {
    pub payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Ok,
    Error,
}

/// One-shot message shown on the next page render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub expenses: usize,
    pub categories: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub storage_available: bool,
    pub expenses: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_expense_reads_loose_amounts() {
        let typed: NewExpense = serde_json::from_value(json!({
            "description": "Bún chả",
            "amount": "45 000"
        }))
        .unwrap();
        assert_eq!(typed.amount, 45_000.0);

        let text: NewExpense = serde_json::from_value(json!({"description": "x", "amount": "abc"})).unwrap();
        assert!(text.amount.is_nan());

        let bare: NewExpense = serde_json::from_value(json!({})).unwrap();
        assert!(bare.description.is_empty());
        assert!(bare.amount.is_nan());
    }

    #[test]
    fn period_requires_both_dates_in_order() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 11).unwrap();

        assert_eq!(BudgetSettings::new(1.0, start, end).period(), Some((start, end)));
        assert_eq!(BudgetSettings::new(1.0, end, start).period(), None);
        assert_eq!(BudgetSettings::new(1.0, start, start).period(), None);

        let open = BudgetSettings {
            total_budget: 1.0,
            start_date: Some(start),
            end_date: None,
        };
        assert_eq!(open.period(), None);
    }

    #[test]
    fn expense_serializes_camel_case() {
        let expense = Expense {
            id: 1,
            description: "Phở".to_string(),
            amount: 45_000.0,
            category: "Ăn Uống".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            created_at: DateTime::parse_from_rfc3339("2025-01-05T08:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["date"], "2025-01-05");
        assert!(value.get("createdAt").is_some());
    }
}
