use crate::config::{default_categories, messages, EXPORT_FILE_PREFIX, EXPORT_VERSION};
use crate::errors::TrackerError;
use crate::models::{BudgetSettings, Expense, ExportDocument, PersistedDocument};
use crate::utils::{date_key, parse_optional_date, validate_expense};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, warn};

/// JSON document store backed by a single file.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    default_end_date: NaiveDate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StampedDocument<'a> {
    expenses: &'a [Expense],
    categories: &'a [String],
    settings: &'a BudgetSettings,
    last_updated: DateTime<Utc>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>, default_end_date: NaiveDate) -> Self {
        Self {
            path: path.into(),
            default_end_date,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn default_document(&self, today: NaiveDate) -> PersistedDocument {
        PersistedDocument {
            expenses: Vec::new(),
            categories: default_categories(),
            settings: self.default_settings(today),
            last_updated: None,
        }
    }

    fn default_settings(&self, today: NaiveDate) -> BudgetSettings {
        BudgetSettings {
            total_budget: 0.0,
            start_date: Some(today),
            end_date: Some(self.default_end_date),
        }
    }

    pub async fn load(&self) -> PersistedDocument {
        self.load_at(Local::now().date_naive()).await
    }

    /// Reads the stored document, falling back to defaults when the file is
    /// missing or unreadable and healing any malformed fields.
    pub async fn load_at(&self, today: NaiveDate) -> PersistedDocument {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return self.default_document(today);
            }
            Err(err) => {
                error!("failed to read data file: {err}");
                return self.default_document(today);
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(root)) => self.coerce(root, today),
            Ok(_) => {
                warn!("data file root is not an object, using defaults");
                self.default_document(today)
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                self.default_document(today)
            }
        }
    }

    /// Writes the document with a fresh `lastUpdated`. Failures are logged and
    /// reported as `false`; the in-memory state stays authoritative.
    pub async fn save(&self, document: &PersistedDocument) -> bool {
        match self.try_save(document, Utc::now()).await {
            Ok(()) => true,
            Err(err) => {
                error!("failed to save data file {}: {err}", self.path.display());
                false
            }
        }
    }

    async fn try_save(&self, document: &PersistedDocument, now: DateTime<Utc>) -> Result<(), TrackerError> {
        let stamped = StampedDocument {
            expenses: &document.expenses,
            categories: &document.categories,
            settings: &document.settings,
            last_updated: now,
        };
        let payload = serde_json::to_vec_pretty(&stamped).map_err(std::io::Error::from)?;
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, payload).await?;
        Ok(())
    }

    /// Probes the store with a throwaway write and delete.
    pub async fn is_available(&self) -> bool {
        let probe = self.path.with_extension("probe");
        if let Some(parent) = probe.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            if fs::create_dir_all(parent).await.is_err() {
                return false;
            }
        }
        if fs::write(&probe, b"probe").await.is_err() {
            return false;
        }
        fs::remove_file(&probe).await.is_ok()
    }

    pub fn export_document(&self, document: &PersistedDocument, now: DateTime<Utc>) -> ExportDocument {
        ExportDocument {
            document: document.clone(),
            export_date: now,
            version: EXPORT_VERSION.to_string(),
        }
    }

    pub fn import_document(&self, text: &str, today: NaiveDate) -> Result<PersistedDocument, TrackerError> {
        let value: Value = serde_json::from_str(text).map_err(|err| {
            warn!("rejected import: {err}");
            TrackerError::import_format(messages::IMPORT_INVALID)
        })?;
        match value {
            Value::Object(root) => Ok(self.coerce(root, today)),
            _ => Err(TrackerError::import_format(messages::IMPORT_INVALID)),
        }
    }

    fn coerce(&self, mut root: Map<String, Value>, today: NaiveDate) -> PersistedDocument {
        let expenses = match root.remove("expenses") {
            Some(Value::Array(items)) => valid_expenses(items),
            Some(other) => {
                warn!("expenses is not an array ({other}), starting empty");
                Vec::new()
            }
            None => Vec::new(),
        };

        let categories = match root.remove("categories") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name),
                    _ => None,
                })
                .collect(),
            _ => default_categories(),
        };

        let defaults = self.default_settings(today);
        let settings = match root.remove("settings") {
            Some(Value::Object(fields)) => BudgetSettings {
                total_budget: fields
                    .get("totalBudget")
                    .and_then(number_field)
                    .filter(|budget| budget.is_finite() && *budget >= 0.0)
                    .unwrap_or(defaults.total_budget),
                start_date: fields
                    .get("startDate")
                    .and_then(date_field)
                    .or(defaults.start_date),
                end_date: fields
                    .get("endDate")
                    .and_then(date_field)
                    .or(defaults.end_date),
            },
            _ => defaults,
        };

        let last_updated = root
            .get("lastUpdated")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|stamp| stamp.with_timezone(&Utc));

        PersistedDocument {
            expenses,
            categories,
            settings,
            last_updated,
        }
    }
}

/// Keeps readable expenses that pass validation, first occurrence of each id wins.
fn valid_expenses(items: Vec<Value>) -> Vec<Expense> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Expense>(item) {
            Ok(expense) => Some(expense),
            Err(err) => {
                warn!("dropping unreadable expense: {err}");
                None
            }
        })
        .filter(|expense| match validate_expense(&expense.description, expense.amount) {
            Ok(()) => true,
            Err(err) => {
                warn!("dropping invalid expense {}: {err}", expense.id);
                false
            }
        })
        .filter(|expense| {
            let fresh = seen.insert(expense.id);
            if !fresh {
                warn!("dropping expense with duplicate id {}", expense.id);
            }
            fresh
        })
        .collect()
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("{EXPORT_FILE_PREFIX}{}.json", date_key(today))
}

fn number_field(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

fn date_field(value: &Value) -> Option<NaiveDate> {
    value.as_str().and_then(parse_optional_date)
}
