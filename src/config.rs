use chrono::NaiveDate;
use std::{env, path::PathBuf, time::Duration};
use tracing::warn;

pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Ăn Uống",
    "Di Chuyển",
    "Mua Sắm",
    "Giải Trí",
    "Hóa Đơn",
    "Sức Khỏe",
    "Giáo Dục",
    "Khác",
];

/// Category assigned to expenses that arrive without one.
pub const FALLBACK_CATEGORY: &str = "Khác";

pub const LOCALE: &str = "vi-VN";
pub const CURRENCY_SYMBOL: &str = "₫";

pub const DEFAULT_LOW_BUDGET_THRESHOLD: f64 = 50_000.0;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/expense-tracker.json";

/// Fallback end of the budget period when nothing is stored.
pub const DEFAULT_END_DATE: &str = "2025-12-31";

pub const EXPORT_VERSION: &str = "1.0";
pub const EXPORT_FILE_PREFIX: &str = "chi-tieu-";

pub const WEEKDAY_LABELS: [&str; 7] = ["T2", "T3", "T4", "T5", "T6", "T7", "CN"];

pub mod messages {
    pub const EMPTY_DESCRIPTION: &str = "Vui lòng nhập mô tả chi tiêu";
    pub const INVALID_AMOUNT: &str = "Số tiền phải là số lớn hơn 0";
    pub const EXPENSE_ADDED: &str = "Đã thêm chi tiêu";
    pub const EXPENSE_DELETED: &str = "Đã xóa chi tiêu";
    pub const EXPENSE_NOT_FOUND: &str = "Không tìm thấy chi tiêu";
    pub const IMPORT_SUCCESS: &str = "Nhập dữ liệu thành công";
    pub const IMPORT_INVALID: &str = "File không đúng định dạng";
    pub const SETTINGS_SAVED: &str = "Đã lưu cài đặt ngân sách";
    pub const NO_EXPENSES_DAY: &str = "Không có chi tiêu nào trong ngày này";
    pub const NO_EXPENSES_CATEGORY: &str = "Không có chi tiêu nào thuộc danh mục này";
    pub const OVER_BUDGET: &str = "Bạn đã vượt quá ngân sách!";
    pub const LOW_BUDGET: &str = "Ngân sách hằng ngày sắp cạn, hãy chi tiêu tiết kiệm";
    pub const STORAGE_UNAVAILABLE: &str = "Không thể lưu dữ liệu, thay đổi sẽ mất khi khởi động lại";
}

/// Runtime settings read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub port: u16,
    pub debounce: Duration,
    pub low_budget_threshold: f64,
    pub default_end_date: NaiveDate,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            port: DEFAULT_PORT,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            low_budget_threshold: DEFAULT_LOW_BUDGET_THRESHOLD,
            default_end_date: default_end_date(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_path: resolve_data_path(),
            port: parse_env("PORT").unwrap_or(defaults.port),
            debounce: parse_env("APP_DEBOUNCE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            low_budget_threshold: parse_env::<f64>("APP_LOW_BUDGET_THRESHOLD")
                .filter(|value| value.is_finite() && *value >= 0.0)
                .unwrap_or(defaults.low_budget_threshold),
            default_end_date: parse_env("APP_DEFAULT_END_DATE").unwrap_or(defaults.default_end_date),
        }
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from(DEFAULT_DATA_PATH)
}

pub fn default_end_date() -> NaiveDate {
    NaiveDate::parse_from_str(DEFAULT_END_DATE, "%Y-%m-%d").unwrap_or(NaiveDate::MAX)
}

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect()
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparseable {key}={raw:?}");
            None
        }
    }
}
