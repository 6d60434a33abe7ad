use crate::calendar::{CalendarCell, CalendarMonth};
use crate::config::{messages, FALLBACK_CATEGORY, LOCALE, WEEKDAY_LABELS};
use crate::controller::PageView;
use crate::modal::ModalView;
use crate::models::{BudgetSettings, NoticeKind};
use crate::stats::{BudgetStats, BudgetWarning};
use crate::utils::{date_key, format_currency, format_number};
use maud::{html, Markup, PreEscaped, DOCTYPE};

pub fn render_page(view: &PageView) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(LOCALE) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Quản lý chi tiêu" }
                style { (PreEscaped(STYLES)) }
            }
            body {
                main.app {
                    header {
                        h1 { "Quản lý chi tiêu" }
                        p.subtitle { "Ghi lại từng khoản chi, theo dõi ngân sách theo ngày." }
                    }
                    @if let Some(notice) = &view.notice {
                        div.status data-type=(notice_kind(notice.kind)) { (notice.message) }
                    }
                    @if !view.storage_ok {
                        div.status data-type="error" { (messages::STORAGE_UNAVAILABLE) }
                    }
                    (stats_panel(&view.stats))
                    section.forms {
                        (expense_form(view))
                        (budget_form(&view.settings, view.debounce_ms))
                    }
                    (calendar_section(&view.calendar))
                    (data_controls(view.expense_count))
                }
                @if let Some(modal) = &view.modal {
                    (day_modal(modal))
                }
                script { (PreEscaped(SCRIPT)) }
            }
        }
    }
}

fn notice_kind(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::Ok => "ok",
        NoticeKind::Error => "error",
    }
}

fn stat(label: &str, key: &str, value: String, negative: bool) -> Markup {
    html! {
        div.stat {
            span.label { (label) }
            span.value.negative[negative] data-stat=(key) { (value) }
        }
    }
}

pub fn stats_panel(stats: &BudgetStats) -> Markup {
    let used = stats.percent_used.clamp(0.0, 100.0);
    html! {
        section.panel #stats {
            (stat("Ngân sách", "total_budget", format_currency(stats.total_budget), false))
            (stat("Đã chi", "spent", format_currency(stats.spent), false))
            (stat("Còn lại", "remaining", format_currency(stats.remaining), stats.over_budget))
            (stat("Số ngày còn lại", "days_remaining", stats.days_remaining.to_string(), false))
            (stat("Được chi mỗi ngày", "daily_allowance", format_currency(stats.daily_allowance), stats.low_budget))
            (stat("Trung bình mỗi ngày", "average_daily", format_currency(stats.average_daily), false))
        }
        div.progress title=(format!("{used:.0}%")) {
            div.progress-bar.over[stats.over_budget] style=(format!("width: {used:.1}%")) {}
        }
        @if let Some(message) = stats.warning.message() {
            div.warning data-type=(warning_kind(stats.warning)) { (message) }
        }
    }
}

fn warning_kind(warning: BudgetWarning) -> &'static str {
    match warning {
        BudgetWarning::OverBudget => "over",
        BudgetWarning::LowBudget => "low",
        BudgetWarning::None => "none",
    }
}

fn expense_form(view: &PageView) -> Markup {
    let draft = view.draft.clone().unwrap_or_default();
    let date = if draft.date.trim().is_empty() {
        date_key(view.today)
    } else {
        draft.date.clone()
    };
    html! {
        form.card method="post" action="/expenses" {
            h2 { "Thêm chi tiêu" }
            label {
                span { "Mô tả" }
                input type="text" name="description" value=(draft.description) required;
            }
            label {
                span { "Số tiền (₫)" }
                input type="number" name="amount" min="0" step="any" value=(draft.amount) required;
            }
            label {
                span { "Danh mục" }
                input type="text" name="category" list="category-list" placeholder=(FALLBACK_CATEGORY) value=(draft.category);
            }
            datalist #category-list {
                @for category in &view.categories {
                    option value=(category) {}
                }
            }
            label {
                span { "Ngày" }
                input type="date" name="date" value=(date);
            }
            button.btn-add type="submit" { "Thêm" }
        }
    }
}

fn budget_form(settings: &BudgetSettings, debounce_ms: u64) -> Markup {
    html! {
        form.card #budget-form method="post" action="/settings" data-debounce=(debounce_ms) {
            h2 { "Ngân sách" }
            label {
                span { "Tổng ngân sách (₫)" }
                input type="number" name="totalBudget" min="0" step="any" value=(settings.total_budget);
            }
            label {
                span { "Từ ngày" }
                input type="date" name="startDate" value=[settings.start_date.map(date_key)];
            }
            label {
                span { "Đến ngày" }
                input type="date" name="endDate" value=[settings.end_date.map(date_key)];
            }
            button.btn-sub type="submit" { "Lưu ngân sách" }
        }
    }
}

pub fn calendar_section(month: &CalendarMonth) -> Markup {
    html! {
        section.calendar #calendar {
            div.calendar-header {
                form method="post" action="/calendar/prev" {
                    button.nav type="submit" aria-label="Tháng trước" { "‹" }
                }
                div {
                    h2 { (month.title) }
                    p.subtitle { "Tổng tháng: " (format_currency(month.total)) }
                }
                div.nav-group {
                    form method="post" action="/calendar/today" {
                        button.nav type="submit" { "Hôm nay" }
                    }
                    form method="post" action="/calendar/next" {
                        button.nav type="submit" aria-label="Tháng sau" { "›" }
                    }
                }
            }
            div.grid {
                @for label in WEEKDAY_LABELS {
                    div.weekday { (label) }
                }
                @for cell in &month.cells {
                    @match cell {
                        CalendarCell::Blank => {
                            div.day.blank {}
                        },
                        CalendarCell::Day { date, day, count, total, has_expenses, is_today } => {
                            form.day-form method="post" action=(format!("/day/{}", date_key(*date))) {
                                button.day.has-expenses[*has_expenses].today[*is_today] type="submit" data-date=(date_key(*date)) {
                                    span.day-number { (day) }
                                    @if *has_expenses {
                                        span.day-total { (format_number(*total)) }
                                        span.day-count { (count) " khoản" }
                                    }
                                }
                            }
                        },
                    }
                }
            }
        }
    }
}

pub fn day_modal(modal: &ModalView) -> Markup {
    html! {
        div.modal-backdrop {
            div.modal role="dialog" aria-modal="true" data-date=(date_key(modal.date)) {
                div.modal-header {
                    h2 { (modal.title) }
                    form method="post" action="/modal/close" {
                        button.close type="submit" aria-label="Đóng" { "×" }
                    }
                }
                div.chips {
                    @for chip in &modal.chips {
                        form method="post" action="/modal/filter" {
                            input type="hidden" name="category" value=(chip.value);
                            button.chip.active[chip.active] type="submit" {
                                (chip.label) " (" (chip.count) ")"
                            }
                        }
                    }
                }
                @if let Some(empty) = modal.empty {
                    p.empty { (empty.message()) }
                } @else {
                    ul.expense-list {
                        @for expense in &modal.expenses {
                            li.expense data-id=(expense.id) {
                                div {
                                    strong { (expense.description) }
                                    span.category { (expense.category) }
                                }
                                span.amount { (format_currency(expense.amount)) }
                                form method="post" action=(format!("/expenses/{}/delete", expense.id)) {
                                    button.delete type="submit" { "Xóa" }
                                }
                            }
                        }
                    }
                    p.total { "Tổng: " (format_currency(modal.total)) }
                }
            }
        }
    }
}

fn data_controls(expense_count: usize) -> Markup {
    html! {
        section.card.data {
            h2 { "Dữ liệu" }
            p.hint { (expense_count) " khoản chi đã lưu." }
            div.data-actions {
                a.button href="/export" download { "Xuất JSON" }
                form #import-form method="post" action="/import" {
                    label.button {
                        "Nhập JSON"
                        input #import-file type="file" accept="application/json,.json" hidden;
                    }
                    textarea #import-payload name="payload" hidden {}
                }
            }
            form.inline method="post" action="/categories" {
                input type="text" name="name" placeholder="Danh mục mới";
                button type="submit" { "Thêm danh mục" }
            }
        }
    }
}

const STYLES: &str = r#"
:root {
  --bg-1: #f8f3e6;
  --bg-2: #f5d3a7;
  --ink: #2b2a28;
  --accent: #ff6b4a;
  --accent-2: #2f4858;
  --ok: #2d7a4b;
  --danger: #c63b2b;
  --card: rgba(255, 255, 255, 0.86);
  --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
}
* { box-sizing: border-box; }
body {
  margin: 0;
  min-height: 100vh;
  background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
    linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
  color: var(--ink);
  font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
  display: grid;
  place-items: center;
  padding: 32px 18px 48px;
}
.app {
  width: min(960px, 100%);
  background: var(--card);
  border-radius: 28px;
  box-shadow: var(--shadow);
  padding: 36px;
  display: grid;
  gap: 24px;
}
h1 { font-family: "Fraunces", Georgia, serif; margin: 0; font-size: clamp(2rem, 4vw, 2.6rem); }
h2 { margin: 0 0 8px; font-size: 1.2rem; }
.subtitle, .hint { margin: 0; color: #6f6a65; }
.panel { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 12px; }
.stat, .card {
  background: white;
  border-radius: 18px;
  padding: 16px;
  border: 1px solid rgba(47, 72, 88, 0.08);
  display: grid;
  gap: 8px;
}
.stat .label { font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.1em; color: #8b857d; }
.stat .value { font-size: 1.3rem; font-weight: 600; color: var(--accent-2); }
.stat .value.negative { color: var(--danger); }
.progress { height: 10px; border-radius: 999px; background: rgba(47, 72, 88, 0.1); overflow: hidden; }
.progress-bar { height: 100%; background: var(--ok); }
.progress-bar.over { background: var(--danger); }
.warning, .status { padding: 10px 14px; border-radius: 12px; }
.warning[data-type="over"], .status[data-type="error"] { background: #fde3df; color: var(--danger); }
.warning[data-type="low"] { background: #fff1d6; color: #8a5a00; }
.status[data-type="ok"] { background: #e1f3e8; color: var(--ok); }
.forms { display: grid; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr)); gap: 16px; }
label { display: grid; gap: 4px; font-size: 0.9rem; }
input { padding: 10px 12px; border-radius: 10px; border: 1px solid rgba(47, 72, 88, 0.2); font: inherit; }
button, .button {
  appearance: none;
  border: none;
  border-radius: 999px;
  padding: 10px 16px;
  font: inherit;
  font-weight: 600;
  cursor: pointer;
  background: rgba(47, 72, 88, 0.08);
  color: var(--accent-2);
  text-decoration: none;
  display: inline-flex;
  align-items: center;
  justify-content: center;
}
.btn-add { background: var(--accent); color: white; }
.btn-sub { background: var(--accent-2); color: white; }
.calendar-header { display: flex; align-items: center; justify-content: space-between; gap: 12px; }
.nav-group { display: flex; gap: 6px; }
.grid { display: grid; grid-template-columns: repeat(7, 1fr); gap: 6px; margin-top: 12px; }
.weekday { text-align: center; font-size: 0.8rem; color: #8b857d; }
.day-form { margin: 0; }
.day {
  width: 100%;
  min-height: 72px;
  border-radius: 12px;
  background: white;
  display: grid;
  align-content: start;
  justify-items: start;
  gap: 2px;
  padding: 8px;
}
.day.blank { background: transparent; }
.day.has-expenses { background: #fff1e8; }
.day.today { outline: 2px solid var(--accent); }
.day-total { font-size: 0.8rem; color: var(--accent); }
.day-count { font-size: 0.7rem; color: #8b857d; }
.modal-backdrop { position: fixed; inset: 0; background: rgba(43, 42, 40, 0.45); display: grid; place-items: center; padding: 18px; }
.modal { background: white; border-radius: 22px; padding: 24px; width: min(560px, 100%); display: grid; gap: 12px; }
.modal-header { display: flex; justify-content: space-between; align-items: center; }
.chips { display: flex; flex-wrap: wrap; gap: 6px; }
.chips form { margin: 0; }
.chip.active { background: var(--accent-2); color: white; }
.expense-list { list-style: none; margin: 0; padding: 0; display: grid; gap: 8px; }
.expense { display: grid; grid-template-columns: 1fr auto auto; gap: 10px; align-items: center; }
.expense .category { display: block; font-size: 0.8rem; color: #8b857d; }
.delete { background: #fde3df; color: var(--danger); }
.empty { color: #8b857d; }
.data-actions, .inline { display: flex; flex-wrap: wrap; gap: 8px; align-items: center; }
@media (max-width: 600px) {
  .app { padding: 24px 16px; }
  .day { min-height: 52px; }
}
"#;

const SCRIPT: &str = r#"
const budgetForm = document.getElementById('budget-form');
const quietMs = Number(budgetForm.dataset.debounce || 500);
const currency = new Intl.NumberFormat('vi-VN', { style: 'currency', currency: 'VND' });
let statsTimer = null;

const refreshStats = async () => {
  const res = await fetch('/api/stats');
  if (!res.ok) {
    return;
  }
  const stats = await res.json();
  document.querySelectorAll('[data-stat]').forEach((el) => {
    const value = stats[el.dataset.stat];
    el.textContent = el.dataset.stat === 'days_remaining' ? value : currency.format(value);
  });
};

budgetForm.addEventListener('input', () => {
  const data = new FormData(budgetForm);
  fetch('/api/settings/draft', {
    method: 'POST',
    headers: { 'content-type': 'application/json' },
    body: JSON.stringify({
      totalBudget: data.get('totalBudget') || '',
      startDate: data.get('startDate') || '',
      endDate: data.get('endDate') || ''
    })
  }).catch(() => {});
  clearTimeout(statsTimer);
  statsTimer = setTimeout(() => refreshStats().catch(() => {}), quietMs + 150);
});

const importFile = document.getElementById('import-file');
importFile.addEventListener('change', () => {
  const file = importFile.files[0];
  if (!file) {
    return;
  }
  const reader = new FileReader();
  reader.onload = () => {
    document.getElementById('import-payload').value = reader.result;
    document.getElementById('import-form').submit();
  };
  reader.readAsText(file);
});
"#;
