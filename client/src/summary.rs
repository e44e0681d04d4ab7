//! Pure summary/aggregation engine.
//!
//! Everything here is a function of `(transaction list, window, now)` with
//! no side effects, cheap enough to recompute on every render: one O(n)
//! pass per kind over a human-scale ledger.
//!
//! Two different scopes apply. The per-kind summaries and the net balance
//! cover only the windowed subset; the debt ledger always scans the full
//! list, because debt burden is a running total independent of whatever
//! time window is on screen.

use chrono::{DateTime, Datelike, Utc};
use shared::{Transaction, TransactionKind, Window};
use std::cmp::Ordering;

/// One category's share of a kind total within the window.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub total: f64,
    /// Share of the kind total, 0..=100. Defined as 0 when the kind total
    /// is 0 - never NaN.
    pub percentage: f64,
}

/// Windowed total and per-category breakdown for one kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KindSummary {
    pub total: f64,
    /// Sorted descending by subtotal.
    pub breakdown: Vec<CategorySummary>,
}

/// All-time debt position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DebtLedger {
    pub total_borrowed: f64,
    pub total_paid: f64,
    /// `max(0, total_borrowed - total_paid)`.
    pub remaining: f64,
}

/// Full derived state for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Windowed transactions, newest first.
    pub filtered: Vec<Transaction>,
    pub income: KindSummary,
    pub expense: KindSummary,
    pub donation: KindSummary,
    /// `income - expense - donation`; debt never participates.
    pub net: f64,
    pub debt: DebtLedger,
}

impl Summary {
    /// Compute against the current wall clock.
    pub fn compute_now(transactions: &[Transaction], window: Window) -> Summary {
        compute(transactions, window, Utc::now())
    }
}

/// Derive the full summary. `now` is evaluated exactly once per
/// computation and injected so results are reproducible.
pub fn compute(transactions: &[Transaction], window: Window, now: DateTime<Utc>) -> Summary {
    let mut dated: Vec<(DateTime<Utc>, &Transaction)> = transactions
        .iter()
        .filter_map(|t| {
            // Entries with unparseable dates fall outside every window.
            let date = DateTime::parse_from_rfc3339(&t.date).ok()?.with_timezone(&Utc);
            in_window(window, date, now).then_some((date, t))
        })
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    let filtered: Vec<Transaction> = dated.into_iter().map(|(_, t)| t.clone()).collect();

    let income = kind_summary(&filtered, TransactionKind::Income);
    let expense = kind_summary(&filtered, TransactionKind::Expense);
    let donation = kind_summary(&filtered, TransactionKind::Donation);
    let net = income.total - expense.total - donation.total;

    Summary {
        filtered,
        income,
        expense,
        donation,
        net,
        debt: debt_ledger(transactions),
    }
}

fn in_window(window: Window, date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match window {
        Window::Year => date.year() == now.year(),
        // Home reuses the month window by design.
        Window::Home | Window::Month => {
            date.year() == now.year() && date.month() == now.month()
        }
    }
}

/// Single pass over the windowed set for one non-debt kind: running total
/// plus category subtotals, then the percentage breakdown sorted
/// descending by subtotal.
fn kind_summary(filtered: &[Transaction], kind: TransactionKind) -> KindSummary {
    debug_assert_ne!(kind, TransactionKind::Debt);

    let mut total = 0.0;
    let mut subtotals: Vec<(String, f64)> = Vec::new();
    for t in filtered.iter().filter(|t| t.kind == kind) {
        total += t.amount;
        match subtotals.iter_mut().find(|(category, _)| *category == t.category) {
            Some((_, subtotal)) => *subtotal += t.amount,
            None => subtotals.push((t.category.clone(), t.amount)),
        }
    }

    let mut breakdown: Vec<CategorySummary> = subtotals
        .into_iter()
        .map(|(category, subtotal)| CategorySummary {
            category,
            total: subtotal,
            percentage: if total > 0.0 {
                subtotal / total * 100.0
            } else {
                0.0
            },
        })
        .collect();
    breakdown.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));

    KindSummary { total, breakdown }
}

/// All-time debt ledger over the entire, unfiltered list.
fn debt_ledger(transactions: &[Transaction]) -> DebtLedger {
    let mut total_borrowed = 0.0;
    let mut total_paid = 0.0;
    for t in transactions.iter().filter(|t| t.kind == TransactionKind::Debt) {
        if t.is_debt_repayment() {
            total_paid += t.amount.abs();
        } else {
            total_borrowed += t.amount;
        }
    }
    DebtLedger {
        total_borrowed,
        total_paid,
        remaining: (total_borrowed - total_paid).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::DebtSubtype;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn tx(id: &str, date: &str, amount: f64, kind: TransactionKind, category: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            date: date.to_string(),
            amount,
            kind,
            category: category.to_string(),
            note: None,
            debt_subtype: None,
            is_repayment: false,
        }
    }

    #[test]
    fn test_month_scenario_net_and_breakdown() {
        let transactions = vec![
            tx("1", "2025-03-10T09:00:00Z", 100.0, TransactionKind::Income, "Salary"),
            tx("2", "2025-03-11T09:00:00Z", 40.0, TransactionKind::Expense, "Food"),
        ];

        let summary = compute(&transactions, Window::Month, now());
        assert_eq!(summary.net, 60.0);
        assert_eq!(summary.income.total, 100.0);
        assert_eq!(summary.income.breakdown.len(), 1);
        assert_eq!(summary.income.breakdown[0].category, "Salary");
        assert_eq!(summary.income.breakdown[0].total, 100.0);
        assert_eq!(summary.income.breakdown[0].percentage, 100.0);
    }

    #[test]
    fn test_percentages_sum_to_100_and_sort_descending() {
        let transactions = vec![
            tx("1", "2025-03-01T00:00:00Z", 30.0, TransactionKind::Expense, "Food"),
            tx("2", "2025-03-02T00:00:00Z", 50.0, TransactionKind::Expense, "Bills"),
            tx("3", "2025-03-03T00:00:00Z", 20.0, TransactionKind::Expense, "Food"),
        ];

        let summary = compute(&transactions, Window::Month, now());
        assert_eq!(summary.expense.total, 100.0);

        let sum: f64 = summary.expense.breakdown.iter().map(|c| c.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);

        let categories: Vec<&str> = summary
            .expense
            .breakdown
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(categories, ["Food", "Bills"]);
    }

    #[test]
    fn test_zero_total_yields_zero_percentage_not_nan() {
        let transactions = vec![tx(
            "1",
            "2025-03-01T00:00:00Z",
            0.0,
            TransactionKind::Expense,
            "Food",
        )];

        let summary = compute(&transactions, Window::Month, now());
        assert_eq!(summary.expense.total, 0.0);
        assert_eq!(summary.expense.breakdown.len(), 1);
        assert_eq!(summary.expense.breakdown[0].percentage, 0.0);
    }

    #[test]
    fn test_empty_list() {
        let summary = compute(&[], Window::Month, now());
        assert!(summary.filtered.is_empty());
        assert_eq!(summary.net, 0.0);
        assert!(summary.income.breakdown.is_empty());
        assert_eq!(summary.debt, DebtLedger::default());
    }

    #[test]
    fn test_debt_ledger_scenario() {
        let mut borrow = tx("1", "2025-03-01T00:00:00Z", 500.0, TransactionKind::Debt, "Good Debt");
        borrow.debt_subtype = Some(DebtSubtype::Good);
        let mut repay = tx("2", "2025-03-05T00:00:00Z", -200.0, TransactionKind::Debt, "Debt Repayment");
        repay.is_repayment = true;

        let summary = compute(&[borrow, repay], Window::Month, now());
        assert_eq!(summary.debt.total_borrowed, 500.0);
        assert_eq!(summary.debt.total_paid, 200.0);
        assert_eq!(summary.debt.remaining, 300.0);
    }

    #[test]
    fn test_flagged_and_negative_repayments_classified_identically() {
        let borrow = tx("1", "2025-03-01T00:00:00Z", 500.0, TransactionKind::Debt, "Bad Debt");

        let mut flagged = tx("2", "2025-03-05T00:00:00Z", -200.0, TransactionKind::Debt, "Debt Repayment");
        flagged.is_repayment = true;
        // Legacy form: negative amount, flag never set.
        let legacy = tx("2", "2025-03-05T00:00:00Z", -200.0, TransactionKind::Debt, "Debt Repayment");

        let with_flag = compute(&[borrow.clone(), flagged], Window::Month, now());
        let without_flag = compute(&[borrow, legacy], Window::Month, now());
        assert_eq!(with_flag.debt, without_flag.debt);
        assert_eq!(with_flag.debt.total_paid, 200.0);
    }

    #[test]
    fn test_debt_ledger_ignores_the_window() {
        let transactions = vec![
            // Borrowed years before the current window.
            tx("1", "2021-06-01T00:00:00Z", 1000.0, TransactionKind::Debt, "Bad Debt"),
            tx("2", "2022-06-01T00:00:00Z", -400.0, TransactionKind::Debt, "Debt Repayment"),
            // Non-debt entry outside the window is excluded from totals.
            tx("3", "2021-06-01T00:00:00Z", 50.0, TransactionKind::Income, "Salary"),
        ];

        let summary = compute(&transactions, Window::Month, now());
        assert!(summary.filtered.is_empty());
        assert_eq!(summary.income.total, 0.0);
        assert_eq!(summary.debt.total_borrowed, 1000.0);
        assert_eq!(summary.debt.total_paid, 400.0);
        assert_eq!(summary.debt.remaining, 600.0);
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        let transactions = vec![
            tx("1", "2025-03-01T00:00:00Z", 100.0, TransactionKind::Debt, "Good Debt"),
            tx("2", "2025-03-02T00:00:00Z", -250.0, TransactionKind::Debt, "Debt Repayment"),
        ];

        let summary = compute(&transactions, Window::Month, now());
        assert_eq!(summary.debt.remaining, 0.0);
    }

    #[test]
    fn test_debt_excluded_from_net_and_breakdowns() {
        let transactions = vec![
            tx("1", "2025-03-10T09:00:00Z", 100.0, TransactionKind::Income, "Salary"),
            tx("2", "2025-03-11T09:00:00Z", 500.0, TransactionKind::Debt, "Good Debt"),
        ];

        let summary = compute(&transactions, Window::Month, now());
        assert_eq!(summary.net, 100.0);
        assert!(summary.expense.breakdown.is_empty());
        // But the debt row still appears in the windowed list.
        assert_eq!(summary.filtered.len(), 2);
    }

    #[test]
    fn test_year_window_spans_months_and_home_equals_month() {
        let transactions = vec![
            tx("1", "2025-01-05T00:00:00Z", 10.0, TransactionKind::Income, "Salary"),
            tx("2", "2025-03-05T00:00:00Z", 20.0, TransactionKind::Income, "Salary"),
            tx("3", "2024-12-31T23:59:59Z", 40.0, TransactionKind::Income, "Salary"),
        ];

        let year = compute(&transactions, Window::Year, now());
        assert_eq!(year.income.total, 30.0);

        let month = compute(&transactions, Window::Month, now());
        let home = compute(&transactions, Window::Home, now());
        assert_eq!(month.income.total, 20.0);
        assert_eq!(home, month);
    }

    #[test]
    fn test_filtered_is_sorted_newest_first() {
        let transactions = vec![
            tx("older", "2025-03-01T00:00:00Z", 1.0, TransactionKind::Income, "Salary"),
            tx("newest", "2025-03-14T00:00:00Z", 1.0, TransactionKind::Income, "Salary"),
            tx("middle", "2025-03-07T00:00:00Z", 1.0, TransactionKind::Income, "Salary"),
        ];

        let summary = compute(&transactions, Window::Month, now());
        let ids: Vec<&str> = summary.filtered.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["newest", "middle", "older"]);
    }

    #[test]
    fn test_unparseable_date_is_outside_every_window_but_still_in_debt_ledger() {
        let transactions = vec![
            tx("bad", "not a date", 10.0, TransactionKind::Income, "Salary"),
            tx("debt", "also not a date", 300.0, TransactionKind::Debt, "Bad Debt"),
        ];

        let summary = compute(&transactions, Window::Year, now());
        assert!(summary.filtered.is_empty());
        assert_eq!(summary.income.total, 0.0);
        assert_eq!(summary.debt.total_borrowed, 300.0);
    }
}
