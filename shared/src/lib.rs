use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Category label used for every debt repayment entry.
pub const REPAYMENT_CATEGORY: &str = "Debt Repayment";

/// The four kinds of financial event the tracker records.
///
/// This is a fixed enumeration; the wire protocol and the spreadsheet
/// column both use the uppercase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
    Donation,
    Debt,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 4] = [
        TransactionKind::Income,
        TransactionKind::Expense,
        TransactionKind::Donation,
        TransactionKind::Debt,
    ];

    /// Wire/sheet representation (`INCOME`, `EXPENSE`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
            TransactionKind::Donation => "DONATION",
            TransactionKind::Debt => "DEBT",
        }
    }

    /// Parse the wire/sheet representation.
    pub fn parse(s: &str) -> Option<TransactionKind> {
        match s {
            "INCOME" => Some(TransactionKind::Income),
            "EXPENSE" => Some(TransactionKind::Expense),
            "DONATION" => Some(TransactionKind::Donation),
            "DEBT" => Some(TransactionKind::Debt),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a debt borrow entry. Meaningless for repayments and
/// for non-debt kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DebtSubtype {
    Good,
    Bad,
}

impl DebtSubtype {
    /// Derived category label for a borrow entry ("Good Debt" / "Bad Debt").
    pub fn category_label(&self) -> &'static str {
        match self {
            DebtSubtype::Good => "Good Debt",
            DebtSubtype::Bad => "Bad Debt",
        }
    }
}

/// One financial event.
///
/// Sign convention: `amount` is a positive magnitude for everything except
/// debt repayments, which legacy records encode as a negative amount
/// instead of setting `is_repayment`. Use [`Transaction::is_debt_repayment`]
/// rather than inspecting either field directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Opaque unique id, generated by the client and immutable afterwards.
    pub id: String,
    /// RFC 3339 timestamp.
    pub date: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(rename = "debtSubtype", default, deserialize_with = "de_subtype")]
    pub debt_subtype: Option<DebtSubtype>,
    #[serde(rename = "isRepayment", default, deserialize_with = "de_flag")]
    pub is_repayment: bool,
}

impl Transaction {
    /// Generate a fresh transaction id.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Whether this entry is a debt repayment.
    ///
    /// The one place the repayment disjunction is written: either the
    /// explicit flag is set, or the record is a legacy debt entry with a
    /// negative amount. Every component branching on repayment status must
    /// go through here.
    pub fn is_debt_repayment(&self) -> bool {
        self.is_repayment || (self.kind == TransactionKind::Debt && self.amount < 0.0)
    }

    /// Label shown for this entry in transaction lists.
    ///
    /// Debt repayments display the fixed repayment label; everything else
    /// displays its category.
    pub fn display_label(&self) -> &str {
        if self.kind == TransactionKind::Debt && self.is_debt_repayment() {
            REPAYMENT_CATEGORY
        } else {
            &self.category
        }
    }

    /// Amount as shown in transaction lists: positive for money coming in
    /// (income, debt borrows), negative for money going out (expenses,
    /// donations, debt repayments). Derived from the kind and the repayment
    /// predicate, never from the stored sign alone.
    pub fn signed_display_amount(&self) -> f64 {
        let magnitude = self.amount.abs();
        match self.kind {
            TransactionKind::Income => magnitude,
            TransactionKind::Expense | TransactionKind::Donation => -magnitude,
            TransactionKind::Debt => {
                if self.is_debt_repayment() {
                    -magnitude
                } else {
                    magnitude
                }
            }
        }
    }
}

/// Accept sheet-flavoured booleans: JSON `true`, or the strings
/// "true"/"TRUE"/"True" that round-trip through spreadsheet cells.
fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Text(s) => Ok(s.eq_ignore_ascii_case("true")),
    }
}

/// Accept an absent, null, or empty-string subtype as `None`.
fn de_subtype<'de, D>(deserializer: D) -> Result<Option<DebtSubtype>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Subtype(DebtSubtype),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Subtype(s)) => Ok(Some(s)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(other)) => Err(serde::de::Error::custom(format!(
            "unknown debt subtype: {other}"
        ))),
        None => Ok(None),
    }
}

/// Ordered category lists, one per transaction kind.
///
/// Insertion order is display order; duplicates are forbidden within a
/// kind but the same name may appear under different kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMap {
    #[serde(rename = "INCOME", default)]
    pub income: Vec<String>,
    #[serde(rename = "EXPENSE", default)]
    pub expense: Vec<String>,
    #[serde(rename = "DONATION", default)]
    pub donation: Vec<String>,
    #[serde(rename = "DEBT", default)]
    pub debt: Vec<String>,
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self {
            income: vec!["Allowance".into(), "Salary".into(), "Freelance".into()],
            expense: vec![
                "Food".into(),
                "Transport".into(),
                "Shopping".into(),
                "Entertainment".into(),
                "Bills".into(),
            ],
            donation: vec!["Charity".into(), "Gift".into(), "Religious".into()],
            debt: vec!["Good Debt".into(), "Bad Debt".into()],
        }
    }
}

impl CategoryMap {
    /// Completely empty map (no seeded defaults).
    pub fn empty() -> Self {
        Self {
            income: Vec::new(),
            expense: Vec::new(),
            donation: Vec::new(),
            debt: Vec::new(),
        }
    }

    pub fn list(&self, kind: TransactionKind) -> &[String] {
        match kind {
            TransactionKind::Income => &self.income,
            TransactionKind::Expense => &self.expense,
            TransactionKind::Donation => &self.donation,
            TransactionKind::Debt => &self.debt,
        }
    }

    fn list_mut(&mut self, kind: TransactionKind) -> &mut Vec<String> {
        match kind {
            TransactionKind::Income => &mut self.income,
            TransactionKind::Expense => &mut self.expense,
            TransactionKind::Donation => &mut self.donation,
            TransactionKind::Debt => &mut self.debt,
        }
    }

    pub fn contains(&self, kind: TransactionKind, name: &str) -> bool {
        self.list(kind).iter().any(|c| c == name)
    }

    /// Append `name` under `kind` unless it is already present.
    ///
    /// Returns whether the map changed; matching is by exact string.
    pub fn add(&mut self, kind: TransactionKind, name: &str) -> bool {
        if self.contains(kind, name) {
            return false;
        }
        self.list_mut(kind).push(name.to_string());
        true
    }
}

/// Time window applied to the transaction list for display.
///
/// `Home` and `Month` both mean the current calendar month; the home view
/// reuses the month window by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Window {
    Home,
    Month,
    Year,
}

/// Minimal `{status, message}` envelope returned by every write action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".into(),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Full-store snapshot returned by `?action=get`.
///
/// Transactions arrive in sheet row order, oldest first; the sync layer
/// reverses them into the local newest-first convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub categories: Option<CategoryMap>,
}

impl SnapshotResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Body of `?action=addCategory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddCategoryRequest {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debt(amount: f64, is_repayment: bool) -> Transaction {
        Transaction {
            id: Transaction::generate_id(),
            date: "2025-03-10T09:00:00Z".to_string(),
            amount,
            kind: TransactionKind::Debt,
            category: "Good Debt".to_string(),
            note: None,
            debt_subtype: Some(DebtSubtype::Good),
            is_repayment,
        }
    }

    #[test]
    fn test_repayment_predicate_flag_and_legacy_sign_agree() {
        // Explicit flag
        assert!(debt(-200.0, true).is_debt_repayment());
        assert!(debt(200.0, true).is_debt_repayment());

        // Legacy encoding: negative amount, no flag
        assert!(debt(-200.0, false).is_debt_repayment());

        // Borrow
        assert!(!debt(500.0, false).is_debt_repayment());
    }

    #[test]
    fn test_repayment_predicate_ignores_sign_for_non_debt() {
        let mut t = debt(-50.0, false);
        t.kind = TransactionKind::Expense;
        t.debt_subtype = None;
        assert!(!t.is_debt_repayment());
    }

    #[test]
    fn test_wire_field_names() {
        let t = debt(500.0, false);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "DEBT");
        assert_eq!(json["debtSubtype"], "GOOD");
        assert_eq!(json["isRepayment"], false);
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_deserialize_legacy_string_flag() {
        let json = r#"{
            "id": "abc", "date": "2024-01-01T00:00:00Z", "amount": 10,
            "type": "DEBT", "category": "Good Debt",
            "debtSubtype": "", "isRepayment": "true"
        }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert!(t.is_repayment);
        assert_eq!(t.debt_subtype, None);
    }

    #[test]
    fn test_deserialize_missing_optional_fields() {
        let json = r#"{
            "id": "abc", "date": "2024-01-01T00:00:00Z", "amount": 10,
            "type": "INCOME", "category": "Salary"
        }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert!(!t.is_repayment);
        assert_eq!(t.debt_subtype, None);
        assert_eq!(t.note, None);
    }

    #[test]
    fn test_display_label_for_debt_entries() {
        assert_eq!(debt(500.0, false).display_label(), "Good Debt");
        assert_eq!(debt(-200.0, false).display_label(), REPAYMENT_CATEGORY);
        assert_eq!(debt(200.0, true).display_label(), REPAYMENT_CATEGORY);
    }

    #[test]
    fn test_signed_display_amount_by_kind() {
        let mut t = debt(500.0, false);

        t.kind = TransactionKind::Income;
        assert_eq!(t.signed_display_amount(), 500.0);
        t.kind = TransactionKind::Expense;
        assert_eq!(t.signed_display_amount(), -500.0);
        t.kind = TransactionKind::Donation;
        assert_eq!(t.signed_display_amount(), -500.0);

        // Debt borrows are inflows, repayments outflows regardless of the
        // stored sign.
        assert_eq!(debt(500.0, false).signed_display_amount(), 500.0);
        assert_eq!(debt(200.0, true).signed_display_amount(), -200.0);
        assert_eq!(debt(-200.0, false).signed_display_amount(), -200.0);
    }

    #[test]
    fn test_category_map_add_is_idempotent() {
        let mut map = CategoryMap::default();
        assert!(map.add(TransactionKind::Expense, "Rent"));
        let once = map.clone();
        assert!(!map.add(TransactionKind::Expense, "Rent"));
        assert_eq!(map, once);
    }

    #[test]
    fn test_category_map_same_name_under_different_kinds() {
        let mut map = CategoryMap::empty();
        assert!(map.add(TransactionKind::Income, "Gift"));
        assert!(map.add(TransactionKind::Donation, "Gift"));
        assert!(map.contains(TransactionKind::Income, "Gift"));
        assert!(map.contains(TransactionKind::Donation, "Gift"));
    }

    #[test]
    fn test_category_map_wire_keys() {
        let json = serde_json::to_value(CategoryMap::default()).unwrap();
        assert!(json["INCOME"].is_array());
        assert!(json["DEBT"].is_array());
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in TransactionKind::ALL {
            assert_eq!(TransactionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::parse("SAVINGS"), None);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Transaction::generate_id();
        let b = Transaction::generate_id();
        assert_ne!(a, b);
    }
}
