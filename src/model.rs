// Domain types shared by the store, the validation layer and the routes
//
// Field names serialize in camelCase because the API is consumed by a
// JavaScript client.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TIMESTAMPS
// ============================================================================

/// RFC 3339 in UTC with millisecond precision, e.g. `2025-01-15T00:00:00.000Z`.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(dt))
}

// ============================================================================
// MONEY
// ============================================================================

/// Largest magnitude a DECIMAL(12, 2) column holds, in cents.
pub const MAX_CENTS: i64 = 999_999_999_999;

/// Decimal amount with two fractional digits, stored as cents.
///
/// Serializes as a decimal string ("12.34") so no precision is lost on
/// the way to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(i64);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Rounds to the nearest cent.
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            bail!("amount must be a finite number");
        }
        let cents = (value * 100.0).round();
        if cents.abs() > MAX_CENTS as f64 {
            bail!("amount out of range");
        }
        Ok(Money(cents as i64))
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl FromStr for Money {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            bail!("empty amount");
        }
        if frac.len() > 2 {
            bail!("amount has more than two decimal places: {}", s);
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            bail!("invalid amount: {}", s);
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| anyhow!("amount out of range: {}", s))?
        };
        let frac: i64 = format!("{:0<2}", frac).parse()?;
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .filter(|c| *c <= MAX_CENTS)
            .ok_or_else(|| anyhow!("amount out of range: {}", s))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
            TransactionType::Transfer => "TRANSFER",
        }
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            "TRANSFER" => Ok(TransactionType::Transfer),
            other => bail!("unknown transaction type: {}", other),
        }
    }
}

/// Entry type stored on a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    Income,
    Expense,
    Savings,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "INCOME",
            CategoryType::Expense => "EXPENSE",
            CategoryType::Savings => "SAVINGS",
        }
    }
}

impl FromStr for CategoryType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "INCOME" => Ok(CategoryType::Income),
            "EXPENSE" => Ok(CategoryType::Expense),
            "SAVINGS" => Ok(CategoryType::Savings),
            other => bail!("unknown category type: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "OWNER",
            MemberRole::Member => "MEMBER",
        }
    }
}

impl FromStr for MemberRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OWNER" => Ok(MemberRole::Owner),
            "MEMBER" => Ok(MemberRole::Member),
            other => bail!("unknown member role: {}", other),
        }
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub jar_id: String,
    pub user_id: String,
    pub role: MemberRole,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub jar_id: String,
    pub name: String,
    pub entry_type: CategoryType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub jar_id: String,
    pub created_by: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Money,
    pub currency: Option<String>,
    pub category_id: Option<String>,
    pub goal_id: Option<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub transfer_counterparty_jar_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Transaction joined with its category, as listed and created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWithCategory {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub category: Option<Category>,
}

// ============================================================================
// STORE INPUTS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub jar_id: String,
    pub created_by: String,
    pub kind: TransactionType,
    pub amount: Money,
    pub currency: Option<String>,
    pub category_id: Option<String>,
    pub goal_id: Option<String>,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
    pub transfer_counterparty_jar_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Whitelisted update. `None` leaves a column alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub amount: Option<Money>,
    pub note: Option<Option<String>>,
    pub category_id: Option<Option<String>>,
    pub goal_id: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
    pub kind: Option<TransactionType>,
    pub transfer_counterparty_jar_id: Option<Option<String>>,
    pub metadata: Option<Option<serde_json::Value>>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        self == &TransactionPatch::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    /// Inclusive lower bound
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_parsing() {
        assert_eq!("12.34".parse::<Money>().unwrap().cents(), 1234);
        assert_eq!("12.3".parse::<Money>().unwrap().cents(), 1230);
        assert_eq!("7".parse::<Money>().unwrap().cents(), 700);
        assert_eq!(".5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!("-0.01".parse::<Money>().unwrap().cents(), -1);
        assert!("1.234".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
    }

    #[test]
    fn test_money_display_and_json() {
        assert_eq!(Money::from_cents(1234).to_string(), "12.34");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(serde_json::to_value(Money::from_cents(300000)).unwrap(), "3000.00");
    }

    #[test]
    fn test_money_from_float_rounds_to_cents() {
        assert_eq!(Money::from_f64(12.34).unwrap().cents(), 1234);
        assert_eq!(Money::from_f64(5.0).unwrap().cents(), 500);
        assert_eq!(Money::from_f64(0.1 + 0.2).unwrap().cents(), 30);
        assert!(Money::from_f64(f64::NAN).is_err());
    }

    #[test]
    fn test_money_range_matches_for_numbers_and_strings() {
        assert_eq!(Money::from_f64(9_999_999_999.99).unwrap().cents(), MAX_CENTS);
        assert_eq!("9999999999.99".parse::<Money>().unwrap().cents(), MAX_CENTS);
        assert_eq!("-9999999999.99".parse::<Money>().unwrap().cents(), -MAX_CENTS);

        assert!(Money::from_f64(10_000_000_000.0).is_err());
        assert!("10000000000.00".parse::<Money>().is_err());
        assert!("92233720368547758.07".parse::<Money>().is_err());
    }

    #[test]
    fn test_transaction_timestamps_have_millis() {
        use chrono::TimeZone;

        let date = Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap();
        let tx = Transaction {
            id: "t1".into(),
            jar_id: "j1".into(),
            created_by: "u1".into(),
            kind: TransactionType::Income,
            amount: Money::from_cents(100),
            currency: None,
            category_id: None,
            goal_id: None,
            date,
            note: None,
            transfer_counterparty_jar_id: None,
            metadata: None,
            created_at: date,
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["date"], "2025-01-15T08:30:00.000Z");
        assert_eq!(json["createdAt"], "2025-01-15T08:30:00.000Z");
        assert_eq!(format_timestamp(&date), "2025-01-15T08:30:00.000Z");
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_value(TransactionType::Expense).unwrap(), "EXPENSE");
        assert_eq!("TRANSFER".parse::<TransactionType>().unwrap(), TransactionType::Transfer);
        assert!("transfer".parse::<TransactionType>().is_err());
        assert_eq!("savings".parse::<CategoryType>().unwrap(), CategoryType::Savings);
        assert_eq!(MemberRole::Owner.as_str(), "OWNER");
    }

    #[test]
    fn test_empty_patch() {
        assert!(TransactionPatch::default().is_empty());
        let patch = TransactionPatch {
            note: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
