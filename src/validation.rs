// Request payload validation for transaction routes
//
// Shape failures are BadInput with code VALIDATION_ERROR. Business rules
// (category pairing) live in the routes because they need the store.

use crate::error::{validation_error, HttpError};
use crate::model::{Money, TransactionPatch, TransactionType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

const MAX_NOTE_LEN: usize = 500;

// ============================================================================
// DATES
// ============================================================================

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ============================================================================
// CREATE BODY
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCreateBody {
    date: String,
    amount: f64,
    #[serde(rename = "type")]
    kind: TransactionType,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    goal_id: Option<String>,
    #[serde(default)]
    transfer_counterparty_jar_id: Option<String>,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTransaction {
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub kind: TransactionType,
    pub currency: Option<String>,
    pub category_id: Option<String>,
    pub note: Option<String>,
    pub goal_id: Option<String>,
    pub transfer_counterparty_jar_id: Option<String>,
    pub metadata: Option<Value>,
}

impl CreateTransaction {
    pub fn parse(body: &[u8]) -> Result<Self, HttpError> {
        let raw: RawCreateBody =
            serde_json::from_slice(body).map_err(|e| validation_error(e.to_string()))?;

        let date = parse_date(&raw.date)
            .ok_or_else(|| validation_error(format!("date: invalid date {:?}", raw.date)))?;

        if raw.amount.is_nan() || raw.amount <= 0.0 {
            return Err(validation_error("amount: must be a positive number"));
        }
        let amount = Money::from_f64(raw.amount)
            .map_err(|e| validation_error(format!("amount: {}", e)))?;
        if !amount.is_positive() {
            return Err(validation_error("amount: must be at least 0.01"));
        }

        if let Some(currency) = &raw.currency {
            if currency.chars().count() != 3 {
                return Err(validation_error("currency: must be exactly 3 characters"));
            }
        }
        if let Some(note) = &raw.note {
            if note.chars().count() > MAX_NOTE_LEN {
                return Err(validation_error(format!(
                    "note: must be at most {} characters",
                    MAX_NOTE_LEN
                )));
            }
        }

        Ok(CreateTransaction {
            date,
            amount,
            kind: raw.kind,
            currency: raw.currency,
            category_id: raw.category_id,
            note: raw.note,
            goal_id: raw.goal_id,
            transfer_counterparty_jar_id: raw.transfer_counterparty_jar_id,
            metadata: raw.metadata,
        })
    }
}

// ============================================================================
// LIST QUERY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub kind: Option<TransactionType>,
}

impl ListQuery {
    pub fn parse(params: &HashMap<String, String>) -> Result<Self, HttpError> {
        let date_param = |name: &str| -> Result<Option<DateTime<Utc>>, HttpError> {
            match params.get(name) {
                None => Ok(None),
                Some(raw) => parse_date(raw)
                    .map(Some)
                    .ok_or_else(|| validation_error(format!("{}: invalid date {:?}", name, raw))),
            }
        };

        let kind = match params.get("type") {
            None => None,
            Some(raw) => Some(
                raw.parse::<TransactionType>()
                    .map_err(|e| validation_error(format!("type: {}", e)))?,
            ),
        };

        Ok(ListQuery {
            from: date_param("from")?,
            to: date_param("to")?,
            kind,
        })
    }
}

/// `?limit=` for the recent feed; absent or unparsable falls back to the
/// default and the data layer clamps the rest.
pub fn parse_limit(params: &HashMap<String, String>, default: i64) -> i64 {
    params
        .get("limit")
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(default)
}

// ============================================================================
// PATCH WHITELIST
// ============================================================================

/// Nullable string field: `Some(Some(s))` for a string, `Some(None)` for
/// null, `None` when absent or of any other type.
fn nullable_string(obj: &Map<String, Value>, key: &str) -> Option<Option<String>> {
    match obj.get(key)? {
        Value::String(s) => Some(Some(s.clone())),
        Value::Null => Some(None),
        _ => None,
    }
}

/// Body of an unreadable request is treated as `{}`.
pub fn lenient_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Keep only the updatable fields with acceptable types. Unknown keys and
/// wrongly typed values are dropped silently; only values that have the
/// right type but cannot be interpreted are rejected.
pub fn pick_patch(input: &Value) -> Result<TransactionPatch, HttpError> {
    let obj = match input {
        Value::Object(obj) => obj,
        _ => return Ok(TransactionPatch::default()),
    };
    let mut patch = TransactionPatch::default();

    match obj.get("amount") {
        Some(Value::Number(n)) => {
            let value = n.as_f64().unwrap_or(f64::NAN);
            patch.amount =
                Some(Money::from_f64(value).map_err(|e| {
                    validation_error(format!("amount: {}", e))
                })?);
        }
        Some(Value::String(s)) => {
            patch.amount = Some(s.parse().map_err(|e| validation_error(format!("amount: {}", e)))?);
        }
        _ => {}
    }

    // memo is accepted as another name for note; note wins if both are sent
    patch.note = nullable_string(obj, "note").or_else(|| nullable_string(obj, "memo"));
    patch.category_id = nullable_string(obj, "categoryId");
    patch.goal_id = nullable_string(obj, "goalId");
    patch.transfer_counterparty_jar_id = nullable_string(obj, "transferCounterpartyJarId");

    if let Some(Value::String(raw)) = obj.get("date") {
        patch.date = Some(
            parse_date(raw)
                .ok_or_else(|| validation_error(format!("date: invalid date {:?}", raw)))?,
        );
    }

    patch.kind = match obj.get("type").and_then(Value::as_str) {
        Some("INCOME") => Some(TransactionType::Income),
        Some("EXPENSE") => Some(TransactionType::Expense),
        _ => None,
    };

    if let Some(metadata) = obj.get("metadata") {
        patch.metadata = Some(match metadata {
            Value::Null => None,
            other => Some(other.clone()),
        });
    }

    Ok(patch)
}
