//! Validation of loosely typed task payloads.
//!
//! Every field is checked independently so callers can report all problems
//! in one response. Validation is a pure function of its input.

use super::{Cost, NewTask, PresentationOrder, TaskChanges, TaskName};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::num::FpCategory;
use std::str::FromStr;

/// Payload key for the task name.
pub const NAME_FIELD: &str = "nome";
/// Payload key for the task cost.
pub const COST_FIELD: &str = "custo";
/// Payload key for the task due date.
pub const DUE_DATE_FIELD: &str = "data_limite";
/// Payload key for the presentation order.
pub const ORDER_FIELD: &str = "ordem_apresentacao";

const NAME_REQUIRED: &str = "Nome e obrigatorio.";
const COST_REQUIRED: &str = "Custo e obrigatorio.";
const COST_INVALID_FORMAT: &str = "Custo deve ser um numero decimal.";
const COST_INVALID_RANGE: &str = "Custo deve ser maior ou igual a zero.";
const DUE_DATE_REQUIRED: &str = "Data limite e obrigatoria.";
const DUE_DATE_INVALID_FORMAT: &str = "Data limite deve estar no formato yyyy-mm-dd.";
const ORDER_INVALID_FORMAT: &str = "Ordem de apresentacao deve ser um inteiro.";

/// Stored name for a JSON `true` in `nome`.
const BOOLEAN_NAME: &str = "True";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw JSON object submitted for a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPayload(Map<String, Value>);

impl TaskPayload {
    /// Parses a request body leniently.
    ///
    /// Bodies that are empty, malformed, or not a JSON object yield an empty
    /// payload, which then fails validation on its required fields.
    #[must_use]
    pub fn from_json_slice(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Self(fields),
            _ => Self::default(),
        }
    }

    /// Returns the raw value stored under `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns `true` when the payload carries `field`, even as `null`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl From<Map<String, Value>> for TaskPayload {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Value> for TaskPayload {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            _ => Self::default(),
        }
    }
}

/// Whether a caller may choose the presentation order explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderPolicy {
    /// Parse `ordem_apresentacao` when present (task creation).
    Accept,
    /// Ignore `ordem_apresentacao` entirely (task updates).
    Ignore,
}

/// Field-keyed validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, &'static str>);

impl FieldErrors {
    /// Returns `true` when no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the message recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    fn record<T>(&mut self, field: &'static str, outcome: Result<T, &'static str>) -> Option<T> {
        outcome
            .map_err(|message| {
                self.0.insert(field, message);
            })
            .ok()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Normalized task fields produced by [`validate_payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTask {
    /// Trimmed name.
    pub name: TaskName,
    /// Non-negative cost.
    pub cost: Cost,
    /// Calendar due date.
    pub due_date: NaiveDate,
    /// Explicit order, only ever set under [`OrderPolicy::Accept`].
    pub order: Option<PresentationOrder>,
}

impl ValidatedTask {
    /// Converts the fields into an insert request.
    #[must_use]
    pub fn into_new_task(self) -> NewTask {
        NewTask {
            name: self.name,
            cost: self.cost,
            due_date: self.due_date,
            order: self.order,
        }
    }

    /// Converts the fields into an update request, dropping any order.
    #[must_use]
    pub fn into_changes(self) -> TaskChanges {
        TaskChanges {
            name: self.name,
            cost: self.cost,
            due_date: self.due_date,
        }
    }
}

/// Validates and normalizes a task payload.
///
/// # Errors
///
/// Returns every failing field with its message when any field is invalid.
pub fn validate_payload(
    payload: &TaskPayload,
    policy: OrderPolicy,
) -> Result<ValidatedTask, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = errors.record(NAME_FIELD, parse_name(payload.get(NAME_FIELD)));
    let cost = errors.record(COST_FIELD, parse_cost(payload.get(COST_FIELD)));
    let due_date = errors.record(DUE_DATE_FIELD, parse_due_date(payload.get(DUE_DATE_FIELD)));
    let order = match policy {
        OrderPolicy::Accept if payload.contains(ORDER_FIELD) => errors
            .record(ORDER_FIELD, parse_order(payload.get(ORDER_FIELD)))
            .map(Some),
        OrderPolicy::Accept | OrderPolicy::Ignore => Some(None),
    };

    match (name, cost, due_date, order) {
        (Some(name_value), Some(cost_value), Some(date_value), Some(order_value))
            if errors.is_empty() =>
        {
            Ok(ValidatedTask {
                name: name_value,
                cost: cost_value,
                due_date: date_value,
                order: order_value,
            })
        }
        _ => Err(errors),
    }
}

/// Textual form of a scalar JSON value; `None` for null and containers.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Empty values that count as absent: `null`, `false`, zero, and empty
/// strings, arrays and objects.
fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Bool(true) => false,
        Value::Number(number) => {
            matches!(number.as_f64().map(f64::classify), Some(FpCategory::Zero))
        }
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn parse_name(raw: Option<&Value>) -> Result<TaskName, &'static str> {
    let text = match raw {
        None => return Err(NAME_REQUIRED),
        Some(value) if is_blank_value(value) => return Err(NAME_REQUIRED),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        // only `true` is left here
        Some(Value::Bool(_)) => BOOLEAN_NAME.to_owned(),
        Some(Value::Null | Value::Array(_) | Value::Object(_)) => return Err(NAME_REQUIRED),
    };
    TaskName::new(text).map_err(|_| NAME_REQUIRED)
}

fn parse_cost(raw: Option<&Value>) -> Result<Cost, &'static str> {
    let text = match raw {
        None | Some(Value::Null) => return Err(COST_REQUIRED),
        Some(value) => scalar_text(value).ok_or(COST_INVALID_FORMAT)?,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(COST_REQUIRED);
    }
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| COST_INVALID_FORMAT)?;
    Cost::new(amount).map_err(|_| COST_INVALID_RANGE)
}

fn parse_due_date(raw: Option<&Value>) -> Result<NaiveDate, &'static str> {
    let text = match raw {
        None => return Err(DUE_DATE_REQUIRED),
        Some(value) if is_blank_value(value) => return Err(DUE_DATE_REQUIRED),
        Some(Value::String(text)) => text,
        Some(_) => return Err(DUE_DATE_INVALID_FORMAT),
    };
    let date =
        NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| DUE_DATE_INVALID_FORMAT)?;
    // chrono accepts unpadded fields; only the canonical form is allowed.
    if date.format(DATE_FORMAT).to_string() != *text {
        return Err(DUE_DATE_INVALID_FORMAT);
    }
    Ok(date)
}

fn parse_order(raw: Option<&Value>) -> Result<PresentationOrder, &'static str> {
    let value = match raw {
        Some(Value::Number(number)) => number
            .as_i64()
            .and_then(|whole| i32::try_from(whole).ok()),
        Some(Value::String(text)) => text.trim().parse::<i32>().ok(),
        _ => None,
    };
    value
        .map(PresentationOrder::new)
        .ok_or(ORDER_INVALID_FORMAT)
}
