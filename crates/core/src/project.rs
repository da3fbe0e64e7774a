//! Project input DTOs and the rules they must satisfy before persistence.
//!
//! Name length and date ordering are checked here with `validator`; the
//! repository layer never sees input that breaks them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{CoreError, FieldError};

/// Maximum project name length, in characters.
pub const MAX_NAME_LENGTH: usize = 32;

const DATE_ORDER_CODE: &str = "date_range_order";
const DATE_ORDER_MESSAGE: &str = "End date cannot be earlier than start date";

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Body of the `data` form part on project creation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "create_dates_in_order"))]
pub struct ProjectCreate {
    #[validate(length(max = 32, message = "String should have at most 32 characters"))]
    pub name: String,
    pub date_range: DateRange,
    #[serde(default)]
    pub description: String,
}

/// Body of the `data` form part on project update. Absent and `null` fields
/// both mean "leave unchanged".
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "update_dates_in_order"))]
pub struct ProjectUpdate {
    #[validate(length(max = 32, message = "String should have at most 32 characters"))]
    pub name: Option<String>,
    pub date_range: Option<DateRange>,
    pub description: Option<String>,
}

/// Field-by-field changes applied to a stored project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<ProjectUpdate> for ProjectPatch {
    fn from(update: ProjectUpdate) -> Self {
        Self {
            name: update.name,
            description: update.description,
            start_date: update.date_range.map(|r| r.start),
            end_date: update.date_range.map(|r| r.end),
        }
    }
}

impl ProjectCreate {
    /// Run the declared rules, reporting failures under `loc`.
    pub fn validated(self, loc: &[&str]) -> Result<Self, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(field_errors(&e, loc)))?;
        Ok(self)
    }
}

impl ProjectUpdate {
    /// Run the declared rules, reporting failures under `loc`.
    pub fn validated(self, loc: &[&str]) -> Result<Self, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(field_errors(&e, loc)))?;
        Ok(self)
    }
}

fn date_order_error() -> ValidationError {
    ValidationError::new(DATE_ORDER_CODE).with_message(DATE_ORDER_MESSAGE.into())
}

fn create_dates_in_order(input: &ProjectCreate) -> Result<(), ValidationError> {
    if input.date_range.end < input.date_range.start {
        return Err(date_order_error());
    }
    Ok(())
}

fn update_dates_in_order(input: &ProjectUpdate) -> Result<(), ValidationError> {
    match input.date_range {
        Some(range) if range.end < range.start => Err(date_order_error()),
        _ => Ok(()),
    }
}

/// Flatten `validator` output into [`FieldError`]s, sorted by location.
///
/// Struct-level (schema) failures are reported against `date_range.end`,
/// the only cross-field rule on these DTOs.
fn field_errors(errors: &ValidationErrors, loc: &[&str]) -> Vec<FieldError> {
    let mut out = Vec::new();

    for (field, failures) in errors.field_errors() {
        let field: &str = &field;
        let mut path: Vec<&str> = loc.to_vec();
        if field == "__all__" {
            path.extend(["date_range", "end"]);
        } else {
            path.push(field);
        }

        for failure in failures.iter() {
            let msg = failure
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", failure.code));
            out.push(FieldError::new(failure.code.to_string(), &path, msg));
        }
    }

    out.sort_by(|a, b| a.loc.cmp(&b.loc));
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
