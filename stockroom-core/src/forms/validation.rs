//! Client-side validation
//!
//! Failures are keyed by field path (`productCode`, `uoms[1].uomId`,
//! `dropDown2`) so they can be shown inline next to the offending input.

use crate::fields::{AttributeSet, RowFields, RowGroup};
use std::collections::BTreeMap;

/// Field path to message
#[derive(Debug, Clone, Default, PartialEq, thiserror::Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first message for a field wins
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` when nothing was recorded
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Require a non-blank value
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        }
    }

    pub fn require_some<T>(&mut self, field: &str, value: Option<T>) {
        if value.is_none() {
            self.add(field, "This field is required");
        }
    }

    /// Run `check` on every row, prefixing paths with `group[i].`
    pub fn rows<F, C>(&mut self, group: &str, rows: &RowGroup<F>, mut check: C)
    where
        F: RowFields,
        C: FnMut(&F, &mut RowErrors<'_>),
    {
        for (index, fields) in rows.fields().enumerate() {
            let mut row = RowErrors { errors: self, prefix: format!("{}[{}]", group, index) };
            check(fields, &mut row);
        }
    }

    /// Dropdown attributes must hold one of their options
    pub fn dropdown_choices(&mut self, attributes: &AttributeSet) {
        for attribute in attributes.drop_downs.fields() {
            let Some(value) = attribute.value.as_text() else {
                continue;
            };
            if !attribute.options.is_empty() && !attribute.options.iter().any(|o| o == value) {
                self.add(attribute.name.clone(), format!("'{}' is not an available option", value));
            }
        }
    }
}

/// Errors of one row, recorded under `group[i].field`
pub struct RowErrors<'a> {
    errors: &'a mut ValidationErrors,
    prefix: String,
}

impl RowErrors<'_> {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(format!("{}.{}", self.prefix, field), message);
    }

    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        }
    }

    pub fn require_some<T>(&mut self, field: &str, value: Option<T>) {
        if value.is_none() {
            self.add(field, "This field is required");
        }
    }
}
