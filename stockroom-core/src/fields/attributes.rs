//! Typed dynamic attributes
//!
//! Attribute groups are row groups whose elements carry a name and label
//! derived from their position. After any add or delete the names form the
//! dense run `{prefix}1..k`, which is what positional DTO assembly relies on.

use super::row::{RowFields, RowGroup};
use super::slots::{AttributeSlots, DateSlot, DropDownSlot, NumberSlot, TextSlot, SLOT_COUNT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of a dynamic attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Text,
    Number,
    Date,
    Dropdown,
}

impl AttributeKind {
    /// Prefix of the element names (`attribute1`, `number2`, ...)
    pub fn name_prefix(self) -> &'static str {
        match self {
            AttributeKind::Text => "attribute",
            AttributeKind::Number => "number",
            AttributeKind::Date => "date",
            AttributeKind::Dropdown => "dropDown",
        }
    }

    /// Prefix of the display labels (`Attribute 1`, ...)
    pub fn label_prefix(self) -> &'static str {
        match self {
            AttributeKind::Text => "Attribute",
            AttributeKind::Number => "Number",
            AttributeKind::Date => "Date",
            AttributeKind::Dropdown => "Drop Down",
        }
    }
}

/// Value held by an attribute
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AttributeValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl AttributeValue {
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Empty => true,
            AttributeValue::Text(s) => s.trim().is_empty(),
            AttributeValue::Number(_) | AttributeValue::Date(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) if !s.trim().is_empty() => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            AttributeValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// One dynamic attribute
#[derive(Debug, Clone, PartialEq)]
pub struct TypedAttribute {
    pub kind: AttributeKind,
    pub name: String,
    pub label: String,
    pub value: AttributeValue,
    /// Choices for dropdown attributes, in display order
    pub options: Vec<String>,
}

impl TypedAttribute {
    /// Empty attribute used as the template for new elements
    pub fn template(kind: AttributeKind) -> Self {
        let mut attribute = Self {
            kind,
            name: String::new(),
            label: String::new(),
            value: AttributeValue::Empty,
            options: Vec::new(),
        };
        attribute.relabel(0);
        attribute
    }

    pub fn with_value(mut self, value: AttributeValue) -> Self {
        self.value = value;
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}

/// Update operations on a [`TypedAttribute`]
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeUpdate {
    Value(AttributeValue),
    Clear,
    Options(Vec<String>),
}

impl RowFields for TypedAttribute {
    type Update = AttributeUpdate;

    fn apply(&mut self, update: AttributeUpdate) {
        match update {
            AttributeUpdate::Value(value) => self.value = value,
            AttributeUpdate::Clear => self.value = AttributeValue::Empty,
            AttributeUpdate::Options(options) => self.options = options,
        }
    }

    fn relabel(&mut self, position: usize) {
        self.name = format!("{}{}", self.kind.name_prefix(), position + 1);
        self.label = format!("{} {}", self.kind.label_prefix(), position + 1);
    }
}

/// Group of attributes sharing one kind, capped at the backend slot count
pub type AttributeGroup = RowGroup<TypedAttribute>;

/// Create an attribute group for `kind`
pub fn attribute_group(kind: AttributeKind) -> AttributeGroup {
    RowGroup::with_max_rows(TypedAttribute::template(kind), SLOT_COUNT)
}

/// Positional form of an [`AttributeSet`] as the backend stores it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionalAttributes {
    #[serde(flatten)]
    pub texts: AttributeSlots<TextSlot, String>,
    #[serde(flatten)]
    pub numbers: AttributeSlots<NumberSlot, f64>,
    #[serde(flatten)]
    pub dates: AttributeSlots<DateSlot, NaiveDate>,
    #[serde(flatten)]
    pub drop_downs: AttributeSlots<DropDownSlot, String>,
}

/// The four attribute groups of a draft
#[derive(Debug, Clone)]
pub struct AttributeSet {
    pub texts: AttributeGroup,
    pub numbers: AttributeGroup,
    pub dates: AttributeGroup,
    pub drop_downs: AttributeGroup,
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self {
            texts: attribute_group(AttributeKind::Text),
            numbers: attribute_group(AttributeKind::Number),
            dates: attribute_group(AttributeKind::Date),
            drop_downs: attribute_group(AttributeKind::Dropdown),
        }
    }
}

impl AttributeSet {
    pub fn group(&self, kind: AttributeKind) -> &AttributeGroup {
        match kind {
            AttributeKind::Text => &self.texts,
            AttributeKind::Number => &self.numbers,
            AttributeKind::Date => &self.dates,
            AttributeKind::Dropdown => &self.drop_downs,
        }
    }

    pub fn group_mut(&mut self, kind: AttributeKind) -> &mut AttributeGroup {
        match kind {
            AttributeKind::Text => &mut self.texts,
            AttributeKind::Number => &mut self.numbers,
            AttributeKind::Date => &mut self.dates,
            AttributeKind::Dropdown => &mut self.drop_downs,
        }
    }

    /// Dropdown choices offered by every current and future dropdown element
    pub fn with_dropdown_options(mut self, options: Vec<String>) -> Self {
        let template = TypedAttribute::template(AttributeKind::Dropdown).with_options(options);
        let values: Vec<_> =
            self.drop_downs.fields().map(|attribute| attribute.value.clone()).collect();
        self.drop_downs = RowGroup::from_fields(
            template.clone(),
            SLOT_COUNT,
            values.into_iter().map(|value| template.clone().with_value(value)),
        );
        self
    }

    /// Flatten every group to positional slots, by position
    pub fn to_positional(&self) -> PositionalAttributes {
        PositionalAttributes {
            texts: AttributeSlots::from_list(
                self.texts.fields().map(|a| a.value.as_text().map(str::to_string)),
            ),
            numbers: AttributeSlots::from_list(self.numbers.fields().map(|a| a.value.as_number())),
            dates: AttributeSlots::from_list(self.dates.fields().map(|a| a.value.as_date())),
            drop_downs: AttributeSlots::from_list(
                self.drop_downs.fields().map(|a| a.value.as_text().map(str::to_string)),
            ),
        }
    }

    /// Rebuild the groups from positional slots
    ///
    /// Each group gets one element per slot up to its highest filled slot,
    /// empty slots in between included, and always at least one.
    pub fn from_positional(positional: &PositionalAttributes, dropdown_options: &[String]) -> Self {
        fn build<T, F>(kind: AttributeKind, list: Vec<Option<T>>, to_value: F) -> AttributeGroup
        where
            F: Fn(T) -> AttributeValue,
        {
            let template = TypedAttribute::template(kind);
            let elements: Vec<_> = list
                .into_iter()
                .map(|value| {
                    template.clone().with_value(value.map(&to_value).unwrap_or_default())
                })
                .collect();
            RowGroup::from_fields(template, SLOT_COUNT, elements)
        }

        let set = Self {
            texts: build(AttributeKind::Text, positional.texts.to_list(), AttributeValue::Text),
            numbers: build(
                AttributeKind::Number,
                positional.numbers.to_list(),
                AttributeValue::Number,
            ),
            dates: build(AttributeKind::Date, positional.dates.to_list(), AttributeValue::Date),
            drop_downs: build(
                AttributeKind::Dropdown,
                positional.drop_downs.to_list(),
                AttributeValue::Text,
            ),
        };

        if dropdown_options.is_empty() {
            set
        } else {
            set.with_dropdown_options(dropdown_options.to_vec())
        }
    }

    /// Back to one empty element per group
    pub fn reset(&mut self) {
        self.texts.reset();
        self.numbers.reset();
        self.dates.reset();
        self.drop_downs.reset();
    }
}
