//! Repeatable field groups
//!
//! Forms carry ordered collections of uniform sub-records: UOM lines, tax
//! records, bank records and typed dynamic attributes. This module provides
//! the generic engine behind all of them:
//!
//! - [`RowGroup`] - add-at-index, delete with a minimum of one row,
//!   immutable updates and observer notification
//! - [`AttributeGroup`] - row groups of [`TypedAttribute`]s whose names are
//!   re-derived after every add/delete
//! - [`AttributeSlots`] - the fixed five-slot positional form the backend
//!   stores attributes in
//!
//! None of these operations fail: rejected changes (adding at capacity,
//! deleting the last row) leave the group untouched and are reported as a
//! [`RowChange`] variant.

pub mod attributes;
pub mod row;
pub mod slots;

pub use attributes::{
    attribute_group, AttributeGroup, AttributeKind, AttributeSet, AttributeUpdate,
    AttributeValue, PositionalAttributes, TypedAttribute,
};
pub use row::{Row, RowChange, RowFields, RowGroup, RowId, RowObserver, DEFAULT_MAX_ROWS};
pub use slots::{
    AttributeSlots, DateSlot, DropDownSlot, NumberSlot, SlotPrefix, TextSlot, SLOT_COUNT,
};
