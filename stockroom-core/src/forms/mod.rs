//! Form submission
//!
//! A [`FormController`] owns one draft of a master entity and drives it
//! through `Empty -> Editing -> Submitting -> (Empty | Editing)`:
//!
//! - [`FormModel::build_dto`] flattens the draft: scalars pass through,
//!   attribute groups map to positional slots by position, row groups become
//!   ordered nested arrays
//! - [`FormModel::hydrate`] is the inverse for edit mode
//! - [`FormController::submit`] validates, refuses to double-submit, issues
//!   the create or update through the coordinator and reports the outcome as
//!   a notification
//!
//! The draft is reset after a successful submit and preserved after a failed
//! one.

mod controller;
pub mod product_master;
pub mod validation;
pub mod vendor;

pub use controller::{FormController, SubmitOutcome};
pub use product_master::ProductMasterDraft;
pub use validation::{RowErrors, ValidationErrors};
pub use vendor::VendorDraft;

use crate::config::FormsConfig;
use crate::coordinator::Resource;
use crate::fields::DEFAULT_MAX_ROWS;
use crate::transport::ApiError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Settings shared by every draft of a form
#[derive(Debug, Clone, PartialEq)]
pub struct FormSettings {
    /// Capacity of each row group
    pub max_rows: usize,
    /// Choices offered by dropdown attributes
    pub dropdown_options: Vec<String>,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self { max_rows: DEFAULT_MAX_ROWS, dropdown_options: Vec::new() }
    }
}

impl FormSettings {
    pub fn from_config(config: &FormsConfig) -> Self {
        Self { max_rows: config.max_rows, dropdown_options: config.dropdown_options.clone() }
    }

    pub fn with_dropdown_options(mut self, options: Vec<String>) -> Self {
        self.dropdown_options = options;
        self
    }
}

/// A draft that can be submitted as one backend entity
pub trait FormModel: Clone + Send + Sync + 'static {
    /// Wire shape of the entity
    type Dto: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Resource the draft is written to
    const RESOURCE: Resource;

    /// Display name used in notifications
    const LABEL: &'static str;

    /// Empty draft for add mode
    fn empty(settings: &FormSettings) -> Self;

    /// Flatten the draft into the wire shape
    fn build_dto(&self) -> Self::Dto;

    /// Rebuild a draft from a fetched entity
    fn hydrate(dto: &Self::Dto, settings: &FormSettings) -> Self;

    /// Client-side checks run before anything is sent
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Whether submitting creates or updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Add,
    Edit {
        id: i64,
    },
}

/// Draft lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftPhase {
    #[default]
    Empty,
    Editing,
    Submitting,
}

/// Busy flag and last failure of a draft's submissions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionState {
    pub in_flight: bool,
    pub last_error: Option<ApiError>,
}
