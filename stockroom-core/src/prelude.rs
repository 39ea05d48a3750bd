//! Common imports for Stockroom front ends
//!
//! ```rust,ignore
//! use stockroom_core::prelude::*;
//! ```

pub use crate::app::{App, AppCommand, AppEvent, AppHandle};
pub use crate::cache::{QueryKey, Scope};
pub use crate::config::StockroomConfig;
pub use crate::coordinator::{CacheCoordinator, CoordinatorConfig, Operation, Resource, Subscription};
pub use crate::fields::{
    AttributeKind, AttributeSet, AttributeUpdate, AttributeValue, RowChange, RowGroup, RowId,
};
pub use crate::forms::{
    FormController, FormModel, FormMode, ProductMasterDraft, SubmitOutcome, ValidationErrors,
    VendorDraft,
};
pub use crate::logging::{init_logging, LoggingConfig};
pub use crate::model::{
    BankDetailDto, Language, ProductCategory, ProductGroup, ProductMasterDto, ProductMasterUomDto,
    ProductType, SalesStatus, TaxInformationDto, Uom, UomDimension, VendorDto,
};
pub use crate::notify::{Level, Notification, NotificationCenter};
pub use crate::session::{Credentials, Density, Preferences, Session, Theme};
pub use crate::transport::{ApiError, HttpTransport, Transport};
