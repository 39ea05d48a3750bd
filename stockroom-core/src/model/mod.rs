//! Backend entities
//!
//! Serde types mirroring the JSON the backend exchanges (camelCase keys).
//! Positional attribute slots are flattened into the master DTOs through
//! [`PositionalAttributes`](crate::fields::PositionalAttributes).

pub mod lookup;
pub mod product;
pub mod vendor;

use serde::{Deserialize, Deserializer};

pub use lookup::{
    Language, ProductCategory, ProductClassification, ProductGroup, ProductType, SalesStatus,
    Uom, UomDimension,
};
pub use product::{ProductMasterDto, ProductMasterUomDto, UomUpdate};
pub use vendor::{BankDetailDto, BankUpdate, TaxInformationDto, TaxUpdate, VendorDto};

/// Decode `null` the same way as an absent key
///
/// The backend sends `null` for unset scalars and empty collections.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
