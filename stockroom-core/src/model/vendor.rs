//! Vendor wire format

use crate::fields::{PositionalAttributes, RowFields};
use super::null_as_default;
use serde::{Deserialize, Serialize};

/// Vendor as the backend sends and accepts it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VendorDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub vendor_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub vendor_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(flatten)]
    pub attributes: PositionalAttributes,
    #[serde(deserialize_with = "null_as_default")]
    pub tax_information_dto: Vec<TaxInformationDto>,
    #[serde(deserialize_with = "null_as_default")]
    pub bank_detail_dto: Vec<BankDetailDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxInformationDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub tax_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tax_number: String,
    pub tax_percentage: Option<f64>,
}

impl TaxInformationDto {
    /// Nothing entered yet
    pub fn is_blank(&self) -> bool {
        self.tax_type.trim().is_empty()
            && self.tax_number.trim().is_empty()
            && self.tax_percentage.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaxUpdate {
    TaxType(String),
    TaxNumber(String),
    Percentage(Option<f64>),
}

impl RowFields for TaxInformationDto {
    type Update = TaxUpdate;

    fn apply(&mut self, update: TaxUpdate) {
        match update {
            TaxUpdate::TaxType(value) => self.tax_type = value,
            TaxUpdate::TaxNumber(value) => self.tax_number = value,
            TaxUpdate::Percentage(value) => self.tax_percentage = value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankDetailDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub bank_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub account_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub account_holder_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub branch_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ifsc_code: String,
}

impl BankDetailDto {
    pub fn is_blank(&self) -> bool {
        [
            &self.bank_name,
            &self.account_number,
            &self.account_holder_name,
            &self.branch_name,
            &self.ifsc_code,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BankUpdate {
    BankName(String),
    AccountNumber(String),
    AccountHolderName(String),
    BranchName(String),
    IfscCode(String),
}

impl RowFields for BankDetailDto {
    type Update = BankUpdate;

    fn apply(&mut self, update: BankUpdate) {
        match update {
            BankUpdate::BankName(value) => self.bank_name = value,
            BankUpdate::AccountNumber(value) => self.account_number = value,
            BankUpdate::AccountHolderName(value) => self.account_holder_name = value,
            BankUpdate::BranchName(value) => self.branch_name = value,
            BankUpdate::IfscCode(value) => self.ifsc_code = value,
        }
    }
}
