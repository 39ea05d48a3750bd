//! Vendor draft

use super::{FormModel, FormSettings, ValidationErrors};
use crate::coordinator::Resource;
use crate::fields::{AttributeSet, RowGroup};
use crate::model::{BankDetailDto, TaxInformationDto, VendorDto};

#[derive(Debug, Clone)]
pub struct VendorDraft {
    pub vendor_code: String,
    pub vendor_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub attributes: AttributeSet,
    pub taxes: RowGroup<TaxInformationDto>,
    pub banks: RowGroup<BankDetailDto>,
    pub id: Option<i64>,
}

impl FormModel for VendorDraft {
    type Dto = VendorDto;
    const RESOURCE: Resource = Resource::Vendor;
    const LABEL: &'static str = "Vendor";

    fn empty(settings: &FormSettings) -> Self {
        Self {
            vendor_code: String::new(),
            vendor_name: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            attributes: AttributeSet::default()
                .with_dropdown_options(settings.dropdown_options.clone()),
            taxes: RowGroup::with_max_rows(TaxInformationDto::default(), settings.max_rows),
            banks: RowGroup::with_max_rows(BankDetailDto::default(), settings.max_rows),
            id: None,
        }
    }

    fn build_dto(&self) -> VendorDto {
        VendorDto {
            id: self.id,
            vendor_code: self.vendor_code.trim().to_string(),
            vendor_name: self.vendor_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.clone(),
            attributes: self.attributes.to_positional(),
            tax_information_dto: self.taxes.fields().cloned().collect(),
            bank_detail_dto: self.banks.fields().cloned().collect(),
        }
    }

    fn hydrate(dto: &VendorDto, settings: &FormSettings) -> Self {
        Self {
            vendor_code: dto.vendor_code.clone(),
            vendor_name: dto.vendor_name.clone(),
            email: dto.email.clone(),
            phone: dto.phone.clone(),
            address: dto.address.clone(),
            attributes: AttributeSet::from_positional(&dto.attributes, &settings.dropdown_options),
            taxes: RowGroup::from_fields(
                TaxInformationDto::default(),
                settings.max_rows,
                dto.tax_information_dto.iter().cloned(),
            ),
            banks: RowGroup::from_fields(
                BankDetailDto::default(),
                settings.max_rows,
                dto.bank_detail_dto.iter().cloned(),
            ),
            id: dto.id,
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("vendorCode", &self.vendor_code);
        errors.require("vendorName", &self.vendor_name);
        let email = self.email.trim();
        if !email.is_empty() && !is_plausible_email(email) {
            errors.add("email", "Enter a valid email address");
        }

        // Untouched rows are allowed; partly filled ones must be complete
        errors.rows("taxes", &self.taxes, |tax, row| {
            if tax.is_blank() {
                return;
            }
            row.require("taxNumber", &tax.tax_number);
            if let Some(percentage) = tax.tax_percentage {
                if !(0.0..=100.0).contains(&percentage) {
                    row.add("taxPercentage", "Tax percentage must be between 0 and 100");
                }
            }
        });
        errors.rows("banks", &self.banks, |bank, row| {
            if bank.is_blank() {
                return;
            }
            row.require("bankName", &bank.bank_name);
            row.require("accountNumber", &bank.account_number);
        });

        errors.dropdown_choices(&self.attributes);
        errors.into_result()
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BankUpdate, TaxUpdate};
    use serde_json::json;

    fn three_tax_rows() -> VendorDto {
        serde_json::from_value(json!({
            "id": 5,
            "vendorCode": "V-5",
            "vendorName": "Acme Supplies",
            "taxInformationDto": [
                {"id": 1, "taxType": "GST", "taxNumber": "T-1", "taxPercentage": 18.0},
                {"id": 2, "taxType": "CESS", "taxNumber": "T-2", "taxPercentage": 1.0},
                {"id": 3, "taxType": "TDS", "taxNumber": "T-3", "taxPercentage": 2.0}
            ],
            "bankDetailDto": [{"id": 9, "bankName": "First", "accountNumber": "001"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_delete_middle_tax_row_keeps_order() {
        let mut draft = VendorDraft::hydrate(&three_tax_rows(), &FormSettings::default());
        let middle = draft.taxes.rows()[1].id;

        assert!(draft.taxes.delete_row(middle).is_applied());

        let ids: Vec<_> = draft.taxes.rows().iter().map(|row| row.id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let dto = draft.build_dto();
        let numbers: Vec<_> =
            dto.tax_information_dto.iter().map(|t| t.tax_number.as_str()).collect();
        assert_eq!(numbers, vec!["T-1", "T-3"]);
        assert_eq!(dto.bank_detail_dto.len(), 1);
    }

    #[test]
    fn test_blank_rows_pass_validation() {
        let mut draft = VendorDraft::empty(&FormSettings::default());
        draft.vendor_code = "V-1".into();
        draft.vendor_name = "Acme".into();
        assert_eq!(draft.validate(), Ok(()));
    }

    #[test]
    fn test_partial_rows_are_checked() {
        let mut draft = VendorDraft::empty(&FormSettings::default());
        draft.vendor_code = "V-1".into();
        draft.vendor_name = "Acme".into();
        draft.email = "not-an-email".into();
        let tax = draft.taxes.rows()[0].id;
        draft.taxes.update_field(tax, TaxUpdate::Percentage(Some(140.0)));
        let bank = draft.banks.rows()[0].id;
        draft.banks.update_field(bank, BankUpdate::BranchName("Main".into()));

        let errors = draft.validate().unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec![
                "banks[0].accountNumber",
                "banks[0].bankName",
                "email",
                "taxes[0].taxNumber",
                "taxes[0].taxPercentage",
            ]
        );
    }

    #[test]
    fn test_hydrate_without_rows_falls_back_to_one() {
        let draft = VendorDraft::hydrate(&VendorDto::default(), &FormSettings::default());
        assert_eq!(draft.taxes.len(), 1);
        assert_eq!(draft.banks.len(), 1);
    }

    #[test]
    fn test_hydrate_accepts_null_fields() {
        let dto: VendorDto = serde_json::from_value(json!({
            "id": 4,
            "vendorCode": "V-4",
            "vendorName": "Acme",
            "email": null,
            "phone": null,
            "address": null,
            "attribute1": null,
            "taxInformationDto": null,
            "bankDetailDto": [{"bankName": "First", "accountNumber": null}]
        }))
        .unwrap();

        let draft = VendorDraft::hydrate(&dto, &FormSettings::default());

        assert_eq!(draft.vendor_code, "V-4");
        assert!(draft.email.is_empty());
        assert_eq!(draft.taxes.len(), 1);
        assert!(draft.taxes.rows()[0].fields.is_blank());
        assert_eq!(draft.banks.rows()[0].fields.bank_name, "First");
        assert!(draft.banks.rows()[0].fields.account_number.is_empty());
    }
}
