//! Product master draft

use super::{FormModel, FormSettings, ValidationErrors};
use crate::coordinator::Resource;
use crate::fields::{AttributeSet, RowGroup};
use crate::model::{ProductMasterDto, ProductMasterUomDto};

#[derive(Debug, Clone)]
pub struct ProductMasterDraft {
    pub product_code: String,
    pub product_name: String,
    pub product_type_id: Option<i64>,
    pub product_group_id: Option<i64>,
    pub product_category_id: Option<i64>,
    pub language_id: Option<i64>,
    pub sales_status_id: Option<i64>,
    pub description: String,
    pub attributes: AttributeSet,
    pub uoms: RowGroup<ProductMasterUomDto>,
    /// Backend id when editing an existing product master
    pub id: Option<i64>,
}

impl FormModel for ProductMasterDraft {
    type Dto = ProductMasterDto;
    const RESOURCE: Resource = Resource::ProductMaster;
    const LABEL: &'static str = "Product master";

    fn empty(settings: &FormSettings) -> Self {
        Self {
            product_code: String::new(),
            product_name: String::new(),
            product_type_id: None,
            product_group_id: None,
            product_category_id: None,
            language_id: None,
            sales_status_id: None,
            description: String::new(),
            attributes: AttributeSet::default()
                .with_dropdown_options(settings.dropdown_options.clone()),
            uoms: RowGroup::with_max_rows(ProductMasterUomDto::default(), settings.max_rows),
            id: None,
        }
    }

    fn build_dto(&self) -> ProductMasterDto {
        ProductMasterDto {
            id: self.id,
            product_code: self.product_code.trim().to_string(),
            product_name: self.product_name.trim().to_string(),
            product_type_id: self.product_type_id,
            product_group_id: self.product_group_id,
            product_category_id: self.product_category_id,
            language_id: self.language_id,
            sales_status_id: self.sales_status_id,
            description: self.description.clone(),
            attributes: self.attributes.to_positional(),
            product_master_uom_dto: self.uoms.fields().cloned().collect(),
        }
    }

    fn hydrate(dto: &ProductMasterDto, settings: &FormSettings) -> Self {
        Self {
            product_code: dto.product_code.clone(),
            product_name: dto.product_name.clone(),
            product_type_id: dto.product_type_id,
            product_group_id: dto.product_group_id,
            product_category_id: dto.product_category_id,
            language_id: dto.language_id,
            sales_status_id: dto.sales_status_id,
            description: dto.description.clone(),
            attributes: AttributeSet::from_positional(&dto.attributes, &settings.dropdown_options),
            uoms: RowGroup::from_fields(
                ProductMasterUomDto::default(),
                settings.max_rows,
                dto.product_master_uom_dto.iter().cloned(),
            ),
            id: dto.id,
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("productCode", &self.product_code);
        errors.require("productName", &self.product_name);

        errors.rows("uoms", &self.uoms, |line, row| {
            row.require_some("uomId", line.uom_id);
            match line.conversion_factor {
                None => row.add("conversionFactor", "This field is required"),
                Some(factor) if factor <= 0.0 => {
                    row.add("conversionFactor", "Conversion factor must be greater than zero")
                }
                Some(_) => {}
            }
        });
        if self.uoms.fields().filter(|line| line.is_base_uom).count() > 1 {
            errors.add("uoms", "Only one UOM can be the base UOM");
        }

        errors.dropdown_choices(&self.attributes);
        errors.into_result()
    }
}
