//! Product master wire format

use crate::fields::{PositionalAttributes, RowFields};
use super::null_as_default;
use serde::{Deserialize, Serialize};

/// Product master as the backend sends and accepts it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductMasterDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub product_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub product_name: String,
    pub product_type_id: Option<i64>,
    pub product_group_id: Option<i64>,
    pub product_category_id: Option<i64>,
    pub language_id: Option<i64>,
    pub sales_status_id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    /// `attribute1..5`, `number1..5`, `date1..5`, `dropDown1..5`
    #[serde(flatten)]
    pub attributes: PositionalAttributes,
    #[serde(deserialize_with = "null_as_default")]
    pub product_master_uom_dto: Vec<ProductMasterUomDto>,
}

/// One UOM line of a product master
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductMasterUomDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub uom_dimension_id: Option<i64>,
    pub uom_id: Option<i64>,
    pub conversion_factor: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_base_uom: bool,
}

/// Update operations on a UOM line
#[derive(Debug, Clone, PartialEq)]
pub enum UomUpdate {
    /// Switch dimension; the chosen UOM belongs to the old one and is cleared
    Dimension(Option<i64>),
    Uom(Option<i64>),
    ConversionFactor(Option<f64>),
    BaseUom(bool),
}

impl RowFields for ProductMasterUomDto {
    type Update = UomUpdate;

    fn apply(&mut self, update: UomUpdate) {
        match update {
            UomUpdate::Dimension(dimension) => {
                if self.uom_dimension_id != dimension {
                    self.uom_id = None;
                }
                self.uom_dimension_id = dimension;
            }
            UomUpdate::Uom(uom) => self.uom_id = uom,
            UomUpdate::ConversionFactor(factor) => self.conversion_factor = factor,
            UomUpdate::BaseUom(base) => self.is_base_uom = base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_changing_dimension_clears_uom() {
        let mut line = ProductMasterUomDto {
            uom_dimension_id: Some(1),
            uom_id: Some(4),
            ..Default::default()
        };
        line.apply(UomUpdate::Dimension(Some(1)));
        assert_eq!(line.uom_id, Some(4));

        line.apply(UomUpdate::Dimension(Some(2)));
        assert_eq!(line.uom_id, None);
        assert_eq!(line.uom_dimension_id, Some(2));
    }

    #[test]
    fn test_dto_reads_positional_attributes() {
        let dto: ProductMasterDto = serde_json::from_value(json!({
            "id": 9,
            "productCode": "P-9",
            "productName": "Hex bolt",
            "attribute1": "steel",
            "number2": 12.5,
            "dropDown1": "M8",
            "productMasterUomDto": [{"uomDimensionId": 1, "uomId": 4, "conversionFactor": 1.0, "isBaseUom": true}]
        }))
        .unwrap();

        assert_eq!(dto.attributes.texts.get(0).map(String::as_str), Some("steel"));
        assert_eq!(dto.attributes.numbers.get(1), Some(&12.5));
        assert_eq!(dto.attributes.drop_downs.get(0).map(String::as_str), Some("M8"));
        assert!(dto.product_master_uom_dto[0].is_base_uom);
    }

    #[test]
    fn test_dto_writes_camel_case() {
        let dto = ProductMasterDto {
            product_code: "P-1".into(),
            product_master_uom_dto: vec![ProductMasterUomDto::default()],
            ..Default::default()
        };
        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["productCode"], "P-1");
        assert!(value.get("id").is_none());
        assert_eq!(value["productMasterUomDto"][0]["isBaseUom"], false);
    }

    #[test]
    fn test_null_scalars_and_lines_decode_as_empty() {
        let dto: ProductMasterDto = serde_json::from_value(json!({
            "productCode": "P-3",
            "productName": null,
            "description": null,
            "productTypeId": null,
            "productMasterUomDto": [{"uomId": 4, "isBaseUom": null}]
        }))
        .unwrap();

        assert!(dto.product_name.is_empty());
        assert!(dto.description.is_empty());
        assert!(!dto.product_master_uom_dto[0].is_base_uom);

        let dto: ProductMasterDto =
            serde_json::from_value(json!({"productMasterUomDto": null})).unwrap();
        assert!(dto.product_master_uom_dto.is_empty());
    }
}
