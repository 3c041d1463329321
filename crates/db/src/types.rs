use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Writable attributes of a product variant, in form order.
///
/// Form schemas, multipart parsing and validation error keys are all derived
/// from this enum rather than from a separate list of names.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VariantField {
    ProductId,
    ColorId,
    SizeId,
    Stock,
    Sku,
    Images,
    Weight,
    Height,
    Width,
    Depth,
}

impl VariantField {
    pub fn label(self) -> &'static str {
        match self {
            VariantField::ProductId => "Product",
            VariantField::ColorId => "Color",
            VariantField::SizeId => "Size",
            VariantField::Stock => "Stock",
            VariantField::Sku => "SKU",
            VariantField::Images => "Images",
            VariantField::Weight => "Weight",
            VariantField::Height => "Height",
            VariantField::Width => "Width",
            VariantField::Depth => "Depth",
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumString, Display, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VariantSortField {
    ProductName,
    ColorName,
    SizeName,
    Stock,
    Weight,
    Height,
    Width,
    Depth,
    #[default]
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, Display, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}
