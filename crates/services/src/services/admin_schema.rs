//! Form and table descriptions the admin panel renders for product variants.

use db::types::{VariantField, VariantSortField};
use serde::Serialize;
use strum::IntoEnumIterator;

use super::variant_intake::MAX_SKU_LENGTH;

pub const ACCEPTED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormInput {
    Select,
    Number,
    Text,
    FileUpload,
}

/// Where a select input loads its options from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionSource {
    Products,
    Colors,
    Sizes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: VariantField,
    pub label: &'static str,
    pub input: FormInput,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<&'static str>,
    pub multiple: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_kb: Option<u64>,
}

impl FormField {
    fn new(name: VariantField, input: FormInput) -> Self {
        Self {
            name,
            label: name.label(),
            input,
            required: false,
            options: None,
            default: None,
            max_length: None,
            step: None,
            multiple: false,
            accept: Vec::new(),
            max_kb: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn select(name: VariantField, source: OptionSource) -> Self {
        let mut field = Self::new(name, FormInput::Select).required();
        field.options = Some(source);
        field
    }

    fn dimension(name: VariantField) -> Self {
        let mut field = Self::new(name, FormInput::Number);
        field.step = Some("0.01");
        field
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnFormat {
    Text,
    Numeric,
    DateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    /// Key of the value in a list row, e.g. `product_name`.
    pub key: &'static str,
    pub label: &'static str,
    pub format: ColumnFormat,
    pub searchable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<VariantSortField>,
    pub toggleable: bool,
    pub hidden_by_default: bool,
}

impl TableColumn {
    fn new(key: &'static str, label: &'static str, format: ColumnFormat) -> Self {
        Self {
            key,
            label,
            format,
            searchable: false,
            sort: None,
            toggleable: false,
            hidden_by_default: false,
        }
    }

    fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    fn sortable(mut self, sort: VariantSortField) -> Self {
        self.sort = Some(sort);
        self
    }

    fn hidden(mut self) -> Self {
        self.toggleable = true;
        self.hidden_by_default = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableAction {
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSchema {
    pub columns: Vec<TableColumn>,
    pub row_actions: Vec<TableAction>,
    pub bulk_actions: Vec<TableAction>,
    pub default_sort: VariantSortField,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminSchema {
    pub form: Vec<FormField>,
    pub table: TableSchema,
}

pub fn admin_schema(max_image_kb: u64) -> AdminSchema {
    AdminSchema {
        form: form_schema(max_image_kb),
        table: table_schema(),
    }
}

/// One input per writable attribute, in form order.
pub fn form_schema(max_image_kb: u64) -> Vec<FormField> {
    VariantField::iter()
        .map(|name| match name {
            VariantField::ProductId => FormField::select(name, OptionSource::Products),
            VariantField::ColorId => FormField::select(name, OptionSource::Colors),
            VariantField::SizeId => FormField::select(name, OptionSource::Sizes),
            VariantField::Stock => {
                let mut field = FormField::new(name, FormInput::Number).required();
                field.default = Some(0);
                field.step = Some("1");
                field
            }
            VariantField::Sku => {
                let mut field = FormField::new(name, FormInput::Text).required();
                field.max_length = Some(MAX_SKU_LENGTH);
                field
            }
            VariantField::Images => {
                let mut field = FormField::new(name, FormInput::FileUpload);
                field.multiple = true;
                field.accept = ACCEPTED_IMAGE_TYPES.to_vec();
                field.max_kb = Some(max_image_kb);
                field
            }
            VariantField::Weight
            | VariantField::Height
            | VariantField::Width
            | VariantField::Depth => FormField::dimension(name),
        })
        .collect()
}

pub fn table_schema() -> TableSchema {
    TableSchema {
        columns: vec![
            TableColumn::new("product_name", "Product", ColumnFormat::Text)
                .searchable()
                .sortable(VariantSortField::ProductName),
            TableColumn::new("color_name", "Color", ColumnFormat::Text)
                .searchable()
                .sortable(VariantSortField::ColorName),
            TableColumn::new("size_name", "Size", ColumnFormat::Text)
                .searchable()
                .sortable(VariantSortField::SizeName),
            TableColumn::new("stock", "Stock", ColumnFormat::Numeric)
                .sortable(VariantSortField::Stock),
            TableColumn::new("sku", "SKU", ColumnFormat::Text).searchable(),
            TableColumn::new("weight", "Weight", ColumnFormat::Numeric)
                .sortable(VariantSortField::Weight),
            TableColumn::new("height", "Height", ColumnFormat::Numeric)
                .sortable(VariantSortField::Height),
            TableColumn::new("width", "Width", ColumnFormat::Numeric)
                .sortable(VariantSortField::Width),
            TableColumn::new("depth", "Depth", ColumnFormat::Numeric)
                .sortable(VariantSortField::Depth),
            TableColumn::new("created_at", "Created at", ColumnFormat::DateTime)
                .sortable(VariantSortField::CreatedAt)
                .hidden(),
            TableColumn::new("updated_at", "Updated at", ColumnFormat::DateTime)
                .sortable(VariantSortField::UpdatedAt)
                .hidden(),
        ],
        row_actions: vec![TableAction::Delete],
        bulk_actions: vec![TableAction::Delete],
        default_sort: VariantSortField::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_covers_every_field_in_order() {
        let form = form_schema(2048);
        let names: Vec<VariantField> = form.iter().map(|field| field.name).collect();
        assert_eq!(names, VariantField::iter().collect::<Vec<_>>());

        let required: Vec<&str> = form
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name.as_ref())
            .collect();
        assert_eq!(required, vec!["product_id", "color_id", "size_id", "stock", "sku"]);
    }

    #[test]
    fn image_upload_carries_limits() {
        let form = form_schema(512);
        let images = form
            .iter()
            .find(|field| field.name == VariantField::Images)
            .unwrap();
        assert!(images.multiple);
        assert_eq!(images.max_kb, Some(512));
        assert_eq!(images.accept, ACCEPTED_IMAGE_TYPES.to_vec());
    }

    #[test]
    fn schema_serializes_for_the_admin_panel() {
        let json = serde_json::to_value(admin_schema(2048)).unwrap();
        assert_eq!(json["form"][0]["name"], "product_id");
        assert_eq!(json["form"][0]["options"], "products");
        assert_eq!(json["form"][4]["label"], "SKU");
        assert_eq!(json["form"][4]["max_length"], 255);
        assert_eq!(json["table"]["columns"][0]["key"], "product_name");
        assert_eq!(json["table"]["columns"][0]["sort"], "product_name");
        assert_eq!(json["table"]["bulk_actions"][0], "delete");
        assert_eq!(json["table"]["default_sort"], "created_at");
    }

    #[test]
    fn timestamps_are_hidden_by_default() {
        let table = table_schema();
        let hidden: Vec<&str> = table
            .columns
            .iter()
            .filter(|column| column.hidden_by_default)
            .map(|column| column.key)
            .collect();
        assert_eq!(hidden, vec!["created_at", "updated_at"]);
    }
}
