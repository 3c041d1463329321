//! Creation workflow for product variants: validate the submitted form,
//! persist its images, then insert the record.

use std::{collections::BTreeMap, str::FromStr, sync::Arc};

use db::{
    DbErr,
    models::{
        color::Color,
        product::Product,
        product_variant::{CreateProductVariant, ProductVariant, ProductVariantError},
        size::Size,
    },
    types::VariantField,
};
use futures::future::join_all;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use sea_orm::ConnectionTrait;
use serde::Serialize;
use thiserror::Error;

use super::{
    config::StorageConfig,
    image_storage::{ImageStorage, ImageStorageError, UploadedImage},
};

pub const MAX_SKU_LENGTH: usize = 255;

/// Largest magnitude a `decimal(8,2)` column holds.
const MAX_DIMENSION: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

/// Raw values of a creation request, as submitted.
#[derive(Debug, Clone, Default)]
pub struct VariantForm {
    pub product_id: Option<String>,
    pub color_id: Option<String>,
    pub size_id: Option<String>,
    pub stock: Option<String>,
    pub sku: Option<String>,
    pub weight: Option<String>,
    pub height: Option<String>,
    pub width: Option<String>,
    pub depth: Option<String>,
    pub images: Vec<UploadedImage>,
}

impl VariantForm {
    fn slot_mut(&mut self, field: VariantField) -> Option<&mut Option<String>> {
        match field {
            VariantField::ProductId => Some(&mut self.product_id),
            VariantField::ColorId => Some(&mut self.color_id),
            VariantField::SizeId => Some(&mut self.size_id),
            VariantField::Stock => Some(&mut self.stock),
            VariantField::Sku => Some(&mut self.sku),
            VariantField::Weight => Some(&mut self.weight),
            VariantField::Height => Some(&mut self.height),
            VariantField::Width => Some(&mut self.width),
            VariantField::Depth => Some(&mut self.depth),
            VariantField::Images => None,
        }
    }

    /// Sets a text field. Returns `false` for fields that only accept files.
    pub fn set_text(&mut self, field: VariantField, value: impl Into<String>) -> bool {
        match self.slot_mut(field) {
            Some(slot) => {
                *slot = Some(value.into());
                true
            }
            None => false,
        }
    }

    pub fn with_text(mut self, field: VariantField, value: impl Into<String>) -> Self {
        self.set_text(field, value);
        self
    }

    pub fn with_image(mut self, image: UploadedImage) -> Self {
        self.images.push(image);
        self
    }

    /// Trimmed value of a text field; blank input counts as absent.
    pub fn text(&self, field: VariantField) -> Option<&str> {
        let value = match field {
            VariantField::ProductId => &self.product_id,
            VariantField::ColorId => &self.color_id,
            VariantField::SizeId => &self.size_id,
            VariantField::Stock => &self.stock,
            VariantField::Sku => &self.sku,
            VariantField::Weight => &self.weight,
            VariantField::Height => &self.height,
            VariantField::Width => &self.width,
            VariantField::Depth => &self.depth,
            VariantField::Images => &None,
        };
        value.as_deref().map(str::trim).filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    Invalid,
    TooLong,
    ReferenceNotFound,
    Duplicate,
    InvalidImage,
    ImageTooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: String,
}

/// Field errors keyed by path (`sku`, `images.0`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<FieldError>>,
}

impl ValidationErrors {
    pub fn add(&mut self, path: impl Into<String>, kind: FieldErrorKind, message: impl Into<String>) {
        self.fields.entry(path.into()).or_default().push(FieldError {
            kind,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, path: &str) -> &[FieldError] {
        self.fields.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_kind(&self, path: &str, kind: FieldErrorKind) -> bool {
        self.field(path).iter().any(|error| error.kind == kind)
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("The given data was invalid")]
    Validation(ValidationErrors),
    #[error("Failed to store image: {0}")]
    Storage(#[from] ImageStorageError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl From<ValidationErrors> for IntakeError {
    fn from(errors: ValidationErrors) -> Self {
        IntakeError::Validation(errors)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    /// Identifies the format from the file's leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else {
            None
        }
    }
}

/// Syntactically valid values, before the database has been consulted.
struct ParsedForm {
    product_id: Option<i64>,
    color_id: Option<i64>,
    size_id: Option<i64>,
    stock: Option<i32>,
    sku: Option<String>,
    weight: Option<Decimal>,
    height: Option<Decimal>,
    width: Option<Decimal>,
    depth: Option<Decimal>,
}

#[derive(Clone)]
pub struct VariantIntake {
    storage: Arc<dyn ImageStorage>,
    max_image_kb: u64,
}

impl VariantIntake {
    pub fn new(storage: Arc<dyn ImageStorage>, max_image_kb: u64) -> Self {
        Self {
            storage,
            max_image_kb,
        }
    }

    pub fn from_config(storage: Arc<dyn ImageStorage>, config: &StorageConfig) -> Self {
        Self::new(storage, config.max_image_kb)
    }

    pub fn storage(&self) -> &Arc<dyn ImageStorage> {
        &self.storage
    }

    pub fn max_image_kb(&self) -> u64 {
        self.max_image_kb
    }

    /// Validates the form, stores its images and inserts the variant.
    ///
    /// Nothing is written when validation fails. Images stored before a later
    /// failure are deleted again.
    pub async fn create<C: ConnectionTrait>(
        &self,
        db: &C,
        form: &VariantForm,
    ) -> Result<ProductVariant, IntakeError> {
        let mut data = self.validate(db, form).await?;

        let paths = self.store_images(&form.images).await?;
        data.images = paths.iter().map(|path| self.storage.url_for(path)).collect();

        match ProductVariant::create(db, &data).await {
            Ok(variant) => {
                tracing::info!(
                    id = variant.id,
                    sku = %variant.sku,
                    images = variant.images.len(),
                    "Created product variant"
                );
                Ok(variant)
            }
            Err(err) => {
                self.discard(&paths).await;
                Err(match err {
                    ProductVariantError::DuplicateSku(sku) => {
                        tracing::info!(sku = %sku, "SKU taken by a concurrent request");
                        let mut errors = ValidationErrors::default();
                        add_duplicate_sku(&mut errors);
                        errors.into()
                    }
                    ProductVariantError::Database(err) => err.into(),
                    ProductVariantError::NotFound => DbErr::RecordNotInserted.into(),
                })
            }
        }
    }

    /// Runs every rule and reports all offending fields at once. Database
    /// checks only run for values that are syntactically valid.
    pub async fn validate<C: ConnectionTrait>(
        &self,
        db: &C,
        form: &VariantForm,
    ) -> Result<CreateProductVariant, IntakeError> {
        let mut errors = ValidationErrors::default();
        let parsed = parse_form(form, &mut errors);
        self.check_images(&form.images, &mut errors);

        if let Some(id) = parsed.product_id
            && !Product::exists(db, id).await?
        {
            reference_not_found(&mut errors, VariantField::ProductId);
        }
        if let Some(id) = parsed.color_id
            && !Color::exists(db, id).await?
        {
            reference_not_found(&mut errors, VariantField::ColorId);
        }
        if let Some(id) = parsed.size_id
            && !Size::exists(db, id).await?
        {
            reference_not_found(&mut errors, VariantField::SizeId);
        }
        if let Some(sku) = parsed.sku.as_deref()
            && ProductVariant::sku_exists(db, sku).await?
        {
            add_duplicate_sku(&mut errors);
        }

        let (Some(product_id), Some(color_id), Some(size_id), Some(stock), Some(sku)) = (
            parsed.product_id,
            parsed.color_id,
            parsed.size_id,
            parsed.stock,
            parsed.sku,
        ) else {
            return Err(errors.into());
        };
        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(CreateProductVariant {
            product_id,
            color_id,
            size_id,
            stock,
            sku,
            images: Vec::new(),
            weight: parsed.weight,
            height: parsed.height,
            width: parsed.width,
            depth: parsed.depth,
        })
    }

    fn check_images(&self, images: &[UploadedImage], errors: &mut ValidationErrors) {
        let max_bytes = self.max_image_kb.saturating_mul(1024);
        for (index, image) in images.iter().enumerate() {
            let path = format!("{}.{}", VariantField::Images, index);
            if ImageFormat::sniff(&image.bytes).is_none() {
                errors.add(
                    path.clone(),
                    FieldErrorKind::InvalidImage,
                    format!("The {} must be a JPEG, PNG or GIF image.", image_label(index)),
                );
            }
            if image.size() as u64 > max_bytes {
                errors.add(
                    path,
                    FieldErrorKind::ImageTooLarge,
                    format!(
                        "The {} may not be greater than {} kilobytes.",
                        image_label(index),
                        self.max_image_kb
                    ),
                );
            }
        }
    }

    /// Stores all images concurrently, keeping upload order. On any failure
    /// the files that did get written are removed.
    async fn store_images(&self, images: &[UploadedImage]) -> Result<Vec<String>, IntakeError> {
        let results = join_all(images.iter().map(|image| self.storage.store(image))).await;

        let mut stored = Vec::with_capacity(results.len());
        let mut failure = None;
        for result in results {
            match result {
                Ok(path) => stored.push(path),
                Err(err) => {
                    tracing::error!("Failed to store image: {}", err);
                    failure.get_or_insert(err);
                }
            }
        }

        match failure {
            None => Ok(stored),
            Some(err) => {
                self.discard(&stored).await;
                Err(IntakeError::Storage(err))
            }
        }
    }

    async fn discard(&self, paths: &[String]) {
        let results = join_all(paths.iter().map(|path| self.storage.delete(path))).await;
        for (path, result) in paths.iter().zip(results) {
            if let Err(err) = result {
                tracing::warn!(path = %path, "Failed to remove stored image: {}", err);
            }
        }
    }
}

fn parse_form(form: &VariantForm, errors: &mut ValidationErrors) -> ParsedForm {
    ParsedForm {
        product_id: parse_id(form, VariantField::ProductId, errors),
        color_id: parse_id(form, VariantField::ColorId, errors),
        size_id: parse_id(form, VariantField::SizeId, errors),
        stock: parse_stock(form, errors),
        sku: parse_sku(form, errors),
        weight: parse_dimension(form, VariantField::Weight, errors),
        height: parse_dimension(form, VariantField::Height, errors),
        width: parse_dimension(form, VariantField::Width, errors),
        depth: parse_dimension(form, VariantField::Depth, errors),
    }
}

fn required<'a>(
    form: &'a VariantForm,
    field: VariantField,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    let value = form.text(field);
    if value.is_none() {
        errors.add(
            field.as_ref(),
            FieldErrorKind::Required,
            format!("The {} field is required.", field.label().to_lowercase()),
        );
    }
    value
}

fn invalid(errors: &mut ValidationErrors, field: VariantField, message: String) {
    errors.add(field.as_ref(), FieldErrorKind::Invalid, message);
}

fn parse_id(form: &VariantForm, field: VariantField, errors: &mut ValidationErrors) -> Option<i64> {
    let raw = required(form, field, errors)?;
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            invalid(
                errors,
                field,
                format!("The selected {} is invalid.", field.label().to_lowercase()),
            );
            None
        }
    }
}

/// Plain decimal notation only; digit separators such as `1_000` are rejected.
fn parse_number(raw: &str) -> Option<Decimal> {
    if raw.contains('_') {
        return None;
    }
    Decimal::from_str(raw).ok()
}

fn parse_stock(form: &VariantForm, errors: &mut ValidationErrors) -> Option<i32> {
    let field = VariantField::Stock;
    let raw = required(form, field, errors)?;
    let Some(value) = parse_number(raw) else {
        invalid(errors, field, "The stock must be a number.".to_string());
        return None;
    };
    if !value.fract().is_zero() {
        invalid(errors, field, "The stock must be a whole number.".to_string());
        return None;
    }
    if value.is_sign_negative() && !value.is_zero() {
        invalid(errors, field, "The stock must be at least 0.".to_string());
        return None;
    }
    match value.to_i32() {
        Some(stock) => Some(stock),
        None => {
            invalid(
                errors,
                field,
                format!("The stock may not be greater than {}.", i32::MAX),
            );
            None
        }
    }
}

fn parse_sku(form: &VariantForm, errors: &mut ValidationErrors) -> Option<String> {
    let raw = required(form, VariantField::Sku, errors)?;
    if raw.chars().count() > MAX_SKU_LENGTH {
        errors.add(
            VariantField::Sku.as_ref(),
            FieldErrorKind::TooLong,
            format!("The SKU may not be greater than {MAX_SKU_LENGTH} characters."),
        );
        return None;
    }
    Some(raw.to_string())
}

fn parse_dimension(
    form: &VariantForm,
    field: VariantField,
    errors: &mut ValidationErrors,
) -> Option<Decimal> {
    let raw = form.text(field)?;
    let label = field.label().to_lowercase();
    let Some(value) = parse_number(raw) else {
        invalid(errors, field, format!("The {label} must be a number."));
        return None;
    };
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.abs() > MAX_DIMENSION {
        invalid(
            errors,
            field,
            format!("The {label} may not be greater than {MAX_DIMENSION}."),
        );
        return None;
    }
    Some(rounded.normalize())
}

fn image_label(index: usize) -> String {
    format!("image #{}", index + 1)
}

fn reference_not_found(errors: &mut ValidationErrors, field: VariantField) {
    errors.add(
        field.as_ref(),
        FieldErrorKind::ReferenceNotFound,
        format!("The selected {} is invalid.", field.label().to_lowercase()),
    );
}

fn add_duplicate_sku(errors: &mut ValidationErrors) {
    errors.add(
        VariantField::Sku.as_ref(),
        FieldErrorKind::Duplicate,
        "The SKU has already been taken.",
    );
}
