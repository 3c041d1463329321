pub mod catalog;
pub mod health;
pub mod product_variants;
