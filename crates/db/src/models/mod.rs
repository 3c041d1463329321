pub mod color;
pub mod product;
pub mod product_variant;
pub mod size;
