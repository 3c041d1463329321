pub mod model_loaders;

pub use model_loaders::load_product_variant_middleware;
