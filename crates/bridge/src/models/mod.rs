//! Domain models for the product bridge.

pub mod product;

pub use product::{
    ImagePayload, NewProduct, NewVariation, ProductPayload, StoredImage, StoredProduct,
    StoredVariation, ValidationErrors, VariationPayload,
};
