//! Data Transfer Objects (DTOs).

mod product_dto;

pub use product_dto::*;
