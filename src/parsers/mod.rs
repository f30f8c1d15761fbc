pub mod html;
pub mod product;
pub mod text;

#[cfg(test)]
mod tests;

pub use product::{Extractor, FieldStrategy};
