//! Unique token generation for derived document ids.
//!
//! Collision probability is negligible but not zero; the store layer
//! surfaces collisions instead of assuming uniqueness.

use uuid::Uuid;

/// Source of globally unique opaque identifiers.
pub trait TokenGenerator {
    fn generate_unique_token(&self) -> String;
}

impl<G: TokenGenerator + ?Sized> TokenGenerator for &G {
    fn generate_unique_token(&self) -> String {
        (**self).generate_unique_token()
    }
}

/// Random UUIDv4 tokens in hyphenated lowercase form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokenGenerator;

impl TokenGenerator for UuidTokenGenerator {
    fn generate_unique_token(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
