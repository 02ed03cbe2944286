//! Explicit wiring of the core's collaborators.
//!
//! A `CoreContext` owns the resource store, the validation engine and the
//! token generator, and hands out services borrowing from it.

use crate::service::erasure_service::ErasureCascade;
use crate::service::submission_service::SubmissionPipeline;
use crate::store::resource_store::ResourceStore;
use crate::token::TokenGenerator;
use crate::validation::gate::ValidationEngine;

pub struct CoreContext<S, V, G> {
    store: S,
    engine: V,
    tokens: G,
}

impl<S, V, G> CoreContext<S, V, G>
where
    S: ResourceStore,
    V: ValidationEngine,
    G: TokenGenerator,
{
    pub fn new(store: S, engine: V, tokens: G) -> Self {
        Self {
            store,
            engine,
            tokens,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn submission(&self) -> SubmissionPipeline<'_, S, V, G> {
        SubmissionPipeline::new(&self.store, &self.engine, &self.tokens)
    }

    pub fn erasure(&self) -> ErasureCascade<'_, S> {
        ErasureCascade::new(&self.store)
    }
}
