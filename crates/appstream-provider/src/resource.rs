//! Host-facing resource interface
//!
//! The host drives every resource through these operations. Each call carries
//! a [`Context`] with the host's cancellation signal and deadline, and reports
//! problems as [`Diagnostics`] rather than errors.

use crate::plan::PlanModification;
use crate::schema::Schema;
use appstream_cloud::{Context, Diagnostics};
use async_trait::async_trait;

/// Result of a state-producing operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<M> {
    /// New state. For `read`, `None` means the resource is gone and must be
    /// removed from state.
    pub state: Option<M>,
    pub diagnostics: Diagnostics,
}

impl<M> Response<M> {
    pub fn new(state: Option<M>, diagnostics: Diagnostics) -> Self {
        Self { state, diagnostics }
    }

    pub fn state(state: M) -> Self {
        Self::new(Some(state), Diagnostics::new())
    }

    /// No state, no diagnostics
    pub fn empty() -> Self {
        Self::new(None, Diagnostics::new())
    }

    pub fn error(diagnostics: Diagnostics) -> Self {
        Self::new(None, diagnostics)
    }
}

#[async_trait]
pub trait Resource: Send + Sync {
    type Model: Send + Sync;

    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Plan-time checks, before any API call
    fn validate_config(&self, config: &Self::Model) -> Diagnostics;

    fn modify_plan(
        &self,
        prior: Option<&Self::Model>,
        plan: Self::Model,
    ) -> PlanModification<Self::Model>;

    async fn create(&self, ctx: &Context, plan: Self::Model) -> Response<Self::Model>;

    async fn read(&self, ctx: &Context, prior: Self::Model) -> Response<Self::Model>;

    async fn update(
        &self,
        ctx: &Context,
        plan: Self::Model,
        prior: Self::Model,
    ) -> Response<Self::Model>;

    async fn delete(&self, ctx: &Context, prior: Self::Model) -> Diagnostics;

    /// Seed a partial state from an import identifier; `read` fills in the rest
    fn import_state(&self, id: &str) -> Response<Self::Model>;
}
