//! AppStream Cloud Abstraction
//!
//! This crate holds everything the AppStream provider needs to talk to the
//! cloud without depending on a particular SDK:
//!
//! - **Cloud API traits**: [`AppStreamApi`] and [`TaggingApi`], with the
//!   pointer-optional request/response shapes they exchange
//! - **Error taxonomy**: [`CloudError`] and the [`classify`] predicates
//! - **Retry engine**: deadline-bounded exponential backoff with jitter
//! - **Context**: cooperative cancellation plus deadlines
//! - **Tri-state values** and host **diagnostics**
//! - **Tag manager**: default-tag merge and diff-based tag reconciliation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               appstream-provider                 │
//! │         (image builder reconciler, schema)       │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                appstream-cloud                   │
//! │  ┌──────────────┐  ┌──────────────┐             │
//! │  │ Retry engine │  │ Tag manager  │             │
//! │  └──────────────┘  └──────────────┘             │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait AppStreamApi / trait TaggingApi   │   │
//! │  └──────────────────────────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │              appstream-cloud-aws                 │
//! │   (aws-sdk-appstream, resourcegroupstagging)     │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod classify;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod retry;
pub mod tags;
pub mod value;

// Re-exports
pub use api::{
    AccessEndpoint, AppStreamApi, CreateImageBuilderInput, DomainJoinInfo, ImageBuilder,
    ImageBuilderState, NetworkAccessConfiguration, ResourceError, ResourceTagMapping,
    StateChangeReason, TaggingApi, VolumeConfig, VpcConfig,
};
pub use context::Context;
pub use diagnostics::{AttributePath, Diagnostic, Diagnostics, Severity};
pub use error::{CloudError, Result, TagFailure};
pub use retry::{Predicate, RetryConfig, any_of, retry};
pub use tags::{DefaultTags, TagDelta, TagManager, TagMap};
pub use value::Value;
