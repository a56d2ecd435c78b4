//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases: risk assessment, plan generation and chat, each
//! served by a tiered fallback chain.

pub mod assessment;
pub mod chat;
mod encoder;
mod pipeline;
pub mod plan;
mod providers;
pub mod requests;
pub mod tiered;

pub use assessment::AssessmentService;
pub use chat::{ChatInput, ChatIntent, ChatService};
pub use encoder::FeatureEncoder;
pub use pipeline::Pipeline;
pub use plan::{PlanInput, PlanKind, PlanService};
pub use providers::{ProviderStatus, Providers};
pub use requests::{ChatResponse, PlanResponse, Request, Response};
pub use tiered::{Resolved, Tier, TierFailure, TierOutput, TieredEngine};
