//! briefgen: Brief-to-Asset Image Generation
//!
//! Reads the element specifications of a creative brief, turns each element and the
//! background into a text-to-image prompt, generates the images, strips element
//! backgrounds, and stores every result under a deterministic path.

pub mod asset;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod prompt;
pub mod provider;
pub mod services;
pub mod specification;
pub mod storage;
pub mod supabase;

pub use error::PipelineError;
pub use generation::{BriefOrchestrator, BriefSummary, GenerationJobRunner, JobPlan};
pub use services::ServiceContext;
