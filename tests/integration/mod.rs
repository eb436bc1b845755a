//! Integration tests for the brief generation pipeline

mod brief_pipeline;
mod filesystem_pipeline;
mod test_utils;
