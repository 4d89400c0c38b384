//! HTTP side of the suite: client wrapper, resource types and response
//! assertions.

pub mod assertions;
pub mod client;
pub mod learning_instance;

pub use client::{ApiClient, ApiResponse};
pub use learning_instance::NewLearningInstance;
