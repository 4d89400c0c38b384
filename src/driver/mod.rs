pub mod common;
pub mod selector;
pub mod traits;
pub mod web;
