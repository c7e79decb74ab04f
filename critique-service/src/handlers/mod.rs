//! HTTP handlers for the critique service.

pub mod health;
pub mod metrics;
pub mod pages;
pub mod upload;
