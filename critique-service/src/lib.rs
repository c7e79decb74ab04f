//! critique-service: upload a photo, get the vision model's post-processing
//! advice back as JSON.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
