pub mod critique;
pub mod metrics;
pub mod providers;
