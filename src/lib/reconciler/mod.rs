pub mod reconciler;
pub mod types;
