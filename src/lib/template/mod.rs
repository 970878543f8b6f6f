pub mod template;
pub mod types;
