pub mod debounce;
pub mod types;
