pub mod bulk;
pub mod error;
pub mod interfaces;
pub mod service;
pub mod sharing;
