pub mod claims;
pub mod error;
pub mod middlewares;
