mod access_filter;
mod permission;
mod principal;

pub use access_filter::*;
pub use permission::*;
pub use principal::*;
