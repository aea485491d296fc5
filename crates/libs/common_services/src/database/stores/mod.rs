mod membership_store;
mod memory_store;
mod pg_store;
mod user_store;

pub use membership_store::*;
pub use memory_store::*;
pub use pg_store::*;
pub use user_store::*;
