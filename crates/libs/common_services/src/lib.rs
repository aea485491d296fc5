#![deny(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_inception,
    clippy::struct_excessive_bools,
    clippy::cast_possible_wrap
)]

pub mod access;
pub mod api;
pub mod database;
pub mod events;
pub mod sharing;
pub mod utils;
