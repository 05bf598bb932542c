pub mod api;
pub mod catalog;
pub mod config;
pub mod context;
pub mod data_types;
pub mod frontend;
pub mod model;
pub mod tagging;

#[cfg(test)]
pub(crate) mod testutils;
