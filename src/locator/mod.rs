pub mod locator_model;
pub mod platform;
pub mod store;
