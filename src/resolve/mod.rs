pub mod resolver;
pub mod wait;
