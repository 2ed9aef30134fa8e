pub mod console;
pub mod screenshot;
