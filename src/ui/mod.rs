pub mod authoring;
pub mod console;
