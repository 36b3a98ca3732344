pub mod serialization;
pub mod table;
pub mod validation;
pub mod world;
