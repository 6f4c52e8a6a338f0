pub mod errors;
pub mod guard;
