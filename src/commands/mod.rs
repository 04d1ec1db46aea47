pub mod chunk;
pub mod status;
