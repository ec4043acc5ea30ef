pub mod acceptance;
pub mod cache;
pub mod energy;
pub mod result;
