mod repository;
pub mod utils;
