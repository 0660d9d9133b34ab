pub mod api_types;
pub mod client;
pub mod keywords;
pub mod manager;
pub mod repository;
pub mod types;
