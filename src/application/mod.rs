pub mod error;
pub mod pagination;
pub mod repos;
pub mod tasks;
pub mod views;
