pub mod accounts;
pub mod error;
pub mod feed;
pub mod follows;
pub mod forms;
pub mod pagination;
pub mod posts;
pub mod repos;
