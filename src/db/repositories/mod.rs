pub mod cache;
pub mod search;
pub mod user;
