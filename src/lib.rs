pub mod app;
pub mod auth;
pub mod comments;
pub mod config;
pub mod error;
pub mod images;
pub mod likes;
pub mod search;
pub mod state;
pub mod storage;
pub mod taxonomy;
pub mod tools;

#[cfg(test)]
mod testing;
