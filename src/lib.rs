pub mod assignments;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod s3;
pub mod schema;
pub mod state;
pub mod storage;
