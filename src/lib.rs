pub mod api;
pub mod audit;
pub mod config;
pub mod db;
pub mod models;
pub mod patients;
pub mod validation;
