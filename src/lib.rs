pub mod carriers;
pub mod config;
pub mod db;
pub mod dimensions;
pub mod dto;
pub mod entity;
pub mod error;
pub mod models;
pub mod reconciliation;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
