pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod forms;
pub mod import;
pub mod models;
pub mod openlibrary;
pub mod server;
pub mod services;
pub mod state;
pub mod views;
