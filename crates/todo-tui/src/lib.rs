pub mod account;
pub mod app;
pub mod components;
pub mod config;
pub mod controller;
pub mod launch;
pub mod logging;
