pub mod accounts;
pub mod appstate;
pub mod config;
pub mod database;
pub mod scoreservice;
pub mod session;
pub mod webserver;
