pub mod app;
pub mod catalog;
pub mod config;
pub mod storage;
pub mod watched;
