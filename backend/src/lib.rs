pub mod config;
pub mod db;
pub mod service;
pub mod storage;

pub mod error;
pub mod logger;
