pub mod config;
pub mod logging;

pub mod bridge;
pub mod catalog;
pub mod collector;
pub mod control;
pub mod downloader;
pub mod media;
pub mod protocol;
pub mod retry;
pub mod session;
pub mod storage;
pub mod url_model;
