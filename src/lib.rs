pub mod config;
pub mod depth;
pub mod history;
pub mod indicators;
pub mod logging;
pub mod notify;
pub mod okx;
pub mod scanner;
pub mod scoring;
