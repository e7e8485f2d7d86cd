pub mod arrival;
pub mod config;
pub mod grammar;
pub mod navigator;
pub mod provider;
pub mod recorder;
pub mod replay;
pub mod symbol;
pub mod view;
