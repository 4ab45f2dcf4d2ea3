#![doc = include_str!("../README.md")]
pub mod app;
pub mod asr;
pub mod assistant;
pub mod audio;
pub mod browser;
pub mod chat;
pub mod command;
pub mod config;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod speech;
pub mod store;
