pub mod accumulator;
pub mod config;
pub mod matcher;
pub mod service;
pub mod split;
