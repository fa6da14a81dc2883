// File: src/tasks/mod.rs

pub mod monitor;

pub use monitor::MonitorLoop;
