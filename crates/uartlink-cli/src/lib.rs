//! uartlink CLI - demo drivers for the UART-over-BLE bridge

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
