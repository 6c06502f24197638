//! Core library for the dex-candles project.
//!
//! Turns swap events from a trade query service into gap-free OHLCV candle
//! series and keeps them current by polling for newer trades.

pub mod candles;
pub mod config;
pub mod errors;
pub mod live;
pub mod models;
pub mod source;
pub mod utils;
