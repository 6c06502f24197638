//! Candle construction from swap events: pricing, bucketing and aggregation.

pub mod aggregate;
pub mod interval;
pub mod price;

pub use aggregate::aggregate;
pub use interval::{Interval, bucket_key};
pub use price::{price_point, trade_price, trade_side, trade_view};
