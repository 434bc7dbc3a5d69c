pub mod lookback;
pub mod market;
