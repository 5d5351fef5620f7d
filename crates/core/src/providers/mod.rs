pub mod finnhub;
pub mod gateway;
pub mod traits;
