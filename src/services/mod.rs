pub mod aggregate;
pub mod cache;
pub mod clock;
pub mod openweather;
pub mod query;
pub mod rate_limit;
pub mod severity;
pub mod weather;
