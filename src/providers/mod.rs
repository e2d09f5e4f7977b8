pub mod availability;
pub mod forex_api;

pub use availability::HttpProbe;
pub use forex_api::ForexApiSource;
