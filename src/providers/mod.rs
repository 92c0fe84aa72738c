pub mod exchange_feed;
pub mod vendor_feed;

pub use exchange_feed::ExchangeFeedSource;
pub use vendor_feed::VendorFeedSource;
