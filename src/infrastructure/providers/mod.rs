//! Concrete adapters for the domain's outbound ports (spec §4.2, §4.6).

pub mod calendar_feed;
pub mod historical_bars;
pub mod notifier;
pub mod realtime_quote;
pub mod sentiment;

pub use calendar_feed::HttpCalendarFeed;
pub use historical_bars::AlphaVantageBarsProvider;
pub use notifier::WebhookNotifier;
pub use realtime_quote::BarsBackedQuoteProvider;
pub use sentiment::AlternativeMeSentimentProvider;
