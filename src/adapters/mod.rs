// Adapters layer: concrete implementations of the domain ports (http, cache, mail, switches).

pub mod cache;
pub mod mail;
pub mod sailthru;
pub mod switches;

pub use cache::ContentCache;
pub use mail::LogMailer;
pub use sailthru::HttpSailthruClient;
pub use switches::SwitchSet;
