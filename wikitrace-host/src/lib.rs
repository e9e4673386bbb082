pub mod error;
pub mod events;
pub mod page;

pub use error::HostError;
pub use events::{HostEvent, load_event_log, parse_event_log};
pub use page::{
    extract_page_title, host_of, is_article_link, is_same_site, navigation_key, resolve_link,
    title_from_url,
};
