mod photo;
mod record;

pub use photo::{PhotoUrls, PhotoUser, RandomPhoto};
pub use record::{format_timestamp, parse_timestamp, RequestRecord, TIMESTAMP_FORMAT};
