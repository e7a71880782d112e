pub mod fmt;

pub use fmt::{format_bytes, format_last_seen, relative_label};
