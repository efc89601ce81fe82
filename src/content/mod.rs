//! Content helpers shared by course, library, project and post pages.

pub mod format;
pub mod slug;
pub mod vietqr;
pub mod youtube;

pub use self::format::{format_date, format_percent, format_price};
pub use self::slug::normalize_slug;
pub use self::vietqr::{BankConfig, QrImageRequest};
pub use self::youtube::{ThumbnailQuality, extract_video_id, thumbnail_url};
