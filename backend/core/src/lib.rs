pub mod names;
pub mod traits;
pub mod types;

pub use traits::TitleCache;
pub use types::{canonical_video_url, ResolveResult};
