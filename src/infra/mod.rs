//! Host adapters and shared helpers: slugs, front-matter, world loading,
//! asset fetching and logging.

pub mod fetch;
mod frontmatter;
pub mod logging;
mod slug;
pub mod world;

pub use fetch::LocalFetcher;
pub use frontmatter::{FrontMatter, icon_for, serialize};
pub use slug::{MAX_SEGMENT_LENGTH, keep_tail, sanitize, slugify, valid_filename};
pub use world::{LocalWorld, WorldError};
