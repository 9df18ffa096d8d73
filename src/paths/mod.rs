pub mod slug;
pub mod url;

pub use slug::slugify;
pub use url::{dir_name, has_scheme, normalize, split_fragment, UrlResolver};
