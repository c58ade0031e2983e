//! REST endpoints, one `impl ApiClient` block per resource

mod files;
mod folders;
mod sharing;
mod threads;
mod users;

pub use users::MIN_SEARCH_QUERY_LEN;
