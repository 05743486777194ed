//! Data models shared by the synchronizer, the interceptor and the result feed.
//!
//! Query and item shapes match the search engine's JSON contract exactly.

mod dataset;
mod item;
mod query;
mod response;

pub use dataset::*;
pub use item::*;
pub use query::*;
pub use response::*;
