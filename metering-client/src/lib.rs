pub mod auth;
pub mod client;
pub mod domain;
pub mod filter;
pub mod paging;
pub mod series;

pub use client::{ApiError, MeteringClient, Page};
pub use filter::{Matcher, SearchFilter, SearchOptions};
