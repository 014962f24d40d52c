//! Bangumi (bgm.tv) metadata API.

mod client;
pub mod types;

pub use client::BangumiClient;
pub use types::{PersonCareer, PersonImages, PersonType, RelatedPerson};
