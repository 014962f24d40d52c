pub mod bangumi;
pub mod dmhy;
pub mod error;
pub mod model;
pub mod tags;
pub mod traits;

pub use error::ApiError;
pub use model::{Alliance, Author, FileSize, SearchQuery, Topic, TopicCategory};
pub use tags::{Episode, Resolution, SubtitleLanguage, TopicDetails};
pub use traits::{AnimationGardenClient, SearchSession};
