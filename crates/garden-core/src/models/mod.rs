pub mod data;
pub mod starred;

pub use data::AppData;
pub use starred::StarredAnime;
