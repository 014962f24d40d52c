pub mod config;
pub mod error;
pub mod fetcher;
pub mod keyed;
pub mod models;
pub mod organized;
pub mod saver;
pub mod scope;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::GardenError;
pub use state::ApplicationState;
