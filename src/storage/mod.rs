//! Storage backends for profilestore.
//!
//! The traits in [`traits`] define the contract; [`files`] and [`memory`]
//! provide the implementations.

pub mod files;
pub mod memory;
mod traits;

pub use files::{FileFeedbackStore, FileStores, Layout, StoreConfig};
pub use memory::{InMemoryPreferenceStore, InMemoryProfileStore, InMemoryRecommendationStore};
pub use traits::{
    FeedbackBackend, PreferenceBackend, ProfileBackend, RecommendationBackend, StorageError,
};
