//! Vector collection domain shared by the semantic and document layers

mod record;
mod store;

pub use record::{similarity_from_cosine, ScoredRecord, VectorPayload, VectorRecord};
pub use store::{CollectionSpec, VectorQuery, VectorStore};

#[cfg(test)]
pub use store::mock::UnavailableVectorStore;
