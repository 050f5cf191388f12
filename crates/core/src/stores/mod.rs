pub mod chroma;

pub use chroma::ChromaStore;
