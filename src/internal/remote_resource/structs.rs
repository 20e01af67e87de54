pub mod resource_metadata;

pub use resource_metadata::ResourceMetadata;
