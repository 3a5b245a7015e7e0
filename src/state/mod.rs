/// Catalog state module
///
/// This module handles everything that ends up in the host's photo index:
/// - Building the immutable record for one import (entry.rs)
/// - The single-writer store handle and its schema pinning (store.rs)

pub mod entry;
pub mod store;
