//! Image dataset loading.
//!
//! Reads an XML metadata file describing images with annotated boxes and
//! landmark parts, loads the referenced images, filters annotations
//! through a [`DatasetSource`] selector, and optionally downsamples
//! oversized images and replicates landmark-annotated images under
//! synthetic rotations.

mod common;

pub mod error;
pub use error::*;

pub mod metadata;
pub use metadata::*;

pub mod selector;
pub use selector::*;

pub mod pyramid;
pub use pyramid::*;

pub mod rotate;
pub use rotate::*;

pub mod record;
pub use record::*;

pub mod loader;
pub use loader::*;
