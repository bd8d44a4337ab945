//! Structural classification of task and type classes.
//!
//! `classify` runs the method-pattern rules over one class and produces
//! a `TypeDescriptor` through the merging `DescriptorBuilder`; the
//! `DescriptorCache` guarantees one descriptor per class per run.

pub mod builder;
pub mod cache;
pub mod classify;
pub mod descriptor;

pub use builder::DescriptorBuilder;
pub use cache::DescriptorCache;
pub use classify::classify;
pub use descriptor::{AttributeDescriptor, ElementDescriptor, TypeDescriptor};
