//! antdoc extracts reference documentation from compiled Ant task and
//! type classes.
//!
//! The host documentation toolchain exports a structural snapshot of the
//! program (classes, members, supertypes, doc comments) as JSON. This
//! crate classifies each class's public methods into the configuration
//! surface the build framework would see (attributes, nested elements,
//! text content, nested tasks), reconciles the result with the `ant.*`
//! documentation tags, and emits structured descriptors plus diagnostics
//! for the rendering layer.
//!
//! The pipeline: [`model::ProgramModel`] answers structural queries over
//! the snapshot; [`analysis::classify`] turns one class into a
//! [`analysis::TypeDescriptor`]; [`docs::EntityDoc`] joins the descriptor
//! with the parsed tags; [`session::Session`] ties the run together; and
//! [`report`] shapes the output.

pub mod analysis;
pub mod cli;
pub mod docs;
pub mod model;
pub mod report;
pub mod session;
pub mod tags;

pub use analysis::TypeDescriptor;
pub use model::ProgramModel;
pub use report::{build_report, JsonReport, Reporter};
pub use session::Session;
