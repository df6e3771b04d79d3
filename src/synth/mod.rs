//! # Synthesis
//!
//! Renders a resource graph into the artifacts handed to the provisioning
//! engine.
//!
//! ## Module Structure
//!
//! - `template.rs` - template document, JSON/YAML rendering
//! - `assembly.rs` - template and asset manifest files on disk

pub mod assembly;
pub mod template;

pub use assembly::{write_assembly, AssetManifest};
pub use template::{OutputFormat, Template};
