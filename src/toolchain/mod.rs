//! Target description: triples, components and the canonical descriptor.

pub mod components;
pub mod descriptor;
pub mod triple;

pub use components::{components_for, ComponentSpec};
pub use descriptor::{CompilerPaths, ToolchainDescriptor, DESCRIPTOR_FILE};
pub use triple::{Arch, TargetTriple};
