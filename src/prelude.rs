//! Prelude module for convenient imports
//!
//! Re-exports the types needed to load a template, configure a compiler and compile shots.
//!
//! # Example
//!
//! ```rust,no_run
//! use satsuei::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let compiler = Compiler::from_files("path/to/workflow.json", Some(Path::new("path/to/pipeline.json")))?;
//! let shots = ShotParameters::list_from_file("path/to/shots.json")?;
//!
//! for compiled in compiler.compile_batch(&shots) {
//!     let compiled = compiled?;
//!     println!("{}", compiled.job.to_json()?);
//! }
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{
    CameraEffectResolver, CompiledShot, Compiler, CompilerBuilder, GraphNormalizer,
    NormalizeOptions, Normalized, ParameterInjector, SlotWrite,
};

// Templates and the resolved IR
pub use crate::graph::{CompiledJob, InputValue, ResolvedGraph, ResolvedNode};
pub use crate::template::{EditorGraph, IntoEditorGraph, WorkflowTemplate};
pub use crate::ui::UiWorkflow;

// Configuration and shots
pub use crate::config::{
    CameraCatalog, CameraEffectEntry, DesignatedNodes, Dimensions, PipelineConfig, SlotPair,
};
pub use crate::registry::{WidgetDecoder, WidgetSchemaRegistry};
pub use crate::shot::{CameraTags, ShotParameters};

// Errors and signals
pub use crate::error::ConfigurationError;
pub use crate::signal::{Diagnostics, NodeRole, Signal};

pub use std::path::Path;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
