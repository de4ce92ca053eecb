//! # Satsuei - Workflow Graph Compiler & Camera-Effect Injector
//!
//! **Satsuei** turns a visually authored node-graph workflow template into the concrete job
//! a remote media-generation backend executes, and overlays per-shot parameters onto it:
//! prompt text, source image, clip duration and camera-driven model modifiers.
//!
//! ## Core Workflow
//!
//! 1.  **Load a template**: [`template::WorkflowTemplate::from_json`] accepts both the editor
//!     shape (`{nodes, links}`) and the resolved node-map shape, detecting which one it got.
//!     Custom formats can implement [`template::IntoEditorGraph`] instead.
//! 2.  **Normalize**: the [`compiler::GraphNormalizer`] resolves links and decodes each node's
//!     positional widgets through the [`registry::WidgetSchemaRegistry`] into one keyed
//!     [`graph::ResolvedGraph`].
//! 3.  **Compile shots**: the [`compiler::Compiler`] caches resolved graphs per duration and,
//!     for each [`shot::ShotParameters`], assigns camera effects to modifier slots and injects
//!     the shot's parameters into a private copy, yielding a [`graph::CompiledJob`].
//!
//! Anything short of an unreadable template is tolerated: the job is still produced and the
//! degradation is reported as a [`signal::Signal`] in the shot's diagnostics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use satsuei::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let template = WorkflowTemplate::from_file("workflows/image_to_video.json")?;
//!     let compiler = Compiler::builder(template, PipelineConfig::default()).build()?;
//!
//!     let shot = ShotParameters::new("a lighthouse at dusk, waves crashing")
//!         .with_image("renders/shot_01.png")
//!         .with_duration(5.0)
//!         .with_cameras("drone, zoom");
//!
//!     let compiled = compiler.compile_shot(&shot)?;
//!     println!("prompt: {}", compiled.prompt);
//!     for signal in compiled.diagnostics.iter() {
//!         println!("warning: {signal}");
//!     }
//!     println!("{}", compiled.job.to_json_pretty()?);
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod registry;
pub mod shot;
pub mod signal;
pub mod template;
pub mod ui;
