use crate::config::{DesignatedNodes, Dimensions, PipelineConfig};
use crate::error::ConfigurationError;
use crate::graph::CompiledJob;
use crate::registry::{WidgetDecoder, WidgetSchemaRegistry};
use crate::shot::ShotParameters;
use crate::signal::Diagnostics;
use crate::template::WorkflowTemplate;
use ahash::AHashMap;
use rayon::prelude::*;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

pub mod camera;
pub mod injector;
pub mod normalizer;

pub use camera::{CameraEffectResolver, CameraResolution, SlotWrite, compose_prompt};
pub use injector::{InjectionReport, ParameterInjector, canonical_image_path};
pub use normalizer::{GraphNormalizer, NormalizeOptions, Normalized};

/// Everything produced for one shot.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledShot {
    pub index: Option<u32>,
    pub job: CompiledJob,
    /// The prompt written to the text node, camera triggers included.
    pub prompt: String,
    pub frame_count: Option<u64>,
    pub slot_writes: Vec<SlotWrite>,
    pub diagnostics: Diagnostics,
}

/// Distinct frame counts kept in the variant cache before it is emptied.
pub const MAX_CACHED_VARIANTS: usize = 64;

/// Compiles shots against one workflow template.
///
/// Resolved graphs are cached per frame count, so a batch of shots with the same duration
/// normalizes the template once. The cache is the only shared state; each shot works on
/// its own copy, which makes [`Compiler::compile_shot`] safe to call from many threads.
/// Once [`MAX_CACHED_VARIANTS`] frame counts are cached, the next new one empties the
/// cache first. Graphs already handed out stay valid.
pub struct Compiler {
    template: WorkflowTemplate,
    config: PipelineConfig,
    registry: Arc<WidgetSchemaRegistry>,
    dimensions: Option<Dimensions>,
    cache: Mutex<AHashMap<Option<u64>, Arc<Normalized>>>,
}

pub struct CompilerBuilder {
    template: WorkflowTemplate,
    config: PipelineConfig,
    registry: WidgetSchemaRegistry,
}

impl CompilerBuilder {
    pub fn new(template: WorkflowTemplate, config: PipelineConfig) -> Self {
        let registry = config.build_registry();
        Self {
            template,
            config,
            registry,
        }
    }

    /// Decodes `user_type` nodes with the schema of an already known type.
    pub fn with_type_mapping(mut self, user_type: &str, known_type: &str) -> Self {
        if !self.registry.register_alias(user_type, known_type) {
            tracing::warn!(
                "Type mapping '{}' -> '{}' ignored: target type is not registered",
                user_type,
                known_type
            );
        }
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn WidgetDecoder>) -> Self {
        self.registry.register(decoder);
        self
    }

    pub fn with_registry(mut self, registry: WidgetSchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_designated_nodes(mut self, nodes: DesignatedNodes) -> Self {
        self.config.designated_nodes = nodes;
        self
    }

    pub fn build(self) -> Result<Compiler, ConfigurationError> {
        self.config.validate()?;
        let dimensions = self.config.resolved_dimensions();
        Ok(Compiler {
            template: self.template,
            config: self.config,
            registry: Arc::new(self.registry),
            dimensions,
            cache: Mutex::new(AHashMap::new()),
        })
    }
}

impl Compiler {
    pub fn builder(template: WorkflowTemplate, config: PipelineConfig) -> CompilerBuilder {
        CompilerBuilder::new(template, config)
    }

    /// Loads a template file and an optional config file. Without a config file the
    /// defaults are used.
    pub fn from_files(
        template_path: impl AsRef<Path>,
        config_path: Option<&Path>,
    ) -> Result<Self, ConfigurationError> {
        let template = WorkflowTemplate::from_file(template_path)?;
        let config = match config_path {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        Self::builder(template, config).build()
    }

    pub fn template(&self) -> &WorkflowTemplate {
        &self.template
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &WidgetSchemaRegistry {
        &self.registry
    }

    pub fn normalize_options(&self, frame_count: Option<u64>) -> NormalizeOptions {
        NormalizeOptions {
            temporal_node_id: Some(self.config.designated_nodes.temporal_node.clone()),
            frame_count,
            dimensions: self.dimensions,
        }
    }

    /// The resolved graph variant for a shot of `duration_seconds`, normalized on first use.
    pub fn resolved_graph(&self, duration_seconds: Option<f64>) -> Arc<Normalized> {
        let frames = duration_seconds
            .map(|seconds| crate::shot::frames_for(seconds, self.config.frame_rate));
        self.variant(frames)
    }

    /// Number of resolved graph variants currently cached.
    pub fn cached_variants(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn variant(&self, frame_count: Option<u64>) -> Arc<Normalized> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if cache.len() >= MAX_CACHED_VARIANTS && !cache.contains_key(&frame_count) {
            tracing::debug!("Variant cache full ({} entries); clearing", cache.len());
            cache.clear();
        }
        cache
            .entry(frame_count)
            .or_insert_with(|| {
                tracing::debug!("Normalizing template variant for {:?} frames", frame_count);
                let normalizer = GraphNormalizer::new(&self.registry);
                Arc::new(normalizer.normalize(&self.template, &self.normalize_options(frame_count)))
            })
            .clone()
    }

    /// Compiles one shot into a job.
    ///
    /// Only a shot whose duration cannot be turned into frames fails; every other anomaly
    /// is recorded in the returned diagnostics.
    #[tracing::instrument(skip(self, shot), fields(shot = ?shot.index))]
    pub fn compile_shot(&self, shot: &ShotParameters) -> Result<CompiledShot, ConfigurationError> {
        if let Some(seconds) = shot.duration_seconds {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(ConfigurationError::InvalidShot {
                    shot: shot
                        .index
                        .map_or_else(|| "?".to_string(), |i| i.to_string()),
                    message: format!("duration {seconds} is not a non-negative number"),
                });
            }
        }

        let frame_count = shot.frame_count(self.config.frame_rate);
        let normalized = self.variant(frame_count);

        let mut diagnostics = Diagnostics::new();
        diagnostics.extend(normalized.diagnostics.clone());
        let mut graph = normalized.graph.clone();

        let resolver = CameraEffectResolver::new(&self.config.camera_catalog, &self.config.slot_pool)
            .with_default_strengths(
                self.config.default_strength_low,
                self.config.default_strength_high,
            );
        let tags = shot.camera_tags.normalize();
        let resolution = resolver.resolve(&tags, &mut diagnostics);
        resolver.apply(&mut graph, &resolution.writes, &self.registry, &mut diagnostics);

        let injector = ParameterInjector::new(
            &self.registry,
            &self.config.designated_nodes,
            self.config.frame_rate,
        );
        let report = injector.apply(&mut graph, shot, &resolution.prompt_addendum, &mut diagnostics);

        tracing::info!(
            "Compiled shot with {} nodes, {} camera writes, {} signals",
            graph.len(),
            resolution.writes.len(),
            diagnostics.len()
        );

        Ok(CompiledShot {
            index: shot.index,
            job: CompiledJob::new(graph),
            prompt: report.prompt,
            frame_count: report.frame_count,
            slot_writes: resolution.writes,
            diagnostics,
        })
    }

    /// Compiles shots in parallel. Results are in input order.
    pub fn compile_batch(
        &self,
        shots: &[ShotParameters],
    ) -> Vec<Result<CompiledShot, ConfigurationError>> {
        shots.par_iter().map(|shot| self.compile_shot(shot)).collect()
    }
}
