use super::decoder::{DeclaredOrderDecoder, PositionalDecoder, WidgetDecoder, WidgetField};
use ahash::AHashMap;
use std::sync::Arc;

/// Master macro defining the built-in widget schemas and their registration.
///
/// Positional entries list `(input_name, min_len)` in widget order. Declared-order entries
/// list the fallback widget names used when a node declares no widget sockets.
macro_rules! define_widget_schemas {
    (
        positional {
            $( $op:literal => [ $( ($field:literal, $min:literal) ),* $(,)? ] ),* $(,)?
        }
        declared {
            $( $dop:literal => [ $( $widget:literal ),* $(,)? ] ),* $(,)?
        }
    ) => {
        /// Operation types known to the default registry.
        pub const DEFAULT_OPERATION_TYPES: &[&str] = &[ $( $op, )* $( $dop, )* ];

        pub(super) fn register_default_decoders(
            registry: &mut AHashMap<String, Arc<dyn WidgetDecoder>>,
        ) {
            $(
                registry.insert(
                    $op.to_string(),
                    Arc::new(PositionalDecoder::new(
                        $op,
                        vec![ $( WidgetField::new($field, $min) ),* ],
                    )),
                );
            )*
            $(
                registry.insert(
                    $dop.to_string(),
                    Arc::new(DeclaredOrderDecoder::new($dop).with_widget_order(&[ $( $widget ),* ])),
                );
            )*
        }
    };
}

define_widget_schemas! {
    positional {
        "LoadImage" => [("image", 1)],
        "CLIPTextEncode" => [("text", 1)],
        "SaveImage" => [("filename_prefix", 1)],
        "SaveVideo" => [
            ("fps", 4),
            ("codec", 4),
            ("format", 4),
            ("filename_prefix", 4),
            ("save_output", 5),
        ],
        "WanImageToVideo" => [
            ("width", 4),
            ("height", 4),
            ("length", 4),
            ("batch_size", 4),
        ],
        "CLIPLoader" => [("clip_name1", 3), ("clip_name2", 3), ("type", 3)],
        "DualCLIPLoader" => [("clip_name1", 3), ("clip_name2", 3), ("type", 3), ("device", 4)],
        "DualCLIPLoaderGGUF" => [("clip_name1", 3), ("clip_name2", 3), ("type", 3)],
        "VAELoader" => [("vae_name", 1)],
        "UNETLoader" => [("unet_name", 1), ("weight_dtype", 2)],
        "UnetLoaderGGUF" => [("unet_name", 1)],
        "LoraLoaderModelOnly" => [("lora_name", 2), ("strength_model", 2)],
        "ModelSamplingSD3" => [("shift", 1)],
        "ModelSamplingFlux" => [
            ("base_shift", 4),
            ("max_shift", 4),
            ("width", 4),
            ("height", 4),
        ],
        "CreateVideo" => [("fps", 1)],
        "KSampler" => [("seed", 1)],
        "KSamplerSelect" => [("sampler_name", 1)],
        "BasicScheduler" => [("scheduler", 3), ("steps", 3), ("denoise", 3)],
        "RandomNoise" => [("noise_seed", 1)],
        "FluxGuidance" => [("guidance", 1)],
        "EmptySD3LatentImage" => [("width", 3), ("height", 3), ("batch_size", 3)],
    }
    declared {
        "KSamplerAdvanced" => [
            "add_noise",
            "noise_seed",
            "steps",
            "cfg",
            "sampler_name",
            "scheduler",
            "start_at_step",
            "end_at_step",
            "return_with_leftover_noise",
        ],
    }
}
