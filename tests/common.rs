//! Common test fixtures: workflow templates in both shapes and pipeline configs.
use satsuei::prelude::*;
use serde_json::{Value, json};

/// An image-to-video workflow as exported by the visual editor.
///
/// Text node 93, negative text 94, image 97, temporal 98, modifier slots 101..108,
/// sampler 110, video output 121. Node 130 has an operation type no schema knows, and
/// node 131 is bypassed, which leaves link 30 into node 132 without a source.
#[allow(dead_code)]
pub fn editor_template_json() -> Value {
    let lora = |id: u32, link: u32| {
        json!({
            "id": id,
            "type": "LoraLoaderModelOnly",
            "mode": 0,
            "inputs": [{ "name": "model", "type": "MODEL", "link": link }],
            "widgets_values": ["none.safetensors", 1.0]
        })
    };

    let nodes: Vec<Value> = vec![
        json!({
            "id": 93,
            "type": "CLIPTextEncode",
            "inputs": [{ "name": "clip", "type": "CLIP", "link": 1 }],
            "widgets_values": ["placeholder prompt"]
        }),
        json!({
            "id": 94,
            "type": "CLIPTextEncode",
            "inputs": [{ "name": "clip", "type": "CLIP", "link": 2 }],
            "widgets_values": ["placeholder negative"]
        }),
        json!({
            "id": 95,
            "type": "DualCLIPLoader",
            "widgets_values": ["clip_l.safetensors", "umt5_xxl.safetensors", "wan"]
        }),
        json!({ "id": 96, "type": "VAELoader", "widgets_values": ["wan_2.1_vae.safetensors"] }),
        json!({ "id": 97, "type": "LoadImage", "widgets_values": ["example.png", "image"] }),
        json!({
            "id": 98,
            "type": "WanImageToVideo",
            "inputs": [
                { "name": "positive", "type": "CONDITIONING", "link": 3 },
                { "name": "negative", "type": "CONDITIONING", "link": 4 },
                { "name": "vae", "type": "VAE", "link": 5 },
                { "name": "start_image", "type": "IMAGE", "link": 6 }
            ],
            "widgets_values": [832, 480, 81, 1]
        }),
        json!({ "id": 99, "type": "UNETLoader", "widgets_values": ["wan2.2_low.safetensors", "default"] }),
        json!({ "id": 100, "type": "UNETLoader", "widgets_values": ["wan2.2_high.safetensors", "default"] }),
        lora(101, 7),
        lora(102, 8),
        lora(103, 9),
        lora(104, 10),
        lora(105, 11),
        lora(106, 12),
        lora(107, 13),
        lora(108, 14),
        json!({
            "id": 110,
            "type": "KSamplerAdvanced",
            "inputs": [
                { "name": "model", "type": "MODEL", "link": 20 },
                { "name": "positive", "type": "CONDITIONING", "link": 21 },
                { "name": "negative", "type": "CONDITIONING", "link": 22 },
                { "name": "latent_image", "type": "LATENT", "link": 23 },
                { "name": "add_noise", "widget": { "name": "add_noise" }, "link": null },
                { "name": "noise_seed", "widget": { "name": "noise_seed" }, "link": null },
                { "name": "steps", "widget": { "name": "steps" }, "link": null },
                { "name": "cfg", "widget": { "name": "cfg" }, "link": null },
                { "name": "sampler_name", "widget": { "name": "sampler_name" }, "link": null },
                { "name": "scheduler", "widget": { "name": "scheduler" }, "link": null },
                { "name": "start_at_step", "widget": { "name": "start_at_step" }, "link": null },
                { "name": "end_at_step", "widget": { "name": "end_at_step" }, "link": null },
                {
                    "name": "return_with_leftover_noise",
                    "widget": { "name": "return_with_leftover_noise" },
                    "link": null
                }
            ],
            "widgets_values": ["enable", 42, "randomize", 20, 3.5, "euler", "simple", 0, 10, "enable"]
        }),
        json!({
            "id": 120,
            "type": "CreateVideo",
            "inputs": [{ "name": "images", "type": "IMAGE", "link": 24 }],
            "widgets_values": [16]
        }),
        json!({
            "id": 121,
            "type": "SaveVideo",
            "inputs": [{ "name": "video", "type": "VIDEO", "link": 25 }],
            "widgets_values": [16, "h264", "mp4", "video/ComfyUI"]
        }),
        json!({ "id": 130, "type": "MysteryUpscaler", "widgets_values": ["4x", 2, true] }),
        json!({ "id": 131, "type": "ImageScale", "mode": 4, "widgets_values": ["lanczos", 512, 512] }),
        json!({
            "id": 132,
            "type": "PreviewImage",
            "inputs": [{ "name": "images", "type": "IMAGE", "link": 30 }]
        }),
    ];

    let links = json!([
        [1, 95, 0, 93, 0, "CLIP"],
        [2, 95, 0, 94, 0, "CLIP"],
        [3, 93, 0, 98, 0, "CONDITIONING"],
        [4, 94, 0, 98, 1, "CONDITIONING"],
        [5, 96, 0, 98, 2, "VAE"],
        [6, 97, 0, 98, 3, "IMAGE"],
        [7, 99, 0, 101, 0, "MODEL"],
        [8, 100, 0, 102, 0, "MODEL"],
        [9, 101, 0, 103, 0, "MODEL"],
        [10, 102, 0, 104, 0, "MODEL"],
        [11, 103, 0, 105, 0, "MODEL"],
        [12, 104, 0, 106, 0, "MODEL"],
        [13, 105, 0, 107, 0, "MODEL"],
        [14, 106, 0, 108, 0, "MODEL"],
        [20, 107, 0, 110, 0, "MODEL"],
        [21, 98, 0, 110, 1, "CONDITIONING"],
        [22, 98, 1, 110, 2, "CONDITIONING"],
        [23, 98, 2, 110, 3, "LATENT"],
        [24, 110, 0, 120, 0, "IMAGE"],
        [25, 120, 0, 121, 0, "VIDEO"],
        [30, 131, 0, 132, 0, "IMAGE"]
    ]);

    json!({ "last_node_id": 132, "nodes": nodes, "links": links })
}

/// The same workflow's central nodes in resolved-map shape. The temporal node still
/// carries its positional widget array.
#[allow(dead_code)]
pub fn resolved_template_json() -> Value {
    json!({
        "93": {
            "class_type": "CLIPTextEncode",
            "inputs": { "text": "placeholder prompt", "clip": ["95", 0] }
        },
        "95": {
            "class_type": "DualCLIPLoader",
            "inputs": { "clip_name1": "clip_l.safetensors", "clip_name2": "umt5_xxl.safetensors", "type": "wan" }
        },
        "97": {
            "class_type": "LoadImage",
            "inputs": { "image": "example.png" }
        },
        "98": {
            "class_type": "WanImageToVideo",
            "inputs": {
                "positive": ["93", 0],
                "start_image": ["97", 0],
                "widgets_values": [832, 480, 81, 1]
            }
        },
        "101": {
            "operation_type": "LoraLoaderModelOnly",
            "inputs": { "lora_name": "none.safetensors", "strength_model": 1.0, "model": ["99", 0] }
        },
        "102": {
            "class_type": "LoraLoaderModelOnly",
            "inputs": { "lora_name": "none.safetensors", "strength_model": 1.0, "model": ["100", 0] }
        }
    })
}

#[allow(dead_code)]
pub fn editor_template() -> WorkflowTemplate {
    WorkflowTemplate::from_value(editor_template_json()).expect("editor fixture should parse")
}

#[allow(dead_code)]
pub fn resolved_template() -> WorkflowTemplate {
    WorkflowTemplate::from_value(resolved_template_json()).expect("resolved fixture should parse")
}

/// Default configuration with the negative-text and output nodes of the editor fixture.
#[allow(dead_code)]
pub fn fixture_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.designated_nodes.negative_text_node = Some("94".to_string());
    config.designated_nodes.output_node = Some("121".to_string());
    config
}

#[allow(dead_code)]
pub fn editor_compiler() -> Compiler {
    Compiler::builder(editor_template(), fixture_config())
        .build()
        .expect("fixture config should be valid")
}

#[allow(dead_code)]
pub fn sample_shot() -> ShotParameters {
    ShotParameters::new("a lighthouse at dusk")
        .with_image("/data/shots/01.png")
        .with_duration(5.0)
        .with_cameras(vec!["drone", "zoom"])
}

/// Literal input `name` of `node_id`, panicking if it is absent.
#[allow(dead_code)]
pub fn literal<'a>(job: &'a CompiledJob, node_id: &str, name: &str) -> &'a Value {
    job.get(node_id)
        .and_then(|node| node.literal(name))
        .unwrap_or_else(|| panic!("node {node_id} has no literal input '{name}'"))
}
