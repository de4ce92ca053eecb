//! Tests for template shape detection and graph normalization.
mod common;
use common::*;
use satsuei::graph::RAW_PARAMS_KEY;
use satsuei::prelude::*;
use serde_json::json;

fn normalize(template: &WorkflowTemplate, options: &NormalizeOptions) -> Normalized {
    let registry = WidgetSchemaRegistry::with_defaults();
    GraphNormalizer::new(&registry).normalize(template, options)
}

fn input<'a>(graph: &'a ResolvedGraph, node_id: &str, name: &str) -> &'a InputValue {
    graph
        .get(node_id)
        .and_then(|node| node.input(name))
        .unwrap_or_else(|| panic!("node {node_id} has no input '{name}'"))
}

#[test]
fn test_editor_links_resolve_to_source_and_slot() {
    let normalized = normalize(&editor_template(), &NormalizeOptions::default());
    let graph = &normalized.graph;

    let template = editor_template_json();
    let enabled_targets = ["93", "94", "98", "110", "121"];
    for link in template["links"].as_array().expect("links") {
        let target = link[3].to_string();
        if !enabled_targets.contains(&target.as_str()) {
            continue;
        }
        let source = link[1].to_string();
        let slot = link[2].as_u64().expect("slot");
        let node = graph.get(&target).expect("target node");
        assert!(
            node.inputs.values().any(|v| *v == InputValue::link(source.clone(), slot)),
            "link {link} not reflected on node {target}"
        );
    }

    assert_eq!(*input(graph, "98", "positive"), InputValue::link("93", 0));
    assert_eq!(*input(graph, "98", "start_image"), InputValue::link("97", 0));
    assert_eq!(*input(graph, "110", "latent_image"), InputValue::link("98", 2));
}

#[test]
fn test_editor_widgets_decode_into_named_inputs() {
    let normalized = normalize(&editor_template(), &NormalizeOptions::default());
    let graph = &normalized.graph;

    let wan = graph.get("98").expect("temporal node");
    assert_eq!(wan.operation_type, "WanImageToVideo");
    assert_eq!(wan.literal("width"), Some(&json!(832)));
    assert_eq!(wan.literal("length"), Some(&json!(81)));

    let text = graph.get("93").expect("text node");
    assert_eq!(text.literal("text"), Some(&json!("placeholder prompt")));
    assert_eq!(*input(graph, "93", "clip"), InputValue::link("95", 0));

    let sampler = graph.get("110").expect("sampler");
    assert_eq!(sampler.literal("noise_seed"), Some(&json!(42)));
    assert_eq!(sampler.literal("steps"), Some(&json!(20)));
    assert_eq!(sampler.literal("cfg"), Some(&json!(3.5)));
    assert_eq!(sampler.literal("return_with_leftover_noise"), Some(&json!("enable")));
    assert_eq!(*input(graph, "110", "model"), InputValue::link("107", 0));
}

#[test]
fn test_disabled_node_is_excluded_and_its_consumers_dangle() {
    let normalized = normalize(&editor_template(), &NormalizeOptions::default());

    assert!(!normalized.graph.contains("131"));
    assert_eq!(normalized.graph.len(), 21);
    assert_eq!(
        *input(&normalized.graph, "132", "images"),
        InputValue::Dangling {
            link_id: "30".to_string()
        }
    );
    assert!(normalized.diagnostics.signals().contains(&Signal::DanglingLink {
        node_id: "132".to_string(),
        input: "images".to_string(),
        link_id: "30".to_string(),
    }));
}

#[test]
fn test_unknown_link_id_degrades_to_placeholder() {
    let mut template = editor_template_json();
    template["nodes"][0]["inputs"][0]["link"] = json!(999);
    let template = WorkflowTemplate::from_value(template).expect("template");

    let normalized = normalize(&template, &NormalizeOptions::default());
    assert_eq!(
        *input(&normalized.graph, "93", "clip"),
        InputValue::Dangling {
            link_id: "999".to_string()
        }
    );
    let job_value = serde_json::to_value(&normalized.graph).expect("serialize");
    assert_eq!(job_value["93"]["inputs"]["clip"], json!(["999"]));
}

#[test]
fn test_unknown_operation_round_trips_params() {
    let normalized = normalize(&editor_template(), &NormalizeOptions::default());
    let node = normalized.graph.get("130").expect("unknown node kept");

    assert_eq!(node.literal(RAW_PARAMS_KEY), Some(&json!(["4x", 2, true])));
    assert_eq!(
        normalized.diagnostics.signals(),
        &[
            Signal::UnsupportedOperation {
                node_id: "130".to_string(),
                operation_type: "MysteryUpscaler".to_string(),
            },
            Signal::DanglingLink {
                node_id: "132".to_string(),
                input: "images".to_string(),
                link_id: "30".to_string(),
            },
        ]
    );
}

#[test]
fn test_link_inputs_take_precedence_over_widgets() {
    let template = json!({
        "nodes": [
            { "id": 1, "type": "RandomNoise", "widgets_values": [7] },
            {
                "id": 2,
                "type": "RandomNoise",
                "inputs": [{ "name": "noise_seed", "widget": { "name": "noise_seed" }, "link": 4 }],
                "widgets_values": [123]
            }
        ],
        "links": [[4, 1, 0, 2, 0, "INT"]]
    });
    let template = WorkflowTemplate::from_value(template).expect("template");
    let normalized = normalize(&template, &NormalizeOptions::default());

    assert_eq!(*input(&normalized.graph, "2", "noise_seed"), InputValue::link("1", 0));
    assert_eq!(normalized.graph.get("1").and_then(|n| n.literal("noise_seed")), Some(&json!(7)));
}

#[test]
fn test_object_form_links_and_string_ids() {
    let template = json!({
        "nodes": [
            { "id": "load", "type": "LoadImage", "widgets_values": ["a.png", "image"] },
            { "id": "invert", "type": "ImageInvert", "inputs": [{ "name": "image", "link": 5 }] }
        ],
        "links": [
            { "id": 5, "origin_id": "load", "origin_slot": 0, "target_id": "invert", "target_slot": 0, "type": "IMAGE" },
            "not a link"
        ]
    });
    let template = WorkflowTemplate::from_value(template).expect("template");
    let WorkflowTemplate::Editor(editor) = &template else {
        panic!("expected editor shape");
    };
    assert_eq!(editor.links.len(), 1);
    assert_eq!(editor.links[0].target_input_name.as_deref(), Some("image"));

    let normalized = normalize(&template, &NormalizeOptions::default());
    assert_eq!(*input(&normalized.graph, "invert", "image"), InputValue::link("load", 0));
    assert!(normalized.diagnostics.is_empty());
}

#[test]
fn test_keyed_editor_widgets_merge_as_literals() {
    let template = json!({
        "nodes": [
            { "id": 3, "type": "Whatever", "widgets_values": { "text": "hi", "scale": 2 } }
        ]
    });
    let template = WorkflowTemplate::from_value(template).expect("template");
    let normalized = normalize(&template, &NormalizeOptions::default());
    let node = normalized.graph.get("3").expect("node");

    assert_eq!(node.literal("text"), Some(&json!("hi")));
    assert_eq!(node.literal("scale"), Some(&json!(2)));
    assert!(normalized.diagnostics.is_empty());
}

#[test]
fn test_empty_editor_graph_is_empty_not_error() {
    let template = WorkflowTemplate::from_json(r#"{ "nodes": [], "links": [] }"#).expect("template");
    assert!(template.is_editor_graph());
    let normalized = normalize(&template, &NormalizeOptions::default());
    assert!(normalized.graph.is_empty());
    assert!(normalized.diagnostics.is_empty());
}

#[test]
fn test_resolved_shape_is_copied_and_references_detected() {
    let template = resolved_template();
    assert!(!template.is_editor_graph());

    let normalized = normalize(&template, &NormalizeOptions::default());
    let graph = &normalized.graph;
    assert_eq!(graph.len(), 6);
    assert_eq!(*input(graph, "93", "clip"), InputValue::link("95", 0));
    assert_eq!(graph.get("101").map(|n| n.operation_type.as_str()), Some("LoraLoaderModelOnly"));
    assert_eq!(
        graph.get("98").and_then(|n| n.raw_params()),
        Some(&vec![json!(832), json!(480), json!(81), json!(1)])
    );

    let WorkflowTemplate::Resolved(source) = &template else {
        panic!("expected resolved shape");
    };
    assert_eq!(source, graph);
}

#[test]
fn test_raw_arrays_are_never_read_as_references() {
    let template = WorkflowTemplate::from_json(
        r#"{ "1": { "class_type": "Odd", "inputs": { "_raw_params": ["2", 0], "pair": ["a", "b"], "neg": ["2", -1] } } }"#,
    )
    .expect("template");
    let normalized = normalize(&template, &NormalizeOptions::default());
    let node = normalized.graph.get("1").expect("node");

    assert_eq!(node.literal("_raw_params"), Some(&json!(["2", 0])));
    assert_eq!(node.literal("pair"), Some(&json!(["a", "b"])));
    assert_eq!(node.literal("neg"), Some(&json!(["2", -1])));
}

#[test]
fn test_frame_count_variant_in_both_shapes() {
    let options = NormalizeOptions {
        temporal_node_id: Some("98".to_string()),
        frame_count: Some(120),
        dimensions: None,
    };

    let editor = normalize(&editor_template(), &options);
    let wan = editor.graph.get("98").expect("temporal node");
    assert_eq!(wan.literal("length"), Some(&json!(120)));
    assert_eq!(wan.literal("width"), Some(&json!(832)));
    assert_eq!(wan.literal("batch_size"), Some(&json!(1)));

    let resolved = normalize(&resolved_template(), &options);
    assert_eq!(
        resolved.graph.get("98").and_then(|n| n.raw_params()),
        Some(&vec![json!(832), json!(480), json!(120), json!(1)])
    );
}

#[test]
fn test_dimension_variant_overwrites_width_and_height() {
    let options = NormalizeOptions {
        temporal_node_id: Some("98".to_string()),
        frame_count: None,
        dimensions: Some(Dimensions::from_aspect_ratio("16:9", 1280)),
    };

    let editor = normalize(&editor_template(), &options);
    let wan = editor.graph.get("98").expect("temporal node");
    assert_eq!(wan.literal("width"), Some(&json!(1280)));
    assert_eq!(wan.literal("height"), Some(&json!(720)));
    assert_eq!(wan.literal("length"), Some(&json!(81)));

    let resolved = normalize(&resolved_template(), &options);
    assert_eq!(
        resolved.graph.get("98").and_then(|n| n.raw_params()),
        Some(&vec![json!(1280), json!(720), json!(81), json!(1)])
    );
    assert!(resolved.graph.get("97").and_then(|n| n.literal("width")).is_none());
}

#[test]
fn test_dimension_variant_leaves_other_sized_nodes_alone() {
    let template = WorkflowTemplate::from_value(json!({
        "nodes": [
            { "id": 50, "type": "EmptySD3LatentImage", "widgets_values": [2048, 2048, 1] },
            { "id": 98, "type": "WanImageToVideo", "widgets_values": [832, 480, 81, 1] }
        ]
    }))
    .expect("template");
    let options = NormalizeOptions {
        temporal_node_id: Some("98".to_string()),
        frame_count: None,
        dimensions: Some(Dimensions::from_aspect_ratio("16:9", 1280)),
    };
    let normalized = normalize(&template, &options);

    let latent = normalized.graph.get("50").expect("latent node");
    assert_eq!(latent.literal("width"), Some(&json!(2048)));
    assert_eq!(latent.literal("height"), Some(&json!(2048)));
    let wan = normalized.graph.get("98").expect("temporal node");
    assert_eq!(wan.literal("width"), Some(&json!(1280)));
    assert_eq!(wan.literal("height"), Some(&json!(720)));

    let unset = NormalizeOptions {
        temporal_node_id: None,
        ..options
    };
    let untouched = normalize(&template, &unset);
    assert_eq!(untouched.graph.get("98").and_then(|n| n.literal("width")), Some(&json!(832)));
}

#[test]
fn test_normalization_is_deterministic() {
    let options = NormalizeOptions::default();
    let first = serde_json::to_string(&normalize(&editor_template(), &options).graph).expect("json");
    let second = serde_json::to_string(&normalize(&editor_template(), &options).graph).expect("json");
    assert_eq!(first, second);
}

#[test]
fn test_bare_array_template_is_fatal() {
    let result = WorkflowTemplate::from_json("[1, 2, 3]");
    assert!(matches!(result, Err(ConfigurationError::UnshapedTemplate(_))));

    let scalar = WorkflowTemplate::from_json("42");
    assert!(matches!(scalar, Err(ConfigurationError::UnshapedTemplate(_))));

    let not_nodes = WorkflowTemplate::from_json(r#"{ "93": 5 }"#);
    assert!(matches!(not_nodes, Err(ConfigurationError::UnshapedTemplate(_))));

    let garbage = WorkflowTemplate::from_json("{ nodes");
    assert!(matches!(garbage, Err(ConfigurationError::JsonParse(_))));
}

#[test]
fn test_editor_node_without_id_is_malformed() {
    let result = WorkflowTemplate::from_json(
        r#"{ "nodes": [ { "id": 1, "type": "LoadImage" }, { "type": "LoadImage" } ] }"#,
    );
    match result {
        Err(ConfigurationError::MalformedNode { index, .. }) => assert_eq!(index, 1),
        other => panic!("expected MalformedNode, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_muted_and_bypassed_modes_disable_nodes() {
    let template = WorkflowTemplate::from_json(
        r#"{ "nodes": [
            { "id": 1, "type": "LoadImage", "mode": 0, "widgets_values": ["a.png"] },
            { "id": 2, "type": "LoadImage", "mode": 2, "widgets_values": ["b.png"] },
            { "id": 3, "type": "LoadImage", "mode": 4, "widgets_values": ["c.png"] }
        ] }"#,
    )
    .expect("template");
    let normalized = normalize(&template, &NormalizeOptions::default());
    assert_eq!(normalized.graph.node_ids().collect::<Vec<_>>(), vec!["1"]);
}
