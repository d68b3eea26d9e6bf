//! Rendering Invariant Tests
//!
//! End-to-end guarantees of lexing, composition and error reporting.

use serde_json::{json, Value};
use std::sync::Arc;

use ez_ssr::{Engine, PropMap, PropType, Registry, RenderError};

fn props(value: Value) -> PropMap {
    value.as_object().cloned().expect("props fixture must be an object")
}

fn registry(components: &[(&str, &str)]) -> Registry {
    let mut registry = Registry::new();
    for (name, source) in components {
        registry.register(*name, source);
    }
    registry
}

fn render(components: &[(&str, &str)], root: &str, value: Value) -> Result<String, RenderError> {
    registry(components).render_component(root, &props(value))
}

#[test]
fn invariant_literal_templates_render_unchanged() {
    for source in [
        "",
        "<p>plain</p>",
        "costs $5, or $ 4 $$",
        "<ezra>not an inclusion</ezra>",
        "${na me} ${x:foo} ${unterminated",
        "<ez name=\"card\">",
        "<ez name=\"a\" id=\"b\" x=oops />",
    ] {
        assert_eq!(render(&[("page", source)], "page", json!({})).unwrap(), source);
    }
}

#[test]
fn invariant_render_is_deterministic() {
    let components = [
        ("page", "<ul><ez-for name=\"row\" id=\"rows\" /></ul>${meta:object}"),
        ("row", "<li>${i}:${v}</li>"),
    ];
    let registry = registry(&components);
    let p = props(json!({"rows": [{"v": 1}, {"v": 2}], "meta": {"z": 1, "a": [true]}}));

    let first = registry.render_component("page", &p).unwrap();
    let second = registry.render_component("page", &p).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, "<ul><li>0:1</li>\n<li>1:2</li></ul>{\"a\":[true],\"z\":1}");
}

#[test]
fn scenario_hello_world() {
    let out = render(&[("hello", "Hello ${name}!")], "hello", json!({"name": "World"})).unwrap();
    assert_eq!(out, "Hello World!");
}

#[test]
fn scenario_type_mismatch() {
    let err = render(&[("age", "${age:number}")], "age", json!({"age": "12"})).unwrap_err();
    assert_eq!(err, RenderError::TypeMismatch("age".into(), PropType::Number));
}

#[test]
fn scenario_missing_prop() {
    let err = render(&[("name", "${name}")], "name", json!({})).unwrap_err();
    assert_eq!(err, RenderError::MissingProp("name".into()));
}

#[test]
fn scenario_sub_component() {
    let out = render(
        &[("page", "<div><ez name=\"card\" id=\"c\" /></div>"), ("card", "<b>${title}</b>")],
        "page",
        json!({"c": {"title": "Hi"}}),
    )
    .unwrap();
    assert_eq!(out, "<div><b>Hi</b></div>");
}

#[test]
fn scenario_sub_without_props_gets_empty_map() {
    let components = [("page", "[<ez name=\"logo\" id=\"l\" />]"), ("logo", "LOGO")];
    assert_eq!(render(&components, "page", json!({})).unwrap(), "[LOGO]");
    assert_eq!(render(&components, "page", json!({"l": "scalar"})).unwrap(), "[LOGO]");
}

#[test]
fn scenario_for_loop() {
    let out = render(
        &[("list", "<ez-for name=\"item\" id=\"items\" />"), ("item", "<li>${i}: ${label}</li>")],
        "list",
        json!({"items": [{"label": "a"}, {"label": "b"}]}),
    )
    .unwrap();
    assert_eq!(out, "<li>0: a</li>\n<li>1: b</li>");
}

#[test]
fn scenario_for_loop_keeps_element_index_field() {
    let out = render(
        &[("list", "<ez-for name=\"item\" id=\"items\" />"), ("item", "${i}")],
        "list",
        json!({"items": [{"i": "x"}, {}]}),
    )
    .unwrap();
    assert_eq!(out, "x\n1");
}

#[test]
fn scenario_for_loop_empty_array() {
    let out = render(
        &[("list", "<ul><ez-for name=\"item\" id=\"items\" /></ul>"), ("item", "${label}")],
        "list",
        json!({"items": []}),
    )
    .unwrap();
    assert_eq!(out, "<ul></ul>");
}

#[test]
fn scenario_unknown_component() {
    let err = render(&[("page", "<ez name=\"ghost\" id=\"g\" />")], "page", json!({})).unwrap_err();
    assert_eq!(err, RenderError::UnknownComponent("ghost".into()));

    let err = render(&[], "missing", json!({})).unwrap_err();
    assert_eq!(err, RenderError::UnknownComponent("missing".into()));
}

#[test]
fn scenario_invalid_array_prop() {
    let components = [("list", "<ez-for name=\"item\" id=\"items\" />"), ("item", "x")];
    for value in [json!({"items": "nope"}), json!({"items": {"a": 1}}), json!({"items": [1, 2]}), json!({})] {
        let err = render(&components, "list", value).unwrap_err();
        assert_eq!(err, RenderError::InvalidArrayProp("items".into()));
    }
}

#[test]
fn scenario_escaped_placeholder() {
    let out = render(&[("page", "literal \\${name} and ${name}")], "page", json!({"name": "x"})).unwrap();
    assert_eq!(out, "literal ${name} and x");
}

#[test]
fn invariant_child_errors_carry_inclusion_chain() {
    let err = render(
        &[
            ("page", "<ez name=\"layout\" id=\"body\" />"),
            ("layout", "<main><ez-for name=\"card\" id=\"cards\" /></main>"),
            ("card", "${title:string}"),
        ],
        "page",
        json!({"body": {"cards": [{"title": "ok"}, {"title": 5}]}}),
    )
    .unwrap_err();

    assert_eq!(err.chain(), vec![("layout", "body"), ("card", "cards")]);
    assert_eq!(err.root_cause(), &RenderError::TypeMismatch("title".into(), PropType::String));
}

#[test]
fn invariant_inline_args_forward_through_wildcards() {
    let out = render(
        &[
            ("page", "<ez name=\"mid\" id=\"m\" class=\"btn ${kind}\" $role />"),
            ("mid", "<ez name=\"leaf\" id=\"l\" $* data-x=\"1\" />"),
            ("leaf", "<button $*>go</button>"),
        ],
        "page",
        json!({"kind": "primary", "role": "link"}),
    )
    .unwrap();
    assert_eq!(out, r#"<button class="btn primary" role="link" data-x="1">go</button>"#);
}

#[test]
fn invariant_inline_arg_missing_prop() {
    let err = render(
        &[("page", "<ez name=\"leaf\" id=\"l\" title=\"${heading}\" />"), ("leaf", "<h1 $*></h1>")],
        "page",
        json!({}),
    )
    .unwrap_err();
    // evaluated in the including component, so not wrapped
    assert_eq!(err, RenderError::MissingProp("heading".into()));
}

#[test]
fn invariant_loop_args_use_outer_scope() {
    let out = render(
        &[
            ("list", "<ez-for name=\"item\" id=\"items\" title=\"${label}\" />"),
            ("item", "<li $*>${label}</li>"),
        ],
        "list",
        json!({"label": "outer", "items": [{"label": "a"}, {"label": "b"}]}),
    )
    .unwrap();
    assert_eq!(out, "<li title=\"outer\">a</li>\n<li title=\"outer\">b</li>");

    // a prop that exists only on the elements is not visible to the arguments
    let err = render(
        &[
            ("list", "<ez-for name=\"item\" id=\"items\" title=\"${only_inner}\" />"),
            ("item", "x"),
        ],
        "list",
        json!({"items": [{"only_inner": "a"}]}),
    )
    .unwrap_err();
    assert_eq!(err, RenderError::MissingProp("only_inner".into()));
}

#[test]
fn invariant_data_driven_recursion() {
    let out = render(
        &[("tree", "<li>${label}<ul><ez-for name=\"tree\" id=\"children\" /></ul></li>")],
        "tree",
        json!({"label": "root", "children": [{"label": "a", "children": []}]}),
    )
    .unwrap();
    assert_eq!(out, "<li>root<ul><li>a<ul></ul></li></ul></li>");
}

#[test]
fn invariant_runaway_inclusion_is_bounded() {
    let registry = registry(&[("loop", "<ez name=\"loop\" id=\"x\" />")]).with_max_depth(5);
    let err = registry.render_component("loop", &PropMap::new()).unwrap_err();

    assert_eq!(
        err.root_cause(),
        &RenderError::DepthExceeded { name: "loop".into(), limit: 5 }
    );
    assert_eq!(err.chain().len(), 5);
}

#[test]
fn invariant_caller_props_never_mutated() {
    let engine = Arc::new(Engine::from_registry(registry(&[
        ("list", "<ez-for name=\"item\" id=\"items\" />"),
        ("item", "${i}=${v}"),
    ])));
    let shared = Arc::new(props(json!({"items": [{"v": "a"}, {"v": "b"}, {"v": "c"}]})));
    let before = shared.as_ref().clone();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let engine = Arc::clone(&engine);
            let shared = Arc::clone(&shared);
            scope.spawn(move || {
                for _ in 0..50 {
                    let out = engine.render_component("list", &shared).unwrap();
                    assert_eq!(out, "0=a\n1=b\n2=c");
                }
            });
        }
    });

    assert_eq!(*shared, before);
}
