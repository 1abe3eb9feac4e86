//! Common test utilities for building script graphs and compiling them.
use kairo::prelude::*;

/// Properties every fixture script declares, so variable blocks resolve without warnings.
#[allow(dead_code)]
pub const FIXTURE_PROPERTIES: &[(&str, &str)] = &[
    ("x", "int"),
    ("y", "int"),
    ("items", "List<int>"),
    ("player", "Player"),
];

/// Wraps a method into a script declaring [`FIXTURE_PROPERTIES`].
#[allow(dead_code)]
pub fn fixture_script(method: Method) -> Script {
    FIXTURE_PROPERTIES
        .iter()
        .fold(Script::new("Tests", "Fixture"), |script, (name, ty)| {
            script.with_property(Property::new(*name, *ty))
        })
        .with_method(method)
}

/// Compiles a single method inside a fixture script.
#[allow(dead_code)]
pub fn compile_method(method: Method) -> std::result::Result<CompiledMethod, CompileError> {
    compile_method_with(method, CompilerOptions::default())
}

#[allow(dead_code)]
pub fn compile_method_with(
    method: Method,
    options: CompilerOptions,
) -> std::result::Result<CompiledMethod, CompileError> {
    let script = fixture_script(method.clone());
    Compiler::builder(script)
        .with_options(options)
        .build()
        .compile_method(&method)
}

/// Renders statements on a single line, separated by spaces.
#[allow(dead_code)]
pub fn flatten(statements: &[Statement]) -> String {
    statements
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[allow(dead_code)]
pub fn value_input(method: &Method, block: BlockId, name: Option<&str>) -> SlotId {
    method
        .find_slot(block, SlotDirection::Input, SlotKind::Value, name)
        .expect("value input slot")
}

#[allow(dead_code)]
pub fn set_literal(method: &mut Method, block: BlockId, name: Option<&str>, value: impl Into<Value>) {
    let slot = value_input(method, block, name);
    method
        .set_slot_value(slot, Some(value.into()))
        .expect("Failed to set literal");
}

/// Adds `name = value;` as a VariableSet block with a literal input.
#[allow(dead_code)]
pub fn add_assignment(method: &mut Method, name: &str, value: impl Into<Value>) -> BlockId {
    let block = method.add_block(BlockKind::VariableSet {
        name: name.to_string(),
    });
    set_literal(method, block, None, value);
    block
}

/// Adds a VariableSet block whose input is left unconfigured.
#[allow(dead_code)]
pub fn add_setter(method: &mut Method, name: &str) -> BlockId {
    method.add_block(BlockKind::VariableSet {
        name: name.to_string(),
    })
}

#[allow(dead_code)]
pub fn add_getter(method: &mut Method, name: &str) -> BlockId {
    method.add_block(BlockKind::VariableGet {
        name: name.to_string(),
    })
}

/// Start -> ConditionalBranch(true) with True -> `x = 1` and False -> `x = 2`.
#[allow(dead_code)]
pub fn branch_method() -> Method {
    let mut method = Method::new("Branch");
    let start = method.add_block(BlockKind::Start);
    let branch = method.add_block(BlockKind::ConditionalBranch);
    set_literal(&mut method, branch, None, true);
    let on_true = add_assignment(&mut method, "x", 1);
    let on_false = add_assignment(&mut method, "x", 2);

    method.link_execution(start, None, branch).expect("start -> branch");
    method
        .link_execution(branch, Some("True"), on_true)
        .expect("true -> x = 1");
    method
        .link_execution(branch, Some("False"), on_false)
        .expect("false -> x = 2");
    method
}

/// The JSON form of a script with one method assigning `5` to `x`.
#[allow(dead_code)]
pub const SIMPLE_SCRIPT_JSON: &str = r#"{
    "namespace": "Game",
    "name": "Counter",
    "usings": ["System"],
    "properties": [{ "name": "x", "type_name": "int" }],
    "methods": [{
        "name": "Reset",
        "return_type": "void",
        "blocks": {
            "0": { "id": 0, "base": null, "kind": "Start", "slots": [
                { "id": 1, "block": 0, "direction": "Output", "kind": "Execution", "name": null,
                  "type_name": null, "value": null, "flags": { "auto_flow": true } }
            ] },
            "2": { "id": 2, "base": null, "kind": { "VariableSet": { "name": "x" } }, "slots": [
                { "id": 3, "block": 2, "direction": "Input", "kind": "Execution", "name": null,
                  "type_name": null, "value": null, "flags": { "auto_flow": false } },
                { "id": 4, "block": 2, "direction": "Output", "kind": "Execution", "name": null,
                  "type_name": null, "value": null, "flags": { "auto_flow": true } },
                { "id": 5, "block": 2, "direction": "Input", "kind": "Value", "name": null,
                  "type_name": null, "value": { "Number": 5.0 }, "flags": { "auto_flow": false } }
            ] }
        },
        "links": { "6": { "id": 6, "source": 1, "target": 3 } }
    }]
}"#;
