//! Graph editing: link invariants, slot regeneration and serialization.
mod common;
use common::*;
use kairo::prelude::*;

#[cfg(test)]
mod link_tests {
    use super::*;

    #[test]
    fn test_value_input_accepts_one_link() {
        let mut method = Method::new("Run");
        let first = add_getter(&mut method, "x");
        let second = add_getter(&mut method, "y");
        let set = add_setter(&mut method, "x");

        method.link_value(first, None, set, None).expect("first link");
        let input = value_input(&method, set, None);
        assert_eq!(
            method.link_value(second, None, set, None),
            Err(GraphError::InputAlreadyLinked(input))
        );
    }

    #[test]
    fn test_execution_output_has_one_target() {
        let mut method = Method::new("Run");
        let start = method.add_block(BlockKind::Start);
        let a = add_setter(&mut method, "x");
        let b = add_setter(&mut method, "y");

        method.link_execution(start, None, a).expect("first link");
        assert!(matches!(
            method.link_execution(start, None, b),
            Err(GraphError::ExecutionAlreadyLinked(_))
        ));
    }

    #[test]
    fn test_value_outputs_fan_out() {
        let mut method = Method::new("Run");
        let get = add_getter(&mut method, "x");
        let a = add_setter(&mut method, "x");
        let b = add_setter(&mut method, "y");

        method.link_value(get, None, a, None).expect("first target");
        method.link_value(get, None, b, None).expect("second target");
        assert_eq!(method.links().count(), 2);
    }

    #[test]
    fn test_links_must_connect_output_to_input_of_same_kind() {
        let mut method = Method::new("Run");
        let start = method.add_block(BlockKind::Start);
        let set = add_setter(&mut method, "x");
        let get = add_getter(&mut method, "y");

        let execution_out = method
            .find_slot(start, SlotDirection::Output, SlotKind::Execution, None)
            .expect("start output");
        let value_in = value_input(&method, set, None);
        let value_out = method
            .find_slot(get, SlotDirection::Output, SlotKind::Value, None)
            .expect("getter output");

        assert!(matches!(
            method.add_link(execution_out, value_in),
            Err(GraphError::KindMismatch { .. })
        ));
        assert!(matches!(
            method.add_link(value_in, value_out),
            Err(GraphError::InvalidDirection { .. })
        ));
    }

    #[test]
    fn test_block_cannot_feed_itself() {
        let mut method = Method::new("Run");
        let expression = method.add_block(BlockKind::FreeformExpression {
            expression: "a + 1".to_string(),
        });
        assert_eq!(
            method.link_value(expression, None, expression, Some("a")),
            Err(GraphError::SelfLink(expression))
        );
    }

    #[test]
    fn test_execution_slots_carry_no_literal() {
        let mut method = Method::new("Run");
        let start = method.add_block(BlockKind::Start);
        let output = method
            .find_slot(start, SlotDirection::Output, SlotKind::Execution, None)
            .expect("start output");
        assert_eq!(
            method.set_slot_value(output, Some(Value::from(1))),
            Err(GraphError::ExecutionSlotValue(output))
        );
    }

    #[test]
    fn test_removed_link_frees_the_input() {
        let mut method = Method::new("Run");
        let first = add_getter(&mut method, "x");
        let second = add_getter(&mut method, "y");
        let set = add_setter(&mut method, "x");

        let link = method.link_value(first, None, set, None).expect("first link");
        let removed = method.remove_link(link).expect("remove");
        assert_eq!(removed.target, value_input(&method, set, None));
        assert!(method.link(link).is_none());
        assert_eq!(method.remove_link(link), Err(GraphError::LinkNotFound(link)));

        let replacement = method.link_value(second, None, set, None).expect("relink");
        assert!(method.link(replacement).is_some());
    }

    #[test]
    fn test_missing_named_slot_is_reported() {
        let mut method = Method::new("Run");
        let start = method.add_block(BlockKind::Start);
        let set = add_setter(&mut method, "x");
        assert!(matches!(
            method.link_execution(start, Some("Loop"), set),
            Err(GraphError::MissingSlot { block, .. }) if block == start
        ));
    }
}

#[cfg(test)]
mod editing_tests {
    use super::*;

    #[test]
    fn test_update_block_keeps_surviving_slots() {
        let mut method = Method::new("Run");
        let analyzer = LexicalAnalyzer::default();
        let code = method.add_block_with(
            BlockKind::FreeformCode {
                code: "Log(a + b);".to_string(),
            },
            &analyzer,
        );
        let get_x = add_getter(&mut method, "x");
        let get_y = add_getter(&mut method, "y");
        method.link_value(get_x, None, code, Some("a")).expect("x -> a");
        method.link_value(get_y, None, code, Some("b")).expect("y -> b");
        let a_before = value_input(&method, code, Some("a"));

        method
            .update_block(
                code,
                BlockKind::FreeformCode {
                    code: "Log(a * 2);".to_string(),
                },
                &analyzer,
            )
            .expect("update");

        assert_eq!(value_input(&method, code, Some("a")), a_before);
        assert!(method
            .find_slot(code, SlotDirection::Input, SlotKind::Value, Some("b"))
            .is_none());
        assert_eq!(method.links().count(), 1);
        assert!(method.links().all(|l| l.target == a_before));
    }

    #[test]
    fn test_remove_block_drops_its_links() {
        let mut method = Method::new("Run");
        let start = method.add_block(BlockKind::Start);
        let set = add_setter(&mut method, "x");
        let get = add_getter(&mut method, "y");
        method.link_execution(start, None, set).expect("link");
        method.link_value(get, None, set, None).expect("link");

        let removed = method.remove_block(set).expect("remove");
        assert_eq!(removed.id, set);
        assert_eq!(method.links().count(), 0);
        assert_eq!(
            method.remove_block(set).map(|b| b.id),
            Err(GraphError::BlockNotFound(set))
        );
    }

    #[test]
    fn test_parameters_are_unique() {
        let mut method = Method::new("Apply");
        method
            .add_parameter(Parameter::new("amount", "int"))
            .expect("first");
        assert_eq!(
            method.add_parameter(Parameter::new("amount", "float")),
            Err(GraphError::DuplicateParameter("amount".to_string()))
        );
        assert!(method.remove_parameter("amount").is_ok());
        assert_eq!(
            method.remove_parameter("amount"),
            Err(GraphError::ParameterNotFound("amount".to_string()))
        );
    }

    #[test]
    fn test_ids_are_unique_across_blocks_slots_and_links() {
        let method = branch_method();
        let mut ids: Vec<u32> = method.blocks().map(|b| b.id.0).collect();
        ids.extend(method.blocks().flat_map(|b| b.slots().iter().map(|s| s.id.0)));
        ids.extend(method.links().map(|l| l.id.0));
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}

#[cfg(test)]
mod serialization_tests {
    use super::*;

    #[test]
    fn test_script_json_round_trip() {
        let script = fixture_script(branch_method());
        let json = script.to_json().expect("serialize");
        let restored = Script::from_json(&json).expect("deserialize");
        assert_eq!(restored, script);
    }

    #[test]
    fn test_hand_written_json_compiles() {
        let script = Script::from_json(SIMPLE_SCRIPT_JSON).expect("Failed to parse script");
        assert_eq!(script.name, "Counter");
        let method = script.method("Reset").expect("method");
        assert_eq!(method.blocks().count(), 2);

        let compiled = Compiler::builder(script.clone()).build().compile();
        let reset = compiled.class.method("Reset").expect("Reset compiled");
        assert_eq!(flatten(&reset.body), "x = 5;");
        assert!(compiled.is_clean());
    }

    #[test]
    fn test_loaded_graph_allocates_fresh_ids() {
        let mut script = Script::from_json(SIMPLE_SCRIPT_JSON).expect("Failed to parse script");
        let method = script.method_mut("Reset").expect("method");
        let block = add_getter(method, "x");
        assert!(block.0 > 6);
    }
}
