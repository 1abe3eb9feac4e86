//! Integration tests for Kairo
//!
//! End-to-end tests covering whole-script compilation, printing and persistence.
mod common;
use common::*;
use kairo::error::ScriptConversionError;
use kairo::prelude::*;
use std::fs;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_script_prints_as_a_class() {
        let compiler = Compiler::builder(fixture_script(branch_method())).build();
        let compiled = compiler.compile();
        assert!(compiled.is_clean());

        let expected = "\
using System;

namespace Tests
{
    public partial class Fixture
    {
        public int x;
        public int y;
        public List<int> items;
        public Player player;

        public void Branch()
        {
            if (true) goto block3;
            x = 2;
            return;
        block3:
            x = 1;
        }
    }
}
";
        assert_eq!(compiled.source(&compiler.printer()), expected);
    }

    #[test]
    fn test_loop_prints_nested_block() {
        let mut method = Method::new("Sum").with_accessibility(Accessibility::Private);
        let start = method.add_block(BlockKind::Start);
        let each = method.add_block(BlockKind::Foreach);
        let items = add_getter(&mut method, "items");
        let body = add_setter(&mut method, "x");
        method.link_value(items, None, each, None).expect("link");
        method.link_value(each, Some("Item"), body, None).expect("link");
        method.link_execution(start, None, each).expect("link");
        method.link_execution(each, Some("Loop"), body).expect("link");

        let options = CompilerOptions {
            indent: "  ".to_string(),
            ..CompilerOptions::default()
        };
        let compiler = Compiler::builder(fixture_script(method))
            .with_options(options)
            .build();
        let compiled = compiler.compile();
        let declaration = compiled.class.method("Sum").expect("Sum compiled");

        assert_eq!(
            compiler.printer().print_method(declaration, 0),
            "private void Sum()\n{\n  foreach (var item0 in items)\n  {\n    x = item0;\n  }\n}\n"
        );
    }

    #[test]
    fn test_signatures_and_base_class_are_printed() {
        let mut heal = Method::new("Heal")
            .with_accessibility(Accessibility::Protected)
            .with_virtual(true)
            .with_return_type("bool");
        heal.add_parameter(Parameter::new("amount", "int").by_ref())
            .expect("parameter");
        let create = Method::new("Create").with_static(true);

        let script = Script::new("Game", "Enemy")
            .with_base_class("MonoBehaviour")
            .with_property(Property::new("hp", "int"))
            .with_method(heal)
            .with_method(create);
        assert_eq!(
            script.property("hp").map(|p| p.type_name.as_str()),
            Some("int")
        );

        let compiler = Compiler::builder(script).build();
        let compiled = compiler.compile();
        let printer = compiler.printer();

        let heal = compiled.class.method("Heal").expect("Heal compiled");
        assert_eq!(
            printer.print_method(heal, 0),
            "protected virtual bool Heal(ref int amount)\n{\n}\n"
        );
        let create = compiled.class.method("Create").expect("Create compiled");
        assert_eq!(printer.print_method(create, 0), "public static void Create()\n{\n}\n");

        let source = compiled.source(&printer);
        assert!(source.contains("    public partial class Enemy : MonoBehaviour\n"));
        assert!(source.contains("        public int hp;\n"));
        // Neither method has a start block.
        assert_eq!(compiled.count(Severity::Warning), 2);
    }

    #[test]
    fn test_reports_cover_every_method() {
        let mut broken = Method::new("Broken");
        let start = broken.add_block(BlockKind::Start);
        let set = add_setter(&mut broken, "x");
        broken.link_execution(start, None, set).expect("link");

        let script = fixture_script(branch_method()).with_method(broken);
        let compiled = Compiler::builder(script).build().compile();

        assert_eq!(compiled.reports.len(), 2);
        assert_eq!(compiled.class.methods.len(), 2);
        assert_eq!(compiled.count(Severity::Error), 1);
        assert!(!compiled.is_clean());
        let report = compiled.report("Broken").expect("report");
        assert!(report.error.is_none());
        assert!(report.diagnostics.has_errors());
    }

    #[test]
    fn test_artifact_round_trip() {
        let compiled = Compiler::builder(fixture_script(branch_method()))
            .build()
            .compile();

        let bytes = compiled.to_bytes().expect("Failed to encode");
        let restored = CompiledScript::from_bytes(&bytes).expect("Failed to decode");
        assert_eq!(restored, compiled);

        let path = std::env::temp_dir().join(format!("kairo-artifact-{}.bin", std::process::id()));
        let path = path.to_str().expect("utf-8 temp path");
        compiled.save(path).expect("Failed to save");
        let loaded = CompiledScript::from_file(path).expect("Failed to load");
        fs::remove_file(path).ok();
        assert_eq!(loaded, compiled);
    }

    #[test]
    fn test_corrupt_artifact_is_rejected() {
        assert!(CompiledScript::from_bytes(&[0xff, 0xff, 0xff]).is_err());
        assert!(CompiledScript::from_file("/nonexistent/kairo.bin").is_err());
    }

    struct Assignments(Vec<(&'static str, f64)>);

    impl IntoScript for Assignments {
        fn into_script(self) -> std::result::Result<Script, ScriptConversionError> {
            let mut method = Method::new("Apply");
            let mut previous = method.add_block(BlockKind::Start);
            for (name, value) in self.0 {
                let set = add_assignment(&mut method, name, value);
                method.link_execution(previous, None, set)?;
                previous = set;
            }
            Ok(fixture_script(method))
        }
    }

    #[test]
    fn test_custom_format_converts_into_script() {
        let script = Assignments(vec![("x", 1.0), ("y", 2.5)])
            .into_script()
            .expect("Failed to convert");
        let compiled = Compiler::builder(script).build().compile();
        let apply = compiled.class.method("Apply").expect("Apply compiled");
        assert_eq!(flatten(&apply.body), "x = 1; y = 2.5;");
    }

    #[test]
    fn test_options_load_from_json() {
        let options = CompilerOptions::from_json(r#"{ "label_prefix": "L", "reachability": "Dominators" }"#)
            .expect("Failed to parse options");
        assert_eq!(options.label_prefix, "L");
        assert_eq!(options.reachability, ReachabilityStrategy::Dominators);
        assert_eq!(options.local_prefix, "local");

        let compiled = compile_method_with(branch_method(), options).expect("Failed to compile");
        assert_eq!(
            flatten(&compiled.declaration.body),
            "if (true) goto L3; x = 2; return; L3: x = 1;"
        );
    }
}
