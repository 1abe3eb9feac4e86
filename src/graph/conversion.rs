use super::script::Script;
use crate::error::ScriptConversionError;

/// A trait for custom data models that can be converted into a kairo `Script`.
///
/// Editors and asset pipelines usually keep their own node format. Implementing this trait on
/// that format provides the translation layer the compiler needs.
///
/// # Example
///
/// ```rust,no_run
/// use kairo::prelude::*;
/// use kairo::error::ScriptConversionError;
///
/// struct MyAssignment { variable: String, value: f64 }
/// struct MyAsset { class_name: String, assignments: Vec<MyAssignment> }
///
/// impl IntoScript for MyAsset {
///     fn into_script(self) -> std::result::Result<Script, ScriptConversionError> {
///         let mut method = Method::new("Run");
///         let mut previous = method.add_block(BlockKind::Start);
///         for assignment in self.assignments {
///             let set = method.add_block(BlockKind::VariableSet { name: assignment.variable });
///             method.link_execution(previous, None, set)?;
///             let value = method
///                 .find_slot(set, SlotDirection::Input, SlotKind::Value, None)
///                 .ok_or_else(|| ScriptConversionError::ValidationError("no value slot".into()))?;
///             method.set_slot_value(value, Some(Value::Number(assignment.value)))?;
///             previous = set;
///         }
///         Ok(Script::new("Generated", self.class_name).with_method(method))
///     }
/// }
/// ```
pub trait IntoScript {
    /// Consumes the object and converts it into a compilable script.
    fn into_script(self) -> Result<Script, ScriptConversionError>;
}

impl IntoScript for Script {
    fn into_script(self) -> Result<Script, ScriptConversionError> {
        Ok(self)
    }
}
