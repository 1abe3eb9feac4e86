use super::{BlockId, Parameter, Slot, SlotDefinition, SlotDirection, SlotFlags, SlotId, SlotKind};
use crate::analysis::FragmentAnalyzer;
use serde::{Deserialize, Serialize};

pub const CONDITION_TYPE: &str = "bool";
pub const TRUE_SLOT: &str = "True";
pub const FALSE_SLOT: &str = "False";
pub const LOOP_SLOT: &str = "Loop";
pub const ITEM_SLOT: &str = "Item";
pub const COMPLETED_SLOT: &str = "Completed";
pub const THIS_SLOT: &str = "this";

/// Configuration of a function-call block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Type the function is declared on, used as the receiver of static calls.
    pub declaring_type: Option<String>,
    /// When set, the first argument slot (`this`) becomes the call receiver.
    pub is_member_call: bool,
    pub parameters: Vec<Parameter>,
    /// `None` for `void` functions.
    pub return_type: Option<String>,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn on_type(mut self, declaring_type: impl Into<String>) -> Self {
        self.declaring_type = Some(declaring_type.into());
        self
    }

    pub fn member(mut self) -> Self {
        self.is_member_call = true;
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returning(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into()).filter(|t| t != "void");
        self
    }
}

/// The concrete kinds of block a method graph can contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockKind {
    Start,
    ConditionalBranch,
    Foreach,
    VariableGet { name: String },
    VariableSet { name: String },
    FreeformCode { code: String },
    FreeformExpression { expression: String },
    FunctionCall(FunctionCall),
}

impl BlockKind {
    /// Execution blocks act as statements and take part in control flow.
    pub fn is_execution(&self) -> bool {
        !self.is_expression()
    }

    /// Expression blocks are pure value producers, generated wherever they are consumed.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            BlockKind::VariableGet { .. } | BlockKind::FreeformExpression { .. }
        )
    }

    pub fn title(&self) -> &'static str {
        match self {
            BlockKind::Start => "Start",
            BlockKind::ConditionalBranch => "ConditionalBranch",
            BlockKind::Foreach => "Foreach",
            BlockKind::VariableGet { .. } => "VariableGet",
            BlockKind::VariableSet { .. } => "VariableSet",
            BlockKind::FreeformCode { .. } => "FreeformCode",
            BlockKind::FreeformExpression { .. } => "FreeformExpression",
            BlockKind::FunctionCall(_) => "FunctionCall",
        }
    }

    /// Derives the slot layout for this configuration.
    ///
    /// Execution blocks always start with their fixed execution input and auto-flow output
    /// so regenerated layouts keep those identities stable.
    pub fn generate_slots(&self, analyzer: &dyn FragmentAnalyzer) -> Vec<SlotDefinition> {
        match self {
            BlockKind::Start => vec![SlotDefinition::auto_flow_output()],
            BlockKind::ConditionalBranch => vec![
                SlotDefinition::execution_input(),
                SlotDefinition::named_execution_output(Some(FALSE_SLOT)).auto_flow(),
                SlotDefinition::named_execution_output(Some(TRUE_SLOT)),
                SlotDefinition::value_input(None).with_type(CONDITION_TYPE),
            ],
            BlockKind::Foreach => vec![
                SlotDefinition::execution_input(),
                SlotDefinition::named_execution_output(Some(COMPLETED_SLOT)).auto_flow(),
                SlotDefinition::named_execution_output(Some(LOOP_SLOT)),
                SlotDefinition::value_input(None),
                SlotDefinition::value_output(Some(ITEM_SLOT)),
            ],
            BlockKind::VariableGet { .. } => vec![SlotDefinition::value_output(None)],
            BlockKind::VariableSet { .. } => vec![
                SlotDefinition::execution_input(),
                SlotDefinition::auto_flow_output(),
                SlotDefinition::value_input(None),
            ],
            BlockKind::FreeformCode { code } => {
                let analysis = analyzer.analyze_statements(code);
                let mut slots = vec![
                    SlotDefinition::execution_input(),
                    SlotDefinition::auto_flow_output(),
                ];
                for usage in &analysis.identifiers {
                    if usage.role.is_input() {
                        slots.push(SlotDefinition::value_input(Some(usage.name.as_str())));
                    }
                    if usage.role.is_output() {
                        slots.push(SlotDefinition::value_output(Some(usage.name.as_str())));
                    }
                }
                if analysis.trailing_return.is_some() {
                    slots.push(SlotDefinition::value_output(None));
                }
                slots
            }
            BlockKind::FreeformExpression { expression } => {
                let analysis = analyzer.analyze_expression(expression);
                let mut slots = vec![SlotDefinition::value_output(None)];
                slots.extend(
                    analysis
                        .identifiers
                        .iter()
                        .map(|usage| SlotDefinition::value_input(Some(usage.name.as_str()))),
                );
                slots
            }
            BlockKind::FunctionCall(call) => {
                let mut slots = vec![
                    SlotDefinition::execution_input(),
                    SlotDefinition::auto_flow_output(),
                ];
                if call.is_member_call {
                    let this_slot = SlotDefinition::value_input(Some(THIS_SLOT));
                    slots.push(match &call.declaring_type {
                        Some(ty) => this_slot.with_type(ty.clone()),
                        None => this_slot,
                    });
                }
                for parameter in &call.parameters {
                    slots.push(
                        SlotDefinition::value_input(Some(parameter.name.as_str()))
                            .with_type(parameter.type_name.clone()),
                    );
                }
                if call.return_type.is_some() {
                    slots.push(SlotDefinition::value_output(None));
                }
                slots
            }
        }
    }
}

/// A node of the visual-script graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    /// Reference to the block this one was inherited from, if any.
    pub base: Option<String>,
    pub kind: BlockKind,
    slots: Vec<Slot>,
}

impl Block {
    pub(crate) fn new(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            base: None,
            kind,
            slots: Vec::new(),
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub(crate) fn slot_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.id == id)
    }

    pub fn is_execution(&self) -> bool {
        self.kind.is_execution()
    }

    pub fn find_slot(
        &self,
        direction: SlotDirection,
        kind: SlotKind,
        name: Option<&str>,
    ) -> Option<&Slot> {
        self.slots.iter().find(|s| s.matches(direction, kind, name))
    }

    pub fn find_slot_by_flags(
        &self,
        direction: SlotDirection,
        kind: SlotKind,
        flags: SlotFlags,
    ) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|s| s.direction == direction && s.kind == kind && s.flags == flags)
    }

    /// The execution output control falls into once this block has run.
    pub fn auto_flow_slot(&self) -> Option<&Slot> {
        self.find_slot_by_flags(SlotDirection::Output, SlotKind::Execution, SlotFlags::AUTO_FLOW)
    }

    /// Replaces the slot list with `definitions`, reusing the identity of every existing slot
    /// that still matches by `(direction, kind, name)`.
    ///
    /// Returns the ids of slots that no longer exist.
    pub(crate) fn apply_slot_definitions(
        &mut self,
        definitions: Vec<SlotDefinition>,
        next_id: &mut u32,
    ) -> Vec<SlotId> {
        let mut previous = std::mem::take(&mut self.slots);
        let mut slots = Vec::with_capacity(definitions.len());

        for definition in definitions {
            let reused = previous
                .iter()
                .position(|existing| definition.matches(existing))
                .map(|position| previous.remove(position));

            let slot = match reused {
                Some(mut existing) => {
                    existing.type_name = definition.type_name;
                    existing.flags = definition.flags;
                    existing
                }
                None => {
                    let id = SlotId(*next_id);
                    *next_id += 1;
                    definition.instantiate(id, self.id)
                }
            };
            slots.push(slot);
        }

        self.slots = slots;
        previous.into_iter().map(|s| s.id).collect()
    }
}
