//! Turn graph: nodes, edges and the single conditional branch

use crate::types::CompanionState;
use chrono::{DateTime, Duration, Local};
use std::fmt;

/// A step of the turn workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowNode {
    /// Classify the latest user message
    AnalyzeInput,
    /// Speak first
    ProactiveGreeting,
    /// Reply to the latest user message
    GenerateResponse,
    /// Run capabilities the message asks for
    ToolExecution,
    /// Recompute mood and adjust energy
    UpdateMood,
    /// Append the tired message when energy is low
    CheckEnergy,
}

impl WorkflowNode {
    /// Every node, in the order of the main path
    pub const ALL: [WorkflowNode; 6] = [
        WorkflowNode::AnalyzeInput,
        WorkflowNode::ProactiveGreeting,
        WorkflowNode::GenerateResponse,
        WorkflowNode::ToolExecution,
        WorkflowNode::UpdateMood,
        WorkflowNode::CheckEnergy,
    ];

    /// Entry node of every turn
    pub const START: WorkflowNode = WorkflowNode::AnalyzeInput;

    /// snake_case name, also used as the `route` context value
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowNode::AnalyzeInput => "analyze_input",
            WorkflowNode::ProactiveGreeting => "proactive_greeting",
            WorkflowNode::GenerateResponse => "generate_response",
            WorkflowNode::ToolExecution => "tool_execution",
            WorkflowNode::UpdateMood => "update_mood",
            WorkflowNode::CheckEnergy => "check_energy",
        }
    }
}

impl fmt::Display for WorkflowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values fixed for the duration of one turn
#[derive(Debug, Clone, Copy)]
pub struct TurnContext {
    /// Time of the call, read once
    pub now: DateTime<Local>,
    /// Idle period after which the turn opens with a greeting
    pub idle_window: Duration,
}

/// Condition evaluated on a conditional edge
pub type Predicate = fn(&CompanionState, &TurnContext) -> bool;

/// Outgoing edge(s) of a node
#[derive(Clone, Copy)]
pub enum Transition {
    /// Unconditional edge
    Next(WorkflowNode),
    /// Go to `if_true` when `predicate` holds, else `if_false`
    Branch {
        /// Edge condition
        predicate: Predicate,
        /// Target when the condition holds
        if_true: WorkflowNode,
        /// Target otherwise
        if_false: WorkflowNode,
    },
    /// End of the turn
    Terminal,
}

/// The edge table
pub fn transition(node: WorkflowNode) -> Transition {
    match node {
        WorkflowNode::AnalyzeInput => Transition::Branch {
            predicate: should_greet,
            if_true: WorkflowNode::ProactiveGreeting,
            if_false: WorkflowNode::GenerateResponse,
        },
        WorkflowNode::GenerateResponse => Transition::Next(WorkflowNode::ToolExecution),
        WorkflowNode::ProactiveGreeting => Transition::Next(WorkflowNode::UpdateMood),
        WorkflowNode::ToolExecution => Transition::Next(WorkflowNode::UpdateMood),
        WorkflowNode::UpdateMood => Transition::Next(WorkflowNode::CheckEnergy),
        WorkflowNode::CheckEnergy => Transition::Terminal,
    }
}

/// Follow the edge out of `node`; `None` at the end of the turn
pub fn next(node: WorkflowNode, state: &CompanionState, ctx: &TurnContext) -> Option<WorkflowNode> {
    match transition(node) {
        Transition::Next(target) => Some(target),
        Transition::Branch {
            predicate,
            if_true,
            if_false,
        } => Some(if predicate(state, ctx) { if_true } else { if_false }),
        Transition::Terminal => None,
    }
}

/// Whether the turn opens with a greeting instead of a reply.
///
/// True when the conversation is empty or the last interaction is older than
/// the idle window. A recent conversation is answered even when the last
/// message is already a reply. An unparsable `last_interaction` imposes no
/// constraint.
pub fn should_greet(state: &CompanionState, ctx: &TurnContext) -> bool {
    if state.messages.is_empty() {
        return true;
    }
    state
        .last_interaction_at()
        .map(|last| ctx.now.signed_duration_since(last) > ctx.idle_window)
        .unwrap_or(false)
}
