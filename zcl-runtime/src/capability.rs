// zcl-runtime/src/capability.rs
// ============================================================================
// Module: Runtime Capabilities
// Description: The fixed capability vocabulary a runtime strategy may expose.
// Purpose: Let the Resolver match a required capability set against what
//          each registered runtime factory advertises (§4.D).
// Dependencies: std
// ============================================================================

//! ## Overview
//! Capabilities are a closed set; an unrecognized capability name is a
//! configuration error caught at campaign-lint time, not a runtime concern.

use std::fmt;

// ============================================================================
// SECTION: Capability
// ============================================================================

/// A single runtime capability a strategy may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// The strategy can start a conversation thread.
    ThreadStart,
    /// The strategy streams asynchronous turn/item events.
    EventStream,
    /// The strategy supports `turn/interrupt`.
    Interrupt,
    /// The strategy supports `turn/steer`.
    Steer,
    /// The strategy can report tool-call events.
    ToolCall,
    /// The strategy can list available models.
    ModelList,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ThreadStart => "thread_start",
            Self::EventStream => "event_stream",
            Self::Interrupt => "interrupt",
            Self::Steer => "steer",
            Self::ToolCall => "tool_call",
            Self::ModelList => "model_list",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::Capability;

    #[test]
    fn display_matches_the_wire_vocabulary() {
        assert_eq!(Capability::ThreadStart.to_string(), "thread_start");
        assert_eq!(Capability::ModelList.to_string(), "model_list");
    }
}
