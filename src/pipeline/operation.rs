//! Wire operations and the message that carries them.
//!
//! ```text
//! {"head":{"requestCounter":3},
//!  "operations":[{"action":"create","target":"w2","type":"rwt.widgets.List",
//!                 "parent":"w1","properties":{"items":["a"]}},
//!                {"action":"set","target":"w1","properties":{"text":"x"}},
//!                {"action":"destroy","target":"w5"},
//!                {"action":"call","target":"w2","method":"focus"}]}
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{NodeId, PropValue, PropertyMap};

/// One instruction for the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Operation {
    Create {
        target: NodeId,
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<NodeId>,
        #[serde(default)]
        properties: PropertyMap,
    },
    Set {
        target: NodeId,
        properties: PropertyMap,
    },
    Destroy {
        target: NodeId,
    },
    Call {
        target: NodeId,
        method: String,
        #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
        properties: PropertyMap,
    },
}

impl Operation {
    pub fn target(&self) -> &NodeId {
        match self {
            Operation::Create { target, .. }
            | Operation::Set { target, .. }
            | Operation::Destroy { target }
            | Operation::Call { target, .. } => target,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::Set { .. } => "set",
            Operation::Destroy { .. } => "destroy",
            Operation::Call { .. } => "call",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Head {
    pub request_counter: u64,
}

/// Everything one committed render cycle tells the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub head: Head,
    pub operations: Vec<Operation>,
}

impl Message {
    pub fn new(request_counter: u64, operations: Vec<Operation>) -> Self {
        Self {
            head: Head { request_counter },
            operations,
        }
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The CREATE for `target`, if this message has one.
    pub fn find_create(&self, target: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| {
            matches!(op, Operation::Create { .. }) && op.target().as_str() == target
        })
    }

    /// Value of `name` in the last SET for `target`.
    pub fn find_set_property(&self, target: &str, name: &str) -> Option<&PropValue> {
        self.operations.iter().rev().find_map(|op| match op {
            Operation::Set { target: id, properties } if id.as_str() == target => {
                properties.get(name)
            }
            _ => None,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
