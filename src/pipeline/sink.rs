//! Property-change sink.
//!
//! A render cycle replays its operations into a [`ChangeSink`]. The sink
//! owns serialization; the cycle only commits once every operation has been
//! accepted. [`MessageWriter`] is the sink that builds a [`Message`].

use crate::error::Result;
use crate::pipeline::operation::{Message, Operation};
use crate::types::{NodeId, PropValue, PropertyMap};

/// Receiver of the changes of one render cycle.
///
/// Returning an error aborts the cycle: no change store advances and the
/// same changes are produced again next time.
pub trait ChangeSink {
    fn create(
        &mut self,
        target: &NodeId,
        type_name: &str,
        parent: Option<&NodeId>,
        properties: &PropertyMap,
    ) -> Result<()>;

    /// Called once per changed property of a live node.
    fn notify_changed(&mut self, target: &NodeId, name: &str, value: &PropValue) -> Result<()>;

    fn destroy(&mut self, target: &NodeId) -> Result<()>;

    fn call(&mut self, target: &NodeId, method: &str, properties: &PropertyMap) -> Result<()> {
        let _ = (target, method, properties);
        Ok(())
    }
}

/// Feed one operation to `sink`.
pub(crate) fn replay(sink: &mut dyn ChangeSink, operation: &Operation) -> Result<()> {
    match operation {
        Operation::Create {
            target,
            type_name,
            parent,
            properties,
        } => sink.create(target, type_name, parent.as_ref(), properties),
        Operation::Set { target, properties } => {
            for (name, value) in properties {
                sink.notify_changed(target, name, value)?;
            }
            Ok(())
        }
        Operation::Destroy { target } => sink.destroy(target),
        Operation::Call {
            target,
            method,
            properties,
        } => sink.call(target, method, properties),
    }
}

/// Sink collecting operations into a [`Message`].
///
/// Consecutive property changes of the same node share one SET.
#[derive(Debug, Default)]
pub struct MessageWriter {
    operations: Vec<Operation>,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn finish(self, request_counter: u64) -> Message {
        Message::new(request_counter, self.operations)
    }
}

impl ChangeSink for MessageWriter {
    fn create(
        &mut self,
        target: &NodeId,
        type_name: &str,
        parent: Option<&NodeId>,
        properties: &PropertyMap,
    ) -> Result<()> {
        self.operations.push(Operation::Create {
            target: target.clone(),
            type_name: type_name.to_string(),
            parent: parent.cloned(),
            properties: properties.clone(),
        });
        Ok(())
    }

    fn notify_changed(&mut self, target: &NodeId, name: &str, value: &PropValue) -> Result<()> {
        if let Some(Operation::Set {
            target: last,
            properties,
        }) = self.operations.last_mut()
        {
            if last == target {
                properties.insert(name.to_string(), value.clone());
                return Ok(());
            }
        }
        let mut properties = PropertyMap::new();
        properties.insert(name.to_string(), value.clone());
        self.operations.push(Operation::Set {
            target: target.clone(),
            properties,
        });
        Ok(())
    }

    fn destroy(&mut self, target: &NodeId) -> Result<()> {
        self.operations.push(Operation::Destroy {
            target: target.clone(),
        });
        Ok(())
    }

    fn call(&mut self, target: &NodeId, method: &str, properties: &PropertyMap) -> Result<()> {
        self.operations.push(Operation::Call {
            target: target.clone(),
            method: method.to_string(),
            properties: properties.clone(),
        });
        Ok(())
    }
}
