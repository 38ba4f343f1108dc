//! Render Cycle - diff the dirty nodes and commit the result.
//!
//! A cycle is computed up front and only touches session state when it is
//! committed:
//!
//! 1. Populate uncached virtual rows about to be created (if configured)
//! 2. DESTROY for every pending disposal, in disposal order
//! 3. Dirty nodes in creation order: CREATE with the non-default property
//!    set for new nodes, SET with the change-store diff for live ones
//! 4. CALL for every queued method call whose target is still alive
//!
//! Committing advances every change store, marks created nodes initialized
//! and clears the dirty set and queues. Dropping or aborting the cycle
//! changes nothing, so the next cycle recomputes the same operations.

use crate::error::Result;
use crate::pipeline::operation::{Message, Operation};
use crate::pipeline::sink::{self, ChangeSink};
use crate::session::Session;
use crate::types::{NodeFlags, NodeKind, PropertyMap};

/// Operations of one pending render cycle.
pub struct RenderCycle<'a> {
    session: &'a mut Session,
    operations: Vec<Operation>,
    /// Values each change store takes on commit.
    snapshots: Vec<(usize, PropertyMap)>,
    created: Vec<usize>,
    finished: bool,
}

impl<'a> RenderCycle<'a> {
    pub(crate) fn prepare(session: &'a mut Session) -> Result<Self> {
        if session.config.materialize_on_render {
            populate_new_rows(session)?;
        }

        let registry = &session.registry;
        let mut operations: Vec<Operation> = registry
            .pending_destroys()
            .iter()
            .map(|pending| Operation::Destroy {
                target: pending.id.clone(),
            })
            .collect();
        let mut snapshots = Vec::new();
        let mut created = Vec::new();

        for slot in registry.dirty_indices() {
            let Some(node) = registry.get(slot) else { continue };
            let live = node.synced_properties();

            if node.is_initialized() {
                let changed = node.store().changed(&live);
                if changed.is_empty() {
                    continue;
                }
                operations.push(Operation::Set {
                    target: node.id().clone(),
                    properties: changed.clone(),
                });
                snapshots.push((slot, changed));
            } else {
                let properties = live
                    .iter()
                    .filter(|(name, value)| !node.is_default(name, value))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                operations.push(Operation::Create {
                    target: node.id().clone(),
                    type_name: node.type_name().to_string(),
                    parent: node.parent.and_then(|parent| registry.node_id(parent)).cloned(),
                    properties,
                });
                snapshots.push((slot, live));
                created.push(slot);
            }
        }

        for call in &session.calls {
            if registry.index_of(call.target.as_str()).is_none() {
                continue;
            }
            operations.push(Operation::Call {
                target: call.target.clone(),
                method: call.method.clone(),
                properties: call.properties.clone(),
            });
        }

        Ok(Self {
            session,
            operations,
            snapshots,
            created,
            finished: false,
        })
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Counter the message will carry once committed.
    pub fn request_counter(&self) -> u64 {
        self.session.request_counter + 1
    }

    /// Hand every operation to `sink`. Stops at the first rejection.
    pub fn replay_into(&self, sink: &mut dyn ChangeSink) -> Result<()> {
        for operation in &self.operations {
            sink::replay(sink, operation)?;
        }
        Ok(())
    }

    /// Advance every change store and return the message.
    pub fn commit(mut self) -> Message {
        self.finished = true;
        let operations = std::mem::take(&mut self.operations);
        let snapshots = std::mem::take(&mut self.snapshots);
        let created = std::mem::take(&mut self.created);
        let session = &mut *self.session;

        for (slot, values) in snapshots {
            if let Some(node) = session.registry.get_mut(slot) {
                node.store.preserve_all(&values);
            }
        }
        for slot in created {
            if let Some(node) = session.registry.get_mut(slot) {
                node.flags.insert(NodeFlags::INITIALIZED);
            }
        }
        session.registry.clear_dirty();
        session.registry.clear_destroys();
        session.calls.clear();
        session.request_counter += 1;

        tracing::debug!(
            "Committed render cycle {} with {} operations",
            session.request_counter,
            operations.len()
        );
        Message::new(session.request_counter, operations)
    }

    /// Discard the cycle. Same as dropping it.
    pub fn abort(self) {}
}

impl Drop for RenderCycle<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                "Aborted render cycle with {} operations; change stores kept",
                self.operations.len()
            );
        }
    }
}

/// Populate virtual rows that are about to be created on the client.
fn populate_new_rows(session: &mut Session) -> Result<()> {
    let registry = &session.registry;
    let pending: Vec<usize> = registry
        .dirty_indices()
        .into_iter()
        .filter(|&slot| {
            registry.get(slot).is_some_and(|node| {
                node.kind() == NodeKind::TreeItem && !node.is_initialized() && !node.is_cached()
            })
        })
        .collect();

    for slot in pending {
        session.registry.materialize(slot, session.provider.as_mut())?;
    }
    Ok(())
}
