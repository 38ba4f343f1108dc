//! End-to-end render cycles: what the client is told, and when.

use std::cell::Cell;
use std::rc::Rc;

use spark_remote::{
    ChangeSink, Message, MessageWriter, Node, NodeId, Operation, PopulateError, PropValue,
    PropertyMap, Removal, Selection, Session, SessionConfig, SyncError,
};

fn session() -> Session {
    Session::new(SessionConfig::default())
}

fn actions(message: &Message) -> Vec<String> {
    message
        .operations
        .iter()
        .map(|op| format!("{} {}", op.action(), op.target()))
        .collect()
}

/// Sink that fails once it has accepted `budget` calls.
struct FlakySink {
    budget: usize,
}

impl FlakySink {
    fn spend(&mut self) -> spark_remote::Result<()> {
        if self.budget == 0 {
            return Err(SyncError::Sink("connection reset".to_string()));
        }
        self.budget -= 1;
        Ok(())
    }
}

impl ChangeSink for FlakySink {
    fn create(&mut self, _: &NodeId, _: &str, _: Option<&NodeId>, _: &PropertyMap) -> spark_remote::Result<()> {
        self.spend()
    }

    fn notify_changed(&mut self, _: &NodeId, _: &str, _: &PropValue) -> spark_remote::Result<()> {
        self.spend()
    }

    fn destroy(&mut self, _: &NodeId) -> spark_remote::Result<()> {
        self.spend()
    }
}

#[test]
fn test_second_render_without_mutation_is_empty() {
    let mut session = session();
    let shell = session.create_node("rwt.widgets.Shell", None, None).unwrap();
    session.set_property(&shell, "text", "Main").unwrap();

    let first = session.render().unwrap();
    assert_eq!(first.operation_count(), 1);
    assert!(session.render().unwrap().is_empty());
}

#[test]
fn test_create_carries_state_then_set_carries_diff() {
    let mut session = session();
    let shell = session.create_node("rwt.widgets.Shell", None, None).unwrap();
    let list = session.create_list(Some(&shell), false).unwrap();
    session.set_items(&list, &["a", "b", "c"]).unwrap();
    session.set_selection(&list, Selection::Index(1)).unwrap();

    let first = session.render().unwrap();
    assert_eq!(actions(&first), vec!["create w1", "create w2"]);
    let Some(Operation::Create {
        parent, properties, ..
    }) = first.find_create("w2")
    else {
        panic!("list not created");
    };
    assert_eq!(parent.as_ref(), Some(&shell));
    assert_eq!(properties["items"], PropValue::from(vec!["a", "b", "c"]));
    assert_eq!(properties["selectionIndices"], PropValue::from(vec![1usize]));

    session.remove_items(&list, Removal::Index(0)).unwrap();
    let second = session.render().unwrap();
    assert_eq!(actions(&second), vec!["set w2"]);
    assert_eq!(
        second.find_set_property("w2", "items"),
        Some(&PropValue::from(vec!["b", "c"]))
    );
    assert_eq!(
        second.find_set_property("w2", "selectionIndices"),
        Some(&PropValue::from(vec![0usize]))
    );
}

#[test]
fn test_defaults_are_left_out_of_create() {
    let mut session = session();
    let tree = session.create_tree(None, false).unwrap();
    session.create_node("rwt.widgets.Label", None, None).unwrap();

    let message = session.render().unwrap();
    let Some(Operation::Create { properties, .. }) = message.find_create(tree.as_str()) else {
        panic!("tree not created");
    };
    assert!(properties.is_empty());
}

#[test]
fn test_unsent_node_disposes_silently() {
    let mut session = session();
    let shell = session.create_node("rwt.widgets.Shell", None, None).unwrap();
    session.render().unwrap();

    let button = session.create_node("rwt.widgets.Button", Some(&shell), None).unwrap();
    session.set_property(&button, "text", "OK").unwrap();
    session.dispose(&button).unwrap();

    assert!(session.render().unwrap().is_empty());
}

#[test]
fn test_ancestor_destroy_covers_children() {
    let mut session = session();
    let shell = session.create_node("rwt.widgets.Shell", None, None).unwrap();
    let composite = session.create_node("rwt.widgets.Composite", Some(&shell), None).unwrap();
    let button = session.create_node("rwt.widgets.Button", Some(&composite), None).unwrap();
    session.render().unwrap();

    session.dispose(&button).unwrap();
    session.dispose(&shell).unwrap();

    let message = session.render().unwrap();
    assert_eq!(actions(&message), vec![format!("destroy {}", shell)]);
    assert!(!session.contains(&composite));
}

#[test]
fn test_variant_set_and_removed() {
    let mut session = session();
    let button = session.create_node("rwt.widgets.Button", None, None).unwrap();
    session.set_variant(&button, Some("primary")).unwrap();

    let first = session.render().unwrap();
    let Some(Operation::Create { properties, .. }) = first.find_create(button.as_str()) else {
        panic!("button not created");
    };
    assert_eq!(properties["customVariant"], PropValue::from("variant_primary"));

    session.set_property(&button, "customVariant", PropValue::Null).unwrap();
    let second = session.render().unwrap();
    assert_eq!(
        second.find_set_property(button.as_str(), "customVariant"),
        Some(&PropValue::Null)
    );
}

#[test]
fn test_aborted_cycle_keeps_snapshot() {
    let mut session = session();
    let label = session.create_node("rwt.widgets.Label", None, None).unwrap();
    session.render().unwrap();
    session.set_property(&label, "text", "one").unwrap();

    {
        let cycle = session.prepare().unwrap();
        assert_eq!(cycle.operations().len(), 1);
        cycle.abort();
    }
    assert!(session.is_dirty(&label));

    let message = session.render().unwrap();
    assert_eq!(message.find_set_property(label.as_str(), "text"), Some(&PropValue::from("one")));
    assert_eq!(message.head.request_counter, 2);
}

#[test]
fn test_sink_failure_aborts_cycle() {
    let mut session = session();
    let shell = session.create_node("rwt.widgets.Shell", None, None).unwrap();
    session.create_node("rwt.widgets.Button", Some(&shell), None).unwrap();

    let mut flaky = FlakySink { budget: 1 };
    assert!(matches!(session.render_to(&mut flaky), Err(SyncError::Sink(_))));
    assert_eq!(session.request_counter(), 0);
    assert!(session.is_dirty(&shell));

    let mut writer = MessageWriter::new();
    assert_eq!(session.render_to(&mut writer).unwrap(), 1);
    assert_eq!(writer.operations().len(), 2);
}

#[test]
fn test_calls_follow_sets_and_wait_for_commit() {
    let mut session = session();
    let text = session.create_node("rwt.widgets.Text", None, None).unwrap();
    session.call(&text, "focus", PropertyMap::new()).unwrap();

    session.prepare().unwrap().abort();
    let message = session.render().unwrap();
    assert_eq!(actions(&message), vec!["create w1", "call w1"]);
    assert!(session.render().unwrap().is_empty());
}

#[test]
fn test_virtual_tree_render_populates_requested_rows() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let mut session = session().with_provider(
        move |item: &mut Node, index: usize| -> Result<(), PopulateError> {
            counter.set(counter.get() + 1);
            item.set_text(format!("row {}", index));
            Ok(())
        },
    );
    let tree = session.create_tree(None, true).unwrap();
    session.set_item_count(&tree, 1000).unwrap();
    assert!(session.created_children(&tree).unwrap().is_empty());

    let row = session.get_item(&tree, 500).unwrap();
    assert_eq!(calls.get(), 1);
    assert!(session.node(&row).unwrap().is_cached());
    session.get_item(&tree, 500).unwrap();
    assert_eq!(calls.get(), 1);

    let message = session.render().unwrap();
    let Some(Operation::Create { properties, .. }) = message.find_create(tree.as_str()) else {
        panic!("tree not created");
    };
    assert_eq!(properties["itemCount"], PropValue::Int(1000));
    let Some(Operation::Create { properties, parent, .. }) = message.find_create(row.as_str())
    else {
        panic!("row not created");
    };
    assert_eq!(parent.as_ref(), Some(&tree));
    assert_eq!(properties["text"], PropValue::from("row 500"));
    assert_eq!(properties["index"], PropValue::Int(500));
    assert_eq!(message.operation_count(), 2);
}

#[test]
fn test_get_items_reindexes_once() {
    let mut session = session();
    let tree = session.create_tree(None, true).unwrap();
    session.set_item_count(&tree, 1000).unwrap();
    let before = session.reindex_count(&tree).unwrap();

    let rows = session.get_items(&tree).unwrap();

    assert_eq!(rows.len(), 1000);
    assert_eq!(session.reindex_count(&tree).unwrap(), before + 1);
    assert_eq!(session.flat_index(&rows[700]).unwrap(), Some(700));
}

#[test]
fn test_first_row_create_carries_zero_index() {
    let mut session = session();
    let tree = session.create_tree(None, false).unwrap();
    let row = session.create_tree_item(&tree, None).unwrap();

    let message = session.render().unwrap();
    let Some(Operation::Create { properties, .. }) = message.find_create(row.as_str()) else {
        panic!("row not created");
    };
    assert_eq!(properties["index"], PropValue::Int(0));
}

#[test]
fn test_placed_child_sends_index_and_shifts_siblings() {
    let mut session = session();
    let shell = session.create_node("rwt.widgets.Shell", None, None).unwrap();
    let first = session.create_node("rwt.widgets.Button", Some(&shell), Some(0)).unwrap();
    let appended = session.create_node("rwt.widgets.Button", Some(&shell), None).unwrap();

    let message = session.render().unwrap();
    let Some(Operation::Create { properties, .. }) = message.find_create(first.as_str()) else {
        panic!("button not created");
    };
    assert_eq!(properties["index"], PropValue::Int(0));
    let Some(Operation::Create { properties, .. }) = message.find_create(appended.as_str()) else {
        panic!("button not created");
    };
    assert!(!properties.contains_key("index"));

    let inserted = session.create_node("rwt.widgets.Button", Some(&shell), Some(0)).unwrap();
    let message = session.render().unwrap();
    assert_eq!(actions(&message), vec![format!("set {}", first), format!("create {}", inserted)]);
    assert_eq!(message.find_set_property(first.as_str(), "index"), Some(&PropValue::Int(1)));
}

#[test]
fn test_failed_populate_aborts_render_and_retries() {
    let attempts = Rc::new(Cell::new(0));
    let counter = attempts.clone();
    let mut session = session();
    let tree = session.create_tree(None, true).unwrap();
    session.set_item_count(&tree, 2).unwrap();
    let row = session.create_tree_item(&tree, Some(2)).unwrap();

    session.set_provider(move |item: &mut Node, _: usize| -> Result<(), PopulateError> {
        counter.set(counter.get() + 1);
        if counter.get() == 1 {
            return Err("backend unavailable".into());
        }
        item.set_text("late");
        Ok(())
    });

    assert!(matches!(session.render(), Err(SyncError::Populate { index: 2, .. })));
    assert!(!session.node(&row).unwrap().is_cached());

    let message = session.render().unwrap();
    assert_eq!(attempts.get(), 2);
    assert!(message.find_create(row.as_str()).is_some());
}

#[test]
fn test_expand_collapse_updates_flat_indices() {
    let mut session = session();
    let tree = session.create_tree(None, false).unwrap();
    let child0 = session.create_tree_item(&tree, None).unwrap();
    let child1 = session.create_tree_item(&tree, None).unwrap();
    let grandchild0 = session.create_tree_item(&child0, None).unwrap();
    let grandchild1 = session.create_tree_item(&child0, None).unwrap();
    session.set_property(&child0, "expanded", true).unwrap();

    let flat: Vec<Option<usize>> = [&child0, &grandchild0, &grandchild1, &child1]
        .into_iter()
        .map(|id| session.flat_index(id).unwrap())
        .collect();
    assert_eq!(flat, vec![Some(0), Some(1), Some(2), Some(3)]);
    session.render().unwrap();

    let before = session.reindex_count(&tree).unwrap();
    session.set_expanded(&child0, false).unwrap();
    assert_eq!(session.reindex_count(&tree).unwrap(), before + 1);
    assert_eq!(session.flat_index(&child1).unwrap(), Some(1));
    assert_eq!(session.flat_index(&grandchild0).unwrap(), None);

    let message = session.render().unwrap();
    assert_eq!(
        message.find_set_property(child0.as_str(), "expanded"),
        Some(&PropValue::Bool(false))
    );
}

#[test]
fn test_disposing_row_shifts_siblings_and_notifies_parent() {
    let mut session = session();
    let tree = session.create_tree(None, false).unwrap();
    session.set_item_count(&tree, 3).unwrap();
    let rows = session.created_children(&tree).unwrap();
    session.render().unwrap();

    session.dispose(&rows[0]).unwrap();
    assert_eq!(session.index_of(&tree, &rows[2]).unwrap(), 1);
    assert_eq!(session.get_item_count(&tree).unwrap(), 2);

    let message = session.render().unwrap();
    assert_eq!(
        actions(&message),
        vec![
            format!("destroy {}", rows[0]),
            format!("set {}", tree),
            format!("set {}", rows[1]),
            format!("set {}", rows[2]),
        ]
    );
    assert_eq!(message.find_set_property(tree.as_str(), "itemCount"), Some(&PropValue::Int(2)));
    assert_eq!(message.find_set_property(rows[1].as_str(), "index"), Some(&PropValue::Int(0)));
    assert_eq!(message.find_set_property(rows[2].as_str(), "index"), Some(&PropValue::Int(1)));
}

#[test]
fn test_message_serializes_to_wire_json() {
    let mut session = session();
    let shell = session.create_node("rwt.widgets.Shell", None, None).unwrap();
    session.set_property(&shell, "text", "Main").unwrap();
    let json = session.render().unwrap().to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "head": {"requestCounter": 1},
            "operations": [{
                "action": "create",
                "target": "w1",
                "type": "rwt.widgets.Shell",
                "properties": {"text": "Main"}
            }]
        })
    );
}
