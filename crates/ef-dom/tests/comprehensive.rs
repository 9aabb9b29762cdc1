//! Comprehensive tests for ef-dom
//!
//! Tree building, serialization and fragment moves against a document.

use ef_dom::{DomTree, Fragment, FragmentItem, MutationObserverInit, MutationType, NodeType};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// TREE
// ============================================================================

#[test]
fn test_document_root() {
    let dom = DomTree::new();
    assert_eq!(dom.node_type(dom.root()), Some(NodeType::Document));
    assert_eq!(dom.len(), 1);
    assert!(!dom.is_empty());
}

#[test]
fn test_build_and_serialize() {
    let mut dom = DomTree::new();
    let ul = dom.create_element("ul");
    dom.get_mut(ul).unwrap().as_element_mut().unwrap().set_attr("class", "items");
    for label in ["one", "two"] {
        let li = dom.create_element("li");
        let text = dom.create_text(label);
        dom.append_child(li, text).unwrap();
        dom.append_child(ul, li).unwrap();
    }
    dom.append_child(dom.root(), ul).unwrap();

    assert_eq!(dom.outer_html(ul), "<ul class=\"items\"><li>one</li><li>two</li></ul>");
    assert_eq!(dom.inner_html(dom.root()), dom.outer_html(ul));
    assert_eq!(dom.text_content(dom.root()), "onetwo");
}

#[test]
fn test_contains_is_inclusive() {
    let mut dom = DomTree::new();
    let a = dom.create_element("a");
    let b = dom.create_element("b");
    dom.append_child(a, b).unwrap();

    assert!(dom.contains(a, a));
    assert!(dom.contains(a, b));
    assert!(!dom.contains(b, a));
}

// ============================================================================
// FRAGMENTS
// ============================================================================

#[test]
fn test_fragment_order_any_depth() {
    init_tracing();
    let mut dom = DomTree::new();
    let host = dom.create_element("div");
    let ids: Vec<_> = (0..6).map(|i| dom.create_text(&i.to_string())).collect();

    // [0, [1, [2, 3]], 4, [[5]]]
    let deepest = Fragment::from_nodes([ids[2], ids[3]]);
    let mut middle = Fragment::from_node(ids[1]);
    middle.push_fragment(deepest);
    let mut wrapped = Fragment::new();
    wrapped.push_fragment(Fragment::from_node(ids[5]));

    let fragment: Fragment = vec![
        FragmentItem::Node(ids[0]),
        FragmentItem::Fragment(middle),
        FragmentItem::Node(ids[4]),
        FragmentItem::Fragment(wrapped),
    ]
    .into_iter()
    .collect();

    fragment.append_to(&mut dom, host).unwrap();
    assert_eq!(dom.child_ids(host), ids);
    assert_eq!(dom.text_content(host), "012345");
}

#[test]
fn test_fragment_attach_is_atomic() {
    init_tracing();
    let mut dom = DomTree::new();
    let host = dom.create_element("section");
    dom.append_child(dom.root(), host).unwrap();

    let a = dom.create_element("h1");
    let b = dom.create_text("body");
    let c = dom.create_comment("end");
    let mut fragment = Fragment::from_node(a);
    fragment.push_fragment(Fragment::from_nodes([b, c]));

    let observer = dom.observe(dom.root(), MutationObserverInit {
        child_list: true,
        subtree: true,
        ..Default::default()
    });
    fragment.append_to(&mut dom, host).unwrap();

    let records: Vec<_> = dom
        .take_records(observer)
        .into_iter()
        .filter(|r| r.target == host)
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].mutation_type, MutationType::ChildList);
    assert_eq!(records[0].added_nodes, vec![a, b, c]);
}

#[test]
fn test_fragment_moves_nodes_between_parents() {
    let mut dom = DomTree::new();
    let left = dom.create_element("div");
    let right = dom.create_element("div");
    let a = dom.create_text("a");
    let b = dom.create_text("b");
    dom.append_child(left, a).unwrap();
    dom.append_child(left, b).unwrap();

    Fragment::from_nodes([b, a]).append_to(&mut dom, right).unwrap();
    assert!(dom.child_ids(left).is_empty());
    assert_eq!(dom.child_ids(right), vec![b, a]);
}

#[test]
fn test_insert_after_middle_child() {
    let mut dom = DomTree::new();
    let parent = dom.create_element("ol");
    let first = dom.create_element("li");
    let last = dom.create_element("li");
    dom.append_child(parent, first).unwrap();
    dom.append_child(parent, last).unwrap();
    let extra = dom.create_element("li");

    Fragment::from_node(extra).insert_after_to(&mut dom, first).unwrap();
    assert_eq!(dom.child_ids(parent), vec![first, extra, last]);
}

#[test]
fn test_remove_then_reinsert() {
    let mut dom = DomTree::new();
    let host = dom.create_element("div");
    let a = dom.create_text("a");
    let b = dom.create_text("b");

    let mut fragment = Fragment::from_nodes([a, b]);
    fragment.append_to(&mut dom, host).unwrap();
    fragment.remove(&mut dom).unwrap();
    assert!(fragment.is_empty());
    assert_eq!(dom.text_content(host), "");

    // Detached nodes stay alive and can be inserted again
    Fragment::from_nodes([b, a]).append_to(&mut dom, host).unwrap();
    assert_eq!(dom.text_content(host), "ba");
}
