mod common;

use blt_graph::{
    Command, ElementKind, Event, EventKind, ItemId, MarkerKind, ModifierState, Point2d,
};
use common::{graph, motion, record, square};

const NONE: ModifierState = ModifierState::NONE;
const B1: ModifierState = ModifierState::BUTTON1;

/// Screen centers of the two test squares.
const OVER_A: (f64, f64) = (30.0, 170.0);
const OVER_B: (f64, f64) = (170.0, 30.0);
const EMPTY: (f64, f64) = (100.0, 100.0);

fn two_markers() -> (blt_graph::Graph, ItemId, ItemId) {
    let mut g = graph();
    g.create_marker(MarkerKind::Polygon, Some("A"), |o| o.coords = square(1.0, 1.0, 4.0))
        .unwrap();
    g.create_marker(MarkerKind::Polygon, Some("B"), |o| o.coords = square(15.0, 15.0, 4.0))
        .unwrap();
    let a = ItemId::Marker(g.marker_id("A").unwrap());
    let b = ItemId::Marker(g.marker_id("B").unwrap());
    (g, a, b)
}

#[test]
fn held_button_defers_crossings_until_release() {
    let (mut g, a, b) = two_markers();
    let log = record(&mut g, &["<Enter>", "<Leave>"]);

    g.handle_event(&motion(OVER_A.0, OVER_A.1, NONE));
    assert_eq!(*log.borrow(), vec![(EventKind::Enter, a)]);

    g.handle_event(&Event::button_press(1, OVER_A.0, OVER_A.1));
    g.handle_event(&motion(EMPTY.0, EMPTY.1, B1));
    g.handle_event(&motion(OVER_B.0, OVER_B.1, B1));
    assert_eq!(log.borrow().len(), 1, "no crossings while grabbed");
    assert_eq!(g.current_item(), Some(a));

    g.handle_event(&Event::button_release(1, OVER_B.0, OVER_B.1).with_state(B1));
    assert_eq!(
        log.borrow()[1..],
        [(EventKind::Leave, a), (EventKind::Enter, b)]
    );
    assert_eq!(g.current_item(), Some(b));
}

#[test]
fn returning_to_the_grabbed_marker_enters_it_again() {
    let (mut g, a, _) = two_markers();
    let log = record(&mut g, &["<Enter>", "<Leave>"]);

    g.handle_event(&motion(OVER_A.0, OVER_A.1, NONE));
    g.handle_event(&Event::button_press(1, OVER_A.0, OVER_A.1));
    g.handle_event(&motion(EMPTY.0, EMPTY.1, B1));
    g.handle_event(&motion(OVER_B.0, OVER_B.1, B1));
    g.handle_event(&motion(OVER_A.0 + 5.0, OVER_A.1, B1));
    assert_eq!(
        *log.borrow(),
        vec![(EventKind::Enter, a), (EventKind::Enter, a)]
    );

    g.handle_event(&Event::button_release(1, OVER_A.0 + 5.0, OVER_A.1).with_state(B1));
    assert_eq!(log.borrow().len(), 2, "release over the current marker is quiet");
    assert_eq!(g.current_item(), Some(a));
}

#[test]
fn key_press_keeps_the_pointer_item_current() {
    let (mut g, a, _) = two_markers();
    let log = record(&mut g, &["<Enter>", "<Leave>"]);

    g.handle_event(&motion(OVER_A.0, OVER_A.1, NONE));
    g.handle_event(&Event::key_press("a"));
    g.handle_event(&Event::key_release("a"));

    assert_eq!(*log.borrow(), vec![(EventKind::Enter, a)]);
    assert_eq!(g.current_item(), Some(a));
}

#[test]
fn grabbed_marker_receives_motion_and_release() {
    let (mut g, a, _) = two_markers();
    let log = record(&mut g, &["<B1-Motion>", "<ButtonRelease-1>"]);

    g.handle_event(&motion(OVER_A.0, OVER_A.1, NONE));
    g.handle_event(&Event::button_press(1, OVER_A.0, OVER_A.1));
    g.handle_event(&motion(EMPTY.0, EMPTY.1, B1));
    g.handle_event(&Event::button_release(1, EMPTY.0, EMPTY.1).with_state(B1));

    assert_eq!(
        *log.borrow(),
        vec![(EventKind::Motion, a), (EventKind::ButtonRelease, a)]
    );
    assert_eq!(g.current_item(), None);
}

#[test]
fn deleting_the_current_marker_drops_every_reference() {
    let (mut g, a, _) = two_markers();
    g.bind("A", "<ButtonPress-1>", |ev, cmds| cmds.push(Command::Delete(ev.item)))
        .unwrap();
    let log = record(&mut g, &["<Enter>", "<Leave>", "<Motion>", "<ButtonRelease>"]);

    g.handle_event(&motion(OVER_A.0, OVER_A.1, NONE));
    g.focus(Some(a));
    g.handle_event(&Event::button_press(1, OVER_A.0, OVER_A.1));
    assert!(!g.marker_exists("A"));
    assert_eq!(g.current_item(), None);
    assert_eq!(g.focus_item(), None);
    let before = log.borrow().len();

    g.handle_event(&motion(OVER_A.0 + 2.0, OVER_A.1, B1));
    g.handle_event(&Event::button_release(1, OVER_A.0, OVER_A.1).with_state(B1));
    g.handle_event(&Event::key_press("x"));
    assert_eq!(log.borrow().len(), before);

    // A new object in the same place gets the events; the old handle never does.
    g.create_marker(MarkerKind::Polygon, Some("C"), |o| o.coords = square(1.0, 1.0, 4.0))
        .unwrap();
    let c = ItemId::Marker(g.marker_id("C").unwrap());
    g.handle_event(&motion(OVER_A.0, OVER_A.1, NONE));
    let log = log.borrow();
    assert_eq!(log[before..], [(EventKind::Enter, c), (EventKind::Motion, c)]);
    assert!(log[before..].iter().all(|(_, item)| *item != a));
}

#[test]
fn hiding_the_current_marker_from_a_script_leaves_it() {
    let (mut g, a, _) = two_markers();
    g.bind("A", "<Enter>", |ev, cmds| cmds.push(Command::SetHidden(ev.item, true)))
        .unwrap();
    let log = record(&mut g, &["<Enter>", "<Leave>"]);

    g.handle_event(&motion(OVER_A.0, OVER_A.1, NONE));
    assert_eq!(
        *log.borrow(),
        vec![(EventKind::Enter, a), (EventKind::Leave, a)]
    );
    assert_eq!(g.current_item(), None);
    assert!(g.marker("A").unwrap().options().hide);
}

#[test]
fn key_events_go_to_the_focus_item() {
    let mut g = graph();
    g.create_marker(MarkerKind::Text, Some("label"), |o| {
        o.coords = vec![Point2d::new(10.0, 10.0)];
        if let Some(t) = o.text_mut() {
            t.text = "hello".to_string();
        }
    })
    .unwrap();
    let label = ItemId::Marker(g.marker_id("label").unwrap());
    let log = record(&mut g, &["<KeyPress-a>"]);

    g.handle_event(&Event::key_press("a"));
    assert!(log.borrow().is_empty());

    g.focus(Some(label));
    g.handle_event(&Event::key_press("a"));
    g.handle_event(&Event::key_press("b"));
    assert_eq!(*log.borrow(), vec![(EventKind::KeyPress, label)]);
}

#[test]
fn picking_order_is_markers_then_elements_then_underlays() {
    let mut g = graph();
    g.create_element(ElementKind::Line, "diag", |o| {
        o.set_points(&[(0.0, 0.0), (20.0, 20.0)])
    })
    .unwrap();
    g.create_marker(MarkerKind::Polygon, Some("under"), |o| {
        o.coords = square(8.0, 8.0, 4.0);
        o.draw_under = true;
    })
    .unwrap();
    let element = ItemId::Element(g.element_id("diag").unwrap());
    let under = ItemId::Marker(g.marker_id("under").unwrap());

    g.handle_event(&motion(100.0, 100.0, NONE));
    assert_eq!(g.current_item(), Some(element));
    g.handle_event(&motion(85.0, 85.0, NONE));
    assert_eq!(g.current_item(), Some(under));

    g.create_marker(MarkerKind::Polygon, Some("over"), |o| o.coords = square(8.0, 8.0, 4.0))
        .unwrap();
    let over = ItemId::Marker(g.marker_id("over").unwrap());
    g.repick();
    assert_eq!(g.current_item(), Some(over));
    g.handle_event(&motion(100.0, 100.0, NONE));
    assert_eq!(g.current_item(), Some(over));
}

#[test]
fn activation_commands_reach_elements() {
    let mut g = graph();
    g.create_element(ElementKind::Line, "diag", |o| {
        o.set_points(&[(0.0, 0.0), (10.0, 10.0), (20.0, 20.0)])
    })
    .unwrap();
    g.bind("diag", "<Enter>", |ev, cmds| {
        cmds.push(Command::Activate(ev.item, Some(vec![1])))
    })
    .unwrap();
    g.bind("diag", "<Leave>", |ev, cmds| cmds.push(Command::Deactivate(ev.item)))
        .unwrap();

    g.handle_event(&motion(100.0, 100.0, NONE));
    assert_eq!(
        *g.element("diag").unwrap().activation(),
        blt_graph::element::Activation::Points(vec![1])
    );
    g.handle_event(&Event::leave(100.0, 100.0));
    assert_eq!(
        *g.element("diag").unwrap().activation(),
        blt_graph::element::Activation::None
    );
}
