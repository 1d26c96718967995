mod common;

use std::cell::RefCell;
use std::rc::Rc;

use blt_graph::marker::MarkerGeometry;
use blt_graph::{GraphError, MarkerKind, Point2d, Region2d, WindowHost};
use common::{Recorder, graph, square};

#[test]
fn line_marker_lifecycle() {
    let mut g = graph();
    g.create_marker(MarkerKind::Line, Some("diag"), |o| {
        o.coords = vec![Point2d::new(0.0, 0.0), Point2d::new(10.0, 10.0)];
    })
    .unwrap();
    g.update();

    let m = g.marker("diag").unwrap();
    let MarkerGeometry::Line(line) = m.geometry() else {
        panic!("expected line geometry, got {:?}", m.geometry());
    };
    assert_eq!(
        line.points,
        vec![Point2d::new(0.0, 200.0), Point2d::new(100.0, 100.0)]
    );
    assert_eq!(line.segments.len(), 1);
    assert!(!m.is_clipped());
    assert!(m.is_drawable());

    for axis in ["x", "y"] {
        g.configure_axis(axis, |o| {
            o.min = Some(100.0);
            o.max = Some(200.0);
        })
        .unwrap();
    }
    g.update();

    let m = g.marker("diag").unwrap();
    assert!(m.is_clipped());
    assert!(!m.is_drawable());
    match m.geometry() {
        MarkerGeometry::Line(line) => assert!(line.segments.is_empty()),
        other => panic!("expected line geometry, got {other:?}"),
    }
}

#[test]
fn remapping_without_changes_is_idempotent() {
    let mut g = graph();
    g.create_marker(MarkerKind::Polygon, Some("poly"), |o| {
        o.coords = vec![
            Point2d::new(-5.0, 2.0),
            Point2d::new(12.0, 25.0),
            Point2d::new(18.0, 4.0),
        ];
    })
    .unwrap();
    g.create_marker(MarkerKind::Text, Some("label"), |o| {
        o.coords = vec![Point2d::new(3.0, 3.0)];
        if let Some(t) = o.text_mut() {
            t.text = "rotated".to_string();
            t.angle = 30.0;
        }
    })
    .unwrap();
    g.update();
    let snapshot = |g: &blt_graph::Graph| {
        g.marker_names()
            .into_iter()
            .map(|n| {
                let m = g.marker(n).unwrap();
                (m.geometry().clone(), m.bbox(), m.is_clipped())
            })
            .collect::<Vec<_>>()
    };
    let first = snapshot(&g);

    // Forces a full layout and remap with the same axes.
    g.configure_axis("x", |_| {}).unwrap();
    g.update();
    assert!(!g.marker("poly").unwrap().needs_remap());
    assert_eq!(snapshot(&g), first);
}

#[test]
fn configure_errors_leave_the_marker_unchanged() {
    let mut g = graph();
    g.create_marker(MarkerKind::Polygon, Some("p"), |o| o.coords = square(1.0, 1.0, 2.0))
        .unwrap();
    g.update();
    let before = g.marker("p").unwrap().geometry().clone();

    let err = g
        .configure_marker("p", |o| {
            o.coords = square(5.0, 5.0, 2.0);
            o.x_offset = f64::NAN;
        })
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidValue { option: "xoffset", .. }));
    g.update();
    assert_eq!(g.marker("p").unwrap().geometry(), &before);
    assert_eq!(g.marker("p").unwrap().options().coords, square(1.0, 1.0, 2.0));

    let err = g
        .configure_marker("p", |o| o.attrs = blt_graph::marker::MarkerAttrs::defaults(MarkerKind::Text))
        .unwrap_err();
    assert!(matches!(err, GraphError::KindMismatch { .. }));
    assert_eq!(
        g.configure_marker("missing", |_| {}),
        Err(GraphError::UnknownMarker("missing".to_string()))
    );
}

#[test]
fn region_queries_report_topmost_first() {
    let mut g = graph();
    g.create_marker(MarkerKind::Polygon, Some("small"), |o| o.coords = square(1.0, 1.0, 2.0))
        .unwrap();
    g.create_marker(MarkerKind::Polygon, Some("big"), |o| o.coords = square(0.0, 0.0, 10.0))
        .unwrap();

    // Screen square around data [0, 4] x [0, 4].
    let region = Region2d::new(0.0, 160.0, 40.0, 200.0);
    assert_eq!(g.find_markers(&region, true), vec!["small".to_string()]);
    assert_eq!(
        g.find_markers(&region, false),
        vec!["big".to_string(), "small".to_string()]
    );

    g.raise_marker("small", None).unwrap();
    assert_eq!(
        g.find_markers(&region, false),
        vec!["small".to_string(), "big".to_string()]
    );
}

#[derive(Default)]
struct Host {
    log: Rc<RefCell<Vec<String>>>,
}

impl WindowHost for Host {
    fn claim(&mut self, window: &str) -> Result<(f64, f64), GraphError> {
        if window == "busy" {
            return Err(GraphError::WindowInUse(window.to_string()));
        }
        self.log.borrow_mut().push(format!("claim {window}"));
        Ok((40.0, 20.0))
    }

    fn release(&mut self, window: &str) {
        self.log.borrow_mut().push(format!("release {window}"));
    }

    fn place(&mut self, window: &str, region: Region2d) {
        self.log.borrow_mut().push(format!(
            "place {window} {} {} {} {}",
            region.left, region.top, region.right, region.bottom
        ));
    }

    fn unmap(&mut self, window: &str) {
        self.log.borrow_mut().push(format!("unmap {window}"));
    }
}

#[test]
fn window_markers_drive_the_host() {
    let mut g = graph();
    let host = Host::default();
    let log = host.log.clone();
    g.set_window_host(Box::new(host));

    g.create_marker(MarkerKind::Window, Some("w"), |o| {
        o.coords = vec![Point2d::new(10.0, 10.0)];
        o.anchor = blt_graph::Anchor::NorthWest;
        if let Some(w) = o.window_mut() {
            w.window = Some("child".to_string());
        }
    })
    .unwrap();
    g.draw(&mut Recorder::default());
    assert_eq!(
        *log.borrow(),
        vec!["claim child".to_string(), "place child 100 100 140 120".to_string()]
    );

    let err = g
        .configure_marker("w", |o| {
            if let Some(w) = o.window_mut() {
                w.window = Some("busy".to_string());
            }
        })
        .unwrap_err();
    assert_eq!(err, GraphError::WindowInUse("busy".to_string()));

    g.configure_marker("w", |o| o.hide = true).unwrap();
    g.draw(&mut Recorder::default());
    g.delete_marker("w").unwrap();
    assert_eq!(
        log.borrow()[2..],
        ["unmap child".to_string(), "release child".to_string()]
    );
}
