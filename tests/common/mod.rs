#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use blt_graph::painter::{BitmapStyle, TextStyle};
use blt_graph::pen::Paint;
use blt_graph::{
    Bitmap, Event, EventKind, Graph, GraphOptions, ItemId, LegendOptions, Margins, Painter,
    Point2d, Region2d, Segment2d,
};

/// A 200x200 graph with no margins or legend and both axes fixed to [0, 20],
/// so one data unit is ten pixels.
pub fn graph() -> Graph {
    let mut graph = Graph::new(GraphOptions {
        width: 200.0,
        height: 200.0,
        margins: Margins::ZERO,
        legend: LegendOptions {
            hide: true,
            ..LegendOptions::default()
        },
        ..GraphOptions::default()
    });
    for axis in ["x", "y"] {
        graph
            .configure_axis(axis, |o| {
                o.min = Some(0.0);
                o.max = Some(20.0);
            })
            .unwrap();
    }
    graph
}

pub fn square(x: f64, y: f64, size: f64) -> Vec<Point2d> {
    vec![
        Point2d::new(x, y),
        Point2d::new(x + size, y),
        Point2d::new(x + size, y + size),
        Point2d::new(x, y + size),
    ]
}

/// Events seen by bound scripts, in dispatch order.
pub type EventLog = Rc<RefCell<Vec<(EventKind, ItemId)>>>;

/// Record every event matching `patterns` on the `all` tag.
pub fn record(graph: &mut Graph, patterns: &[&str]) -> EventLog {
    let log = EventLog::default();
    for pattern in patterns {
        let log = log.clone();
        graph
            .bind("all", pattern, move |ev, _| {
                log.borrow_mut().push((ev.event.kind, ev.item));
            })
            .unwrap();
    }
    log
}

pub fn motion(x: f64, y: f64, state: blt_graph::ModifierState) -> Event {
    Event::motion(x, y).with_state(state)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Segments(Vec<Segment2d>),
    Polygon(Vec<Point2d>),
    Text(String),
    Bitmap(Region2d),
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub ops: Vec<Op>,
}

impl Painter for Recorder {
    fn draw_segments(&mut self, segments: &[Segment2d], _paint: &Paint) {
        self.ops.push(Op::Segments(segments.to_vec()));
    }

    fn draw_polygon(&mut self, points: &[Point2d], _paint: &Paint) {
        self.ops.push(Op::Polygon(points.to_vec()));
    }

    fn draw_text(&mut self, text: &str, _center: Point2d, _style: &TextStyle) {
        self.ops.push(Op::Text(text.to_string()));
    }

    fn draw_bitmap(&mut self, _bitmap: &Bitmap, dest: &Region2d, _style: &BitmapStyle) {
        self.ops.push(Op::Bitmap(*dest));
    }
}
