mod common;

use blt_graph::{
    Color, ElementKind, GraphBuilder, LegendOptions, Margins, PenStyle, Point2d, Region2d,
};
use common::graph;

#[test]
fn later_style_wins_where_weight_ranges_overlap() {
    let mut g = graph();
    g.create_pen("low", |p| p.color = Color::from_rgb(0.0, 0.0, 1.0)).unwrap();
    g.create_pen("high", |p| p.color = Color::from_rgb(1.0, 0.0, 0.0)).unwrap();
    g.create_element(ElementKind::Line, "e", |o| {
        o.set_points(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        o.weights = Some(vec![7.0, 12.0, 2.0, 20.0]);
        o.styles = vec![
            PenStyle::new("low").with_range(0.0, 10.0).unwrap(),
            PenStyle::new("high").with_range(5.0, 15.0).unwrap(),
        ];
    })
    .unwrap();
    g.update();

    let slots: Vec<usize> = g
        .element("e")
        .unwrap()
        .geometry()
        .points
        .iter()
        .map(|p| p.slot)
        .collect();
    // Slot 0 is the element's own pen, slot k + 1 is style k.
    assert_eq!(slots, vec![2, 2, 1, 0]);

    let err = g
        .configure_element("e", |o| o.styles.push(PenStyle::new("nope")))
        .unwrap_err();
    assert_eq!(err, blt_graph::GraphError::UnknownPen("nope".to_string()));
    assert_eq!(g.element("e").unwrap().options().styles.len(), 2);
}

#[test]
fn non_finite_values_break_the_trace() {
    let mut g = graph();
    g.create_element(ElementKind::Line, "gappy", |o| {
        o.set_points(&[(1.0, 1.0), (2.0, f64::NAN), (3.0, 3.0), (4.0, 4.0)]);
    })
    .unwrap();
    g.update();
    let geometry = g.element("gappy").unwrap().geometry();
    assert_eq!(geometry.points.len(), 3);
    assert_eq!(geometry.traces.len(), 1);
}

#[test]
fn closest_point_and_interpolation() {
    let mut g = graph();
    g.create_element(ElementKind::Line, "e", |o| {
        o.set_points(&[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)]);
    })
    .unwrap();

    let (name, nearest) = g.closest(103.0, 100.0, false).unwrap();
    assert_eq!(name, "e");
    assert_eq!(nearest.index, 1);
    assert_eq!(nearest.point, Point2d::new(10.0, 10.0));

    // Halfway along the first piece: far from any point, on the trace.
    assert!(g.closest(50.0, 150.0, false).is_none());
    let (_, nearest) = g.closest(50.0, 150.0, true).unwrap();
    assert_eq!(nearest.index, 0);
    assert!((nearest.point - Point2d::new(5.0, 5.0)).length() < 1e-9);
}

#[test]
fn bars_grow_sideways_when_inverted() {
    let mut g = GraphBuilder::new()
        .with_size(200.0, 200.0)
        .with_margins(Margins::ZERO)
        .with_legend(LegendOptions {
            hide: true,
            ..LegendOptions::default()
        })
        .with_inverted(true)
        .with_x_lim(0.0, 10.0)
        .with_y_lim(0.0, 20.0)
        .build()
        .unwrap();
    g.create_element(ElementKind::Bar, "bars", |o| {
        o.set_points(&[(5.0, 10.0)]);
    })
    .unwrap();
    g.update();

    let bars = &g.element("bars").unwrap().geometry().bars;
    assert_eq!(bars.len(), 1);
    let rect = bars[0].rect;
    // The value runs along the horizontal y axis from the baseline at 0.
    assert!((rect.left - 0.0).abs() < 1e-9);
    assert!((rect.right - 100.0).abs() < 1e-9);
    // Bar width 0.9 of 20 px per x unit.
    assert!((rect.height() - 18.0).abs() < 1e-9);
    assert!((rect.center().y - 100.0).abs() < 1e-9);

    assert_eq!(
        g.find_elements(&Region2d::new(40.0, 95.0, 60.0, 105.0), false),
        vec!["bars".to_string()]
    );
    assert!(g.find_elements(&Region2d::new(40.0, 95.0, 60.0, 105.0), true).is_empty());
}

#[test]
fn bar_extents_include_the_baseline() {
    let mut g = GraphBuilder::new()
        .with_margins(Margins::ZERO)
        .build()
        .unwrap();
    g.create_element(ElementKind::Bar, "bars", |o| {
        o.set_points(&[(1.0, 4.0), (2.0, 6.0)]);
        if let blt_graph::element::ElementAttrs::Bar(bar) = &mut o.attrs {
            bar.bar_width = 1.0;
        }
    })
    .unwrap();
    g.update();
    assert_eq!(g.axis("x").unwrap().limits(), (0.5, 2.5));
    assert_eq!(g.axis("y").unwrap().limits(), (0.0, 6.0));
}

#[test]
fn deleting_an_element_removes_its_legend_entry() {
    let mut g = GraphBuilder::new().with_size(300.0, 200.0).build().unwrap();
    g.create_element(ElementKind::Line, "a", |_| {}).unwrap();
    g.create_element(ElementKind::Line, "b", |o| o.label = Some("Bee".to_string()))
        .unwrap();
    let wide = {
        g.update();
        g.legend().size()
    };
    g.delete_element("a").unwrap();
    g.update();
    let narrow = g.legend().size();
    assert!(narrow.1 < wide.1);
    assert_eq!(g.element_names(), vec!["b"]);
    assert!(g.delete_element("a").is_err());
}
