//! Core of a 2D graph widget: axes, data elements, annotation markers and a
//! pick/bind table that turns pointer and key input into per-object events.
//!
//! - Markers (line, polygon, text, bitmap, window) positioned in data space
//! - Line and bar elements with per-point style pens
//! - Clipping, hit testing and region queries in screen space
//! - Enter/Leave/press/release/key bindings with implicit pointer grabs
//! - Rendering through a [`Painter`], to PostScript, or onto an `iced` canvas
//!   with the `canvas` feature
//!
//! Quick start:
//!
//! ```no_run
//! use blt_graph::{Command, ElementKind, GraphBuilder, ItemId, MarkerKind};
//!
//! let mut graph = GraphBuilder::new()
//!     .with_size(400.0, 300.0)
//!     .with_x_label("x")
//!     .build()
//!     .unwrap();
//! graph
//!     .create_element(ElementKind::Line, "data", |o| {
//!         o.set_points(&[(0.0, 1.0), (1.0, 3.0), (2.0, 2.0)])
//!     })
//!     .unwrap();
//! graph
//!     .bind("data", "<Enter>", |ev, cmds| {
//!         cmds.push(Command::Activate(ev.item, None))
//!     })
//!     .unwrap();
//! let eps = graph.postscript();
//! ```
pub mod axis;
pub mod bind;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod graph;
pub mod graph_builder;
pub mod legend;
pub mod marker;
pub mod painter;
pub mod pen;
pub mod postscript;
pub mod style;
pub mod transform;

#[cfg(feature = "canvas")]
pub(crate) mod canvas;
pub(crate) mod id;

// Iced re-exports.
pub use iced::Color;

// Re-exports of public types.
pub use axis::{Axis, Axis2d, AxisOptions, AxisScale, AxisSide, Tick, TickFormatter};
pub use bind::{BindEvent, EventPattern, Picker};
pub use element::{Element, ElementKind, ElementOptions, Nearest};
pub use error::GraphError;
pub use event::{Event, EventKind, ModifierState, Translator};
pub use geometry::{Anchor, Point2d, Region2d, Segment2d};
pub use graph::{Command, Commands, Graph, GraphOptions, Margins};
pub use graph_builder::GraphBuilder;
pub use id::{ItemId, ShapeId};
pub use legend::{LegendOptions, LegendPosition};
pub use marker::{Marker, MarkerKind, MarkerOptions, MarkerState, WindowHost};
pub use painter::{Bitmap, Font, Painter, TextMeasurer};
pub use pen::{Dashes, Pen, PenOptions, Symbol};
pub use postscript::PsWriter;
pub use style::{PenStyle, WeightRange};
