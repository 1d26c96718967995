//! The graph: owns axes, pens, markers, elements and the legend, lays them
//! out, routes input through the bind table and renders to a [`Painter`] or
//! PostScript.
//!
//! Objects are kept in insertion-ordered maps keyed by [`ShapeId`]; the map
//! order is the display list (first drawn first, picked last). Names resolve
//! through a separate name table so renaming never changes identity.
//!
//! Changes are applied as transactions: a configure closure edits a copy of
//! the options in place, the result is validated, and on error the previous
//! options are restored. Layout and screen geometry are recomputed lazily the
//! next time the graph is drawn, picked or queried.
use std::collections::HashMap;

use indexmap::IndexMap;

use crate::Color;
use crate::axis::{Axis, Axis2d, AxisOptions, AxisSide};
use crate::bind::{BindEvent, BindTable, Picker};
use crate::element::{Activation, Element, ElementKind, ElementOptions, Nearest};
use crate::error::GraphError;
use crate::event::Event;
use crate::geometry::{Anchor, Point2d, Region2d, Segment2d, anchor_point};
use crate::id::{ItemId, ShapeId};
use crate::legend::{Legend, LegendOptions, LegendPosition};
use crate::marker::{
    MapEnv, Marker, MarkerAttrs, MarkerKind, MarkerOptions, MarkerState, WindowHost,
};
use crate::painter::{Font, Painter, TextMeasurer, TextStyle, default_measure};
use crate::pen::{Dashes, Paint, Pen, PenOptions};
use crate::postscript::PsWriter;
use crate::transform::{MapContext, hmap, vmap};

/// How many times queued commands may trigger another repick before the
/// remainder is dropped.
const MAX_COMMAND_ROUNDS: usize = 8;

/// Length of axis tick marks, in pixels.
const TICK_LENGTH: f64 = 6.0;

/// Space between the widget edge and the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Margins {
    pub const ZERO: Margins = Margins {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 60.0,
            top: 20.0,
            right: 20.0,
            bottom: 40.0,
        }
    }
}

/// Widget-level options.
#[derive(Clone)]
pub struct GraphOptions {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    /// Swap the roles of the x and y axes.
    pub inverted: bool,
    /// Pick distance in pixels for lines and data points.
    pub halo: f64,
    pub background: Color,
    /// Fill for the plot area, if different from the background.
    pub plot_background: Option<Color>,
    pub foreground: Color,
    pub title: Option<String>,
    pub font: Font,
    pub measure: TextMeasurer,
    pub legend: LegendOptions,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 300.0,
            margins: Margins::default(),
            inverted: false,
            halo: 8.0,
            background: Color::WHITE,
            plot_background: None,
            foreground: Color::BLACK,
            title: None,
            font: Font::default(),
            measure: std::sync::Arc::new(default_measure),
            legend: LegendOptions::default(),
        }
    }
}

impl std::fmt::Debug for GraphOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphOptions")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("margins", &self.margins)
            .field("inverted", &self.inverted)
            .field("halo", &self.halo)
            .field("title", &self.title)
            .field("legend", &self.legend)
            .finish_non_exhaustive()
    }
}

impl GraphOptions {
    pub(crate) fn validate(&self) -> Result<(), GraphError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(GraphError::invalid("width", self.width));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(GraphError::invalid("height", self.height));
        }
        if self.halo.is_nan() || self.halo < 0.0 {
            return Err(GraphError::invalid("halo", self.halo));
        }
        let m = self.margins;
        if [m.left, m.top, m.right, m.bottom]
            .iter()
            .any(|v| v.is_nan() || *v < 0.0)
        {
            return Err(GraphError::invalid(
                "plotpad",
                format!("{} {} {} {}", m.left, m.top, m.right, m.bottom),
            ));
        }
        self.legend.validate()
    }
}

/// A change requested by a binding script, applied after dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Delete(ItemId),
    SetHidden(ItemId, bool),
    Raise(ItemId),
    Lower(ItemId),
    /// Activate an element; `None` activates every point.
    Activate(ItemId, Option<Vec<usize>>),
    Deactivate(ItemId),
    SetMarkerState(ItemId, MarkerState),
    /// Replace a marker's data coordinates.
    MoveMarker(ItemId, Vec<Point2d>),
    Focus(Option<ItemId>),
    /// Recompute the current item without waiting for pointer motion.
    Repick,
}

/// Commands queued by scripts during one dispatch.
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn push(&mut self, command: Command) {
        self.queue.push(command);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.queue.iter()
    }
}

/// Read-only view of the pickable objects, handed to the bind table.
struct Scene<'a> {
    markers: &'a IndexMap<ShapeId, Marker>,
    elements: &'a IndexMap<ShapeId, Element>,
    element_names: &'a HashMap<String, ShapeId>,
    ctx: MapContext<'a>,
    halo: f64,
}

impl Scene<'_> {
    fn pick_marker(&self, p: Point2d, under: bool) -> Option<ItemId> {
        self.markers
            .values()
            .rev()
            .filter(|m| m.options.draw_under == under)
            .find(|m| {
                marker_shown(m, self.elements, self.element_names) && m.point_in(p, self.halo)
            })
            .map(|m| ItemId::Marker(m.id))
    }

    fn pick_element(&self, p: Point2d) -> Option<ItemId> {
        // `min_by` keeps the first of equals, so ties go to the topmost.
        self.elements
            .values()
            .rev()
            .filter_map(|e| {
                let interpolate = e.kind() == ElementKind::Line;
                e.closest(p, self.halo, interpolate, &self.ctx)
                    .map(|n| (e.id, n.distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| ItemId::Element(id))
    }
}

impl Picker<ItemId> for Scene<'_> {
    fn pick(&self, x: f64, y: f64) -> Option<ItemId> {
        let p = Point2d::new(x, y);
        self.pick_marker(p, false)
            .or_else(|| self.pick_element(p))
            .or_else(|| self.pick_marker(p, true))
    }

    fn tags(&self, item: &ItemId) -> Vec<String> {
        match item {
            ItemId::Marker(id) => self.markers.get(id).map(Marker::tags),
            ItemId::Element(id) => self.elements.get(id).map(Element::tags),
        }
        .unwrap_or_default()
    }
}

/// A marker tied to an element is shown only while that element exists and
/// is visible.
fn marker_shown(
    marker: &Marker,
    elements: &IndexMap<ShapeId, Element>,
    element_names: &HashMap<String, ShapeId>,
) -> bool {
    if marker.options.hide {
        return false;
    }
    match &marker.options.element {
        None => true,
        Some(name) => element_names
            .get(name)
            .and_then(|id| elements.get(id))
            .is_some_and(|e| !e.options.hide),
    }
}

fn report(applied: bool, command: &Command, repick: bool) -> bool {
    if !applied {
        log::warn!("ignoring {command:?}: no such object");
    }
    applied && repick
}

fn merge_extents(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<(f64, f64)> {
    match (a, b) {
        (Some((a0, a1)), Some((b0, b1))) => Some((a0.min(b0), a1.max(b1))),
        (a, b) => a.or(b),
    }
}

/// Point of `rect` that a box with the given anchor is attached to.
fn anchor_reference(rect: &Region2d, anchor: Anchor) -> Point2d {
    let x = match anchor {
        Anchor::NorthWest | Anchor::West | Anchor::SouthWest => rect.left,
        Anchor::North | Anchor::Center | Anchor::South => rect.center().x,
        Anchor::NorthEast | Anchor::East | Anchor::SouthEast => rect.right,
    };
    let y = match anchor {
        Anchor::NorthWest | Anchor::North | Anchor::NorthEast => rect.top,
        Anchor::West | Anchor::Center | Anchor::East => rect.center().y,
        Anchor::SouthWest | Anchor::South | Anchor::SouthEast => rect.bottom,
    };
    Point2d::new(x, y)
}

fn check_axes(axes: &IndexMap<String, Axis>, pair: &Axis2d) -> Result<(), GraphError> {
    for name in [&pair.x, &pair.y] {
        if !axes.contains_key(name) {
            return Err(GraphError::UnknownAxis(name.clone()));
        }
    }
    Ok(())
}

fn window_name(options: &MarkerOptions) -> Option<&str> {
    match &options.attrs {
        MarkerAttrs::Window(w) => w.window.as_deref(),
        _ => None,
    }
}

/// A 2D graph widget core.
pub struct Graph {
    options: GraphOptions,
    axes: IndexMap<String, Axis>,
    pens: IndexMap<String, Pen>,
    markers: IndexMap<ShapeId, Marker>,
    marker_names: HashMap<String, ShapeId>,
    elements: IndexMap<ShapeId, Element>,
    element_names: HashMap<String, ShapeId>,
    legend: Legend,
    binds: BindTable<ItemId, Commands>,
    windows: Option<Box<dyn WindowHost>>,
    plot: Region2d,
    layout_dirty: bool,
    redraw_pending: bool,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(GraphOptions::default())
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("options", &self.options)
            .field("axes", &self.axes.keys().collect::<Vec<_>>())
            .field("markers", &self.markers.len())
            .field("elements", &self.elements.len())
            .field("plot", &self.plot)
            .finish_non_exhaustive()
    }
}

impl Graph {
    /// Create a graph with the standard axes: `x` (bottom), `y` (left) and
    /// the hidden `x2` (top) and `y2` (right).
    pub fn new(options: GraphOptions) -> Self {
        let mut axes = IndexMap::new();
        for (name, side, hide) in [
            ("x", AxisSide::Bottom, false),
            ("y", AxisSide::Left, false),
            ("x2", AxisSide::Top, true),
            ("y2", AxisSide::Right, true),
        ] {
            let mut axis = Axis::new(name, side);
            axis.options.hide = hide;
            axes.insert(name.to_string(), axis);
        }
        Self {
            legend: Legend::new(options.legend.clone()),
            options,
            axes,
            pens: IndexMap::new(),
            markers: IndexMap::new(),
            marker_names: HashMap::new(),
            elements: IndexMap::new(),
            element_names: HashMap::new(),
            binds: BindTable::new(),
            windows: None,
            plot: Region2d::default(),
            layout_dirty: true,
            redraw_pending: true,
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    /// Change widget options. Invalid changes are rolled back.
    pub fn configure(&mut self, f: impl FnOnce(&mut GraphOptions)) -> Result<(), GraphError> {
        let saved = self.options.clone();
        f(&mut self.options);
        if let Err(err) = self.options.validate() {
            self.options = saved;
            return Err(err);
        }
        self.legend.options = self.options.legend.clone();
        self.invalidate_layout();
        Ok(())
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), GraphError> {
        self.configure(|o| {
            o.width = width;
            o.height = height;
        })
    }

    /// Attach the manager for window markers' child windows. Windows already
    /// named by markers are claimed from the new host.
    pub fn set_window_host(&mut self, mut host: Box<dyn WindowHost>) {
        for marker in self.markers.values_mut() {
            let Some(name) = window_name(&marker.options).map(str::to_string) else {
                continue;
            };
            match host.claim(&name) {
                Ok(size) => {
                    if let Some(w) = marker.options.window_mut() {
                        w.requested = size;
                    }
                    marker.needs_remap = true;
                }
                Err(err) => log::warn!("marker \"{}\": {err}", marker.name),
            }
        }
        self.windows = Some(host);
        self.redraw_pending = true;
    }

    /// Plot area as of the last layout.
    pub fn plot_region(&mut self) -> Region2d {
        self.update();
        self.plot
    }

    /// True if something changed since the last draw.
    pub fn needs_redraw(&self) -> bool {
        self.redraw_pending
            || self.layout_dirty
            || self.markers.values().any(|m| m.needs_remap)
            || self.elements.values().any(|e| e.needs_remap)
    }

    fn invalidate_layout(&mut self) {
        self.layout_dirty = true;
        self.redraw_pending = true;
    }

    // Axes.

    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.get(name)
    }

    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.axes.keys().map(String::as_str)
    }

    pub fn create_axis(
        &mut self,
        name: &str,
        side: AxisSide,
        f: impl FnOnce(&mut AxisOptions),
    ) -> Result<(), GraphError> {
        if self.axes.contains_key(name) {
            return Err(GraphError::DuplicateName {
                kind: "axis",
                name: name.to_string(),
            });
        }
        let mut axis = Axis::new(name, side);
        f(&mut axis.options);
        axis.validate()?;
        log::debug!("created axis \"{name}\" on {side:?}");
        self.axes.insert(name.to_string(), axis);
        self.invalidate_layout();
        Ok(())
    }

    pub fn configure_axis(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut AxisOptions),
    ) -> Result<(), GraphError> {
        let axis = self
            .axes
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownAxis(name.to_string()))?;
        let saved = axis.options.clone();
        f(&mut axis.options);
        if let Err(err) = axis.validate() {
            axis.options = saved;
            return Err(err);
        }
        log::debug!("configured axis \"{name}\"");
        self.invalidate_layout();
        Ok(())
    }

    /// Delete an axis that no marker or element maps through.
    pub fn delete_axis(&mut self, name: &str) -> Result<(), GraphError> {
        if !self.axes.contains_key(name) {
            return Err(GraphError::UnknownAxis(name.to_string()));
        }
        let uses = |pair: &Axis2d| pair.x == name || pair.y == name;
        if self.markers.values().any(|m| uses(&m.options.axes))
            || self.elements.values().any(|e| uses(&e.options.axes))
        {
            return Err(GraphError::AxisInUse(name.to_string()));
        }
        self.axes.shift_remove(name);
        log::debug!("deleted axis \"{name}\"");
        self.invalidate_layout();
        Ok(())
    }

    // Pens.

    pub fn pen(&self, name: &str) -> Option<&Pen> {
        self.pens.get(name)
    }

    pub fn pen_names(&self) -> impl Iterator<Item = &str> {
        self.pens.keys().map(String::as_str)
    }

    pub fn create_pen(&mut self, name: &str, f: impl FnOnce(&mut PenOptions)) -> Result<(), GraphError> {
        if self.pens.contains_key(name) {
            return Err(GraphError::DuplicateName {
                kind: "pen",
                name: name.to_string(),
            });
        }
        let mut pen = Pen::new(name);
        f(&mut pen.options);
        pen.options.validate()?;
        log::debug!("created pen \"{name}\"");
        self.pens.insert(name.to_string(), pen);
        Ok(())
    }

    pub fn configure_pen(&mut self, name: &str, f: impl FnOnce(&mut PenOptions)) -> Result<(), GraphError> {
        let pen = self
            .pens
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownPen(name.to_string()))?;
        let saved = pen.options.clone();
        f(&mut pen.options);
        if let Err(err) = pen.options.validate() {
            pen.options = saved;
            return Err(err);
        }
        log::debug!("configured pen \"{name}\"");
        self.redraw_pending = true;
        Ok(())
    }

    pub fn delete_pen(&mut self, name: &str) -> Result<(), GraphError> {
        if !self.pens.contains_key(name) {
            return Err(GraphError::UnknownPen(name.to_string()));
        }
        if self
            .elements
            .values()
            .any(|e| e.options.pen_names().any(|n| n == name))
        {
            return Err(GraphError::PenInUse(name.to_string()));
        }
        self.pens.shift_remove(name);
        log::debug!("deleted pen \"{name}\"");
        Ok(())
    }

    // Markers.

    pub fn marker(&self, name: &str) -> Option<&Marker> {
        self.marker_names.get(name).and_then(|id| self.markers.get(id))
    }

    pub fn marker_id(&self, name: &str) -> Option<ShapeId> {
        self.marker_names.get(name).copied()
    }

    pub fn marker_exists(&self, name: &str) -> bool {
        self.marker_names.contains_key(name)
    }

    pub fn marker_kind(&self, name: &str) -> Option<MarkerKind> {
        self.marker(name).map(Marker::kind)
    }

    /// Marker names in display order, bottom first.
    pub fn marker_names(&self) -> Vec<&str> {
        self.markers.values().map(|m| m.name.as_str()).collect()
    }

    /// Create a marker, optionally named. Unnamed markers are called
    /// `marker<N>`. Returns the name.
    pub fn create_marker(
        &mut self,
        kind: MarkerKind,
        name: Option<&str>,
        f: impl FnOnce(&mut MarkerOptions),
    ) -> Result<String, GraphError> {
        let mut marker = Marker::new(String::new(), kind);
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("marker{}", marker.id.0),
        };
        if self.marker_names.contains_key(&name) {
            return Err(GraphError::DuplicateName {
                kind: "marker",
                name,
            });
        }
        marker.name = name.clone();
        f(&mut marker.options);
        marker.configure()?;
        check_axes(&self.axes, &marker.options.axes)?;
        if let Some(window) = window_name(&marker.options).map(str::to_string)
            && let Some(host) = self.windows.as_mut()
        {
            let size = host.claim(&window)?;
            if let Some(w) = marker.options.window_mut() {
                w.requested = size;
            }
        }
        log::debug!("created {kind} marker \"{name}\"");
        self.marker_names.insert(name.clone(), marker.id);
        self.markers.insert(marker.id, marker);
        self.redraw_pending = true;
        Ok(name)
    }

    /// Reconfigure a marker. On error the marker keeps its previous options.
    pub fn configure_marker(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut MarkerOptions),
    ) -> Result<(), GraphError> {
        let id = self
            .marker_id(name)
            .ok_or_else(|| GraphError::UnknownMarker(name.to_string()))?;
        self.configure_marker_id(id, f)
    }

    fn configure_marker_id(
        &mut self,
        id: ShapeId,
        f: impl FnOnce(&mut MarkerOptions),
    ) -> Result<(), GraphError> {
        let Some(marker) = self.markers.get_mut(&id) else {
            return Err(GraphError::UnknownMarker(id.to_string()));
        };
        let saved = marker.options.clone();
        f(&mut marker.options);
        let checked = marker
            .configure()
            .and_then(|_| check_axes(&self.axes, &marker.options.axes));
        if let Err(err) = checked {
            marker.options = saved;
            return Err(err);
        }

        let old_window = window_name(&saved).map(str::to_string);
        let new_window = window_name(&marker.options).map(str::to_string);
        if old_window != new_window
            && let Some(host) = self.windows.as_mut()
        {
            if let Some(window) = &new_window {
                match host.claim(window) {
                    Ok(size) => {
                        if let Some(w) = marker.options.window_mut() {
                            w.requested = size;
                        }
                    }
                    Err(err) => {
                        marker.options = saved;
                        return Err(err);
                    }
                }
            }
            if let Some(window) = &old_window {
                host.release(window);
            }
        }

        if !marker.options.same_geometry(&saved) {
            marker.needs_remap = true;
        }
        log::debug!("configured {} marker \"{}\"", marker.kind(), marker.name);
        self.redraw_pending = true;
        Ok(())
    }

    pub fn delete_marker(&mut self, name: &str) -> Result<(), GraphError> {
        let id = self
            .marker_id(name)
            .ok_or_else(|| GraphError::UnknownMarker(name.to_string()))?;
        self.delete_marker_id(id);
        Ok(())
    }

    fn delete_marker_id(&mut self, id: ShapeId) -> bool {
        let Some(marker) = self.markers.shift_remove(&id) else {
            return false;
        };
        self.binds.forget(&ItemId::Marker(id));
        self.marker_names.remove(&marker.name);
        if let Some(window) = window_name(&marker.options)
            && let Some(host) = self.windows.as_mut()
        {
            host.release(window);
        }
        log::debug!("deleted {} marker \"{}\"", marker.kind(), marker.name);
        self.redraw_pending = true;
        true
    }

    /// Move a marker to the top of the display list, or just above `above`.
    pub fn raise_marker(&mut self, name: &str, above: Option<&str>) -> Result<(), GraphError> {
        let (from, target) = self.marker_positions(name, above)?;
        let to = match target {
            None => self.markers.len() - 1,
            Some(t) if from < t => t,
            Some(t) => t + 1,
        };
        self.markers.move_index(from, to);
        self.redraw_pending = true;
        Ok(())
    }

    /// Move a marker to the bottom of the display list, or just below `below`.
    pub fn lower_marker(&mut self, name: &str, below: Option<&str>) -> Result<(), GraphError> {
        let (from, target) = self.marker_positions(name, below)?;
        let to = match target {
            None => 0,
            Some(t) if from > t => t,
            Some(t) => t - 1,
        };
        self.markers.move_index(from, to);
        self.redraw_pending = true;
        Ok(())
    }

    fn marker_positions(
        &self,
        name: &str,
        other: Option<&str>,
    ) -> Result<(usize, Option<usize>), GraphError> {
        let index = |name: &str| {
            self.marker_id(name)
                .and_then(|id| self.markers.get_index_of(&id))
                .ok_or_else(|| GraphError::UnknownMarker(name.to_string()))
        };
        let from = index(name)?;
        let target = other.map(index).transpose()?.filter(|t| *t != from);
        Ok((from, target))
    }

    /// Markers enclosed by (or, without `enclosed`, overlapping) `region`,
    /// topmost first.
    pub fn find_markers(&mut self, region: &Region2d, enclosed: bool) -> Vec<String> {
        self.update();
        self.markers
            .values()
            .rev()
            .filter(|m| marker_shown(m, &self.elements, &self.element_names))
            .filter(|m| m.region_in(region, enclosed))
            .map(|m| m.name.clone())
            .collect()
    }

    // Elements.

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.element_names.get(name).and_then(|id| self.elements.get(id))
    }

    pub fn element_id(&self, name: &str) -> Option<ShapeId> {
        self.element_names.get(name).copied()
    }

    /// Element names in display order, bottom first.
    pub fn element_names(&self) -> Vec<&str> {
        self.elements.values().map(|e| e.name.as_str()).collect()
    }

    pub fn create_element(
        &mut self,
        kind: ElementKind,
        name: &str,
        f: impl FnOnce(&mut ElementOptions),
    ) -> Result<(), GraphError> {
        if self.element_names.contains_key(name) {
            return Err(GraphError::DuplicateName {
                kind: "element",
                name: name.to_string(),
            });
        }
        let mut element = Element::new(name, kind);
        f(&mut element.options);
        element.configure(&self.pens)?;
        check_axes(&self.axes, &element.options.axes)?;
        log::debug!(
            "created {kind} element \"{name}\" with {} points",
            element.options.point_count()
        );
        self.element_names.insert(name.to_string(), element.id);
        self.elements.insert(element.id, element);
        self.invalidate_layout();
        Ok(())
    }

    /// Reconfigure an element. On error the element keeps its previous options.
    pub fn configure_element(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut ElementOptions),
    ) -> Result<(), GraphError> {
        let element = self
            .element_names
            .get(name)
            .and_then(|id| self.elements.get_mut(id))
            .ok_or_else(|| GraphError::UnknownElement(name.to_string()))?;
        let saved = element.options.clone();
        f(&mut element.options);
        let checked = element
            .configure(&self.pens)
            .and_then(|_| check_axes(&self.axes, &element.options.axes));
        if let Err(err) = checked {
            element.options = saved;
            return Err(err);
        }
        element.needs_remap = true;
        log::debug!("configured {} element \"{name}\"", element.kind());
        // Data changes can move the autoscaled axes and the legend.
        self.invalidate_layout();
        Ok(())
    }

    pub fn delete_element(&mut self, name: &str) -> Result<(), GraphError> {
        let id = self
            .element_id(name)
            .ok_or_else(|| GraphError::UnknownElement(name.to_string()))?;
        self.delete_element_id(id);
        Ok(())
    }

    fn delete_element_id(&mut self, id: ShapeId) -> bool {
        let Some(element) = self.elements.shift_remove(&id) else {
            return false;
        };
        self.binds.forget(&ItemId::Element(id));
        self.element_names.remove(&element.name);
        log::debug!("deleted {} element \"{}\"", element.kind(), element.name);
        self.invalidate_layout();
        true
    }

    /// Move an element to the top of the display list.
    pub fn raise_element(&mut self, name: &str) -> Result<(), GraphError> {
        let from = self
            .element_id(name)
            .and_then(|id| self.elements.get_index_of(&id))
            .ok_or_else(|| GraphError::UnknownElement(name.to_string()))?;
        self.elements.move_index(from, self.elements.len() - 1);
        self.invalidate_layout();
        Ok(())
    }

    /// Move an element to the bottom of the display list.
    pub fn lower_element(&mut self, name: &str) -> Result<(), GraphError> {
        let from = self
            .element_id(name)
            .and_then(|id| self.elements.get_index_of(&id))
            .ok_or_else(|| GraphError::UnknownElement(name.to_string()))?;
        self.elements.move_index(from, 0);
        self.invalidate_layout();
        Ok(())
    }

    /// Mark points of an element active; `None` activates all of them.
    pub fn activate_element(&mut self, name: &str, points: Option<Vec<usize>>) -> Result<(), GraphError> {
        let id = self
            .element_id(name)
            .ok_or_else(|| GraphError::UnknownElement(name.to_string()))?;
        self.set_activation(id, points.map_or(Activation::All, Activation::Points));
        Ok(())
    }

    pub fn deactivate_element(&mut self, name: &str) -> Result<(), GraphError> {
        let id = self
            .element_id(name)
            .ok_or_else(|| GraphError::UnknownElement(name.to_string()))?;
        self.set_activation(id, Activation::None);
        Ok(())
    }

    fn set_activation(&mut self, id: ShapeId, activation: Activation) -> bool {
        let Some(element) = self.elements.get_mut(&id) else {
            return false;
        };
        element.activation = activation;
        self.redraw_pending = true;
        true
    }

    /// Nearest data point of any visible element within the halo, with the
    /// element's name. Line elements also match along their traces when
    /// `interpolate` is set.
    pub fn closest(&mut self, x: f64, y: f64, interpolate: bool) -> Option<(String, Nearest)> {
        self.update();
        let ctx = MapContext::new(&self.axes, self.options.inverted, self.plot);
        let sample = Point2d::new(x, y);
        self.elements
            .values()
            .rev()
            .filter_map(|e| {
                e.closest(sample, self.options.halo, interpolate, &ctx)
                    .map(|n| (e.name.clone(), n))
            })
            .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))
    }

    /// Visible elements enclosed by (or overlapping) `region`, topmost first.
    pub fn find_elements(&mut self, region: &Region2d, enclosed: bool) -> Vec<String> {
        self.update();
        self.elements
            .values()
            .rev()
            .filter(|e| !e.options.hide && e.region_in(region, enclosed))
            .map(|e| e.name.clone())
            .collect()
    }

    // Legend.

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn configure_legend(&mut self, f: impl FnOnce(&mut LegendOptions)) -> Result<(), GraphError> {
        self.configure(|o| f(&mut o.legend))
    }

    /// Element whose legend entry is at the given position.
    pub fn legend_element_at(&mut self, x: f64, y: f64) -> Option<String> {
        self.update();
        let id = self.legend.entry_at(Point2d::new(x, y))?;
        self.elements.get(&id).map(|e| e.name.clone())
    }

    // Coordinates.

    /// Map a data point to screen coordinates through the named axes.
    pub fn transform(&mut self, point: Point2d, axes: &Axis2d) -> Result<Point2d, GraphError> {
        check_axes(&self.axes, axes)?;
        self.update();
        let ctx = MapContext::new(&self.axes, self.options.inverted, self.plot);
        ctx.map(point, axes)
            .ok_or_else(|| GraphError::UnknownAxis(axes.x.clone()))
    }

    /// Map a screen point back to data coordinates.
    pub fn invtransform(&mut self, screen: Point2d, axes: &Axis2d) -> Result<Point2d, GraphError> {
        check_axes(&self.axes, axes)?;
        self.update();
        let ctx = MapContext::new(&self.axes, self.options.inverted, self.plot);
        ctx.invert(screen, axes)
            .ok_or_else(|| GraphError::UnknownAxis(axes.x.clone()))
    }

    // Bindings and events.

    /// Bind a script to an event pattern on a tag. Objects are tagged with
    /// their name, their class name and `all` unless `bind_tags` says
    /// otherwise.
    pub fn bind(
        &mut self,
        tag: &str,
        pattern: &str,
        script: impl FnMut(&BindEvent<ItemId>, &mut Commands) + 'static,
    ) -> Result<(), GraphError> {
        self.binds.bindings_mut().bind(tag, pattern, Box::new(script))
    }

    pub fn unbind(&mut self, tag: &str, pattern: &str) -> Result<bool, GraphError> {
        self.binds.bindings_mut().unbind(tag, pattern)
    }

    /// Patterns bound on `tag`.
    pub fn bindings(&self, tag: &str) -> Vec<String> {
        self.binds.bindings().patterns(tag)
    }

    /// Object currently under the pointer.
    pub fn current_item(&self) -> Option<ItemId> {
        self.binds.current().copied()
    }

    pub fn focus_item(&self) -> Option<ItemId> {
        self.binds.focus_item().copied()
    }

    /// Give keyboard focus to an object, or clear it.
    pub fn focus(&mut self, item: Option<ItemId>) {
        let item = item.filter(|i| self.item_exists(*i));
        self.binds.set_focus(item);
    }

    pub fn item_exists(&self, item: ItemId) -> bool {
        match item {
            ItemId::Marker(id) => self.markers.contains_key(&id),
            ItemId::Element(id) => self.elements.contains_key(&id),
        }
    }

    pub fn item_name(&self, item: ItemId) -> Option<&str> {
        match item {
            ItemId::Marker(id) => self.markers.get(&id).map(|m| m.name.as_str()),
            ItemId::Element(id) => self.elements.get(&id).map(|e| e.name.as_str()),
        }
    }

    /// Feed an input event through the bind table, then apply whatever the
    /// scripts queued.
    pub fn handle_event(&mut self, event: &Event) {
        self.update();
        let commands = self.dispatch(|binds, scene, commands| {
            binds.handle_event(event, scene, commands);
        });
        self.run_commands(commands);
    }

    /// Recompute the current item, e.g. after objects moved under a still
    /// pointer.
    pub fn repick(&mut self) {
        self.update();
        let commands = self.dispatch(|binds, scene, commands| binds.repick(scene, commands));
        self.run_commands(commands);
    }

    fn dispatch(
        &mut self,
        f: impl FnOnce(&mut BindTable<ItemId, Commands>, &Scene<'_>, &mut Commands),
    ) -> Commands {
        let scene = Scene {
            markers: &self.markers,
            elements: &self.elements,
            element_names: &self.element_names,
            ctx: MapContext::new(&self.axes, self.options.inverted, self.plot),
            halo: self.options.halo,
        };
        let mut commands = Commands::default();
        f(&mut self.binds, &scene, &mut commands);
        commands
    }

    fn run_commands(&mut self, mut commands: Commands) {
        for _ in 0..MAX_COMMAND_ROUNDS {
            if commands.is_empty() {
                return;
            }
            let mut repick = false;
            for command in std::mem::take(&mut commands.queue) {
                repick |= self.apply(command);
            }
            if !repick {
                return;
            }
            self.update();
            commands = self.dispatch(|binds, scene, commands| binds.repick(scene, commands));
        }
        if !commands.is_empty() {
            log::warn!(
                "dropping {} queued commands after {MAX_COMMAND_ROUNDS} rounds",
                commands.len()
            );
        }
    }

    /// Apply one queued command. Returns true if the objects under the
    /// pointer may have changed.
    fn apply(&mut self, command: Command) -> bool {
        log::trace!("applying {command:?}");
        let applied = match &command {
            Command::Delete(ItemId::Marker(id)) => self.delete_marker_id(*id),
            Command::Delete(ItemId::Element(id)) => self.delete_element_id(*id),
            Command::SetHidden(ItemId::Marker(id), hide) => {
                let hide = *hide;
                self.configure_marker_id(*id, |o| o.hide = hide).is_ok()
            }
            Command::SetHidden(ItemId::Element(id), hide) => match self.elements.get_mut(id) {
                Some(e) => {
                    e.options.hide = *hide;
                    self.invalidate_layout();
                    true
                }
                None => false,
            },
            Command::Raise(ItemId::Marker(id)) | Command::Lower(ItemId::Marker(id)) => {
                match self.markers.get_index_of(id) {
                    Some(from) => {
                        let top = matches!(command, Command::Raise(_));
                        let to = if top { self.markers.len() - 1 } else { 0 };
                        self.markers.move_index(from, to);
                        self.redraw_pending = true;
                        true
                    }
                    None => false,
                }
            }
            Command::Raise(ItemId::Element(id)) | Command::Lower(ItemId::Element(id)) => {
                match self.elements.get_index_of(id) {
                    Some(from) => {
                        let top = matches!(command, Command::Raise(_));
                        let to = if top { self.elements.len() - 1 } else { 0 };
                        self.elements.move_index(from, to);
                        self.invalidate_layout();
                        true
                    }
                    None => false,
                }
            }
            Command::Activate(ItemId::Element(id), points) => {
                let activation = points.clone().map_or(Activation::All, Activation::Points);
                let applied = self.set_activation(*id, activation);
                return report(applied, &command, false);
            }
            Command::Deactivate(ItemId::Element(id)) => {
                let applied = self.set_activation(*id, Activation::None);
                return report(applied, &command, false);
            }
            Command::Activate(ItemId::Marker(id), _) => {
                self.configure_marker_id(*id, |o| o.state = MarkerState::Active)
                    .is_ok()
            }
            Command::Deactivate(ItemId::Marker(id)) => {
                self.configure_marker_id(*id, |o| o.state = MarkerState::Normal)
                    .is_ok()
            }
            Command::SetMarkerState(ItemId::Marker(id), state) => {
                let state = *state;
                self.configure_marker_id(*id, |o| o.state = state).is_ok()
            }
            Command::MoveMarker(ItemId::Marker(id), coords) => {
                let coords = coords.clone();
                self.configure_marker_id(*id, |o| o.coords = coords).is_ok()
            }
            Command::SetMarkerState(ItemId::Element(_), _)
            | Command::MoveMarker(ItemId::Element(_), _) => {
                log::warn!("ignoring {command:?}: not a marker");
                return false;
            }
            Command::Focus(item) => {
                let valid = item.is_none_or(|i| self.item_exists(i));
                if valid {
                    self.binds.set_focus(*item);
                }
                return report(valid, &command, false);
            }
            Command::Repick => true,
        };
        report(applied, &command, true)
    }

    // Layout and drawing.

    /// Bring layout and screen geometry up to date.
    pub fn update(&mut self) {
        if self.layout_dirty {
            self.layout();
        }
        let ctx = MapContext::new(&self.axes, self.options.inverted, self.plot);
        let env = MapEnv {
            ctx,
            measure: &self.options.measure,
        };
        for marker in self.markers.values_mut().filter(|m| m.needs_remap) {
            marker.map(&env);
            self.redraw_pending = true;
        }
        for element in self.elements.values_mut().filter(|e| e.needs_remap) {
            element.map(&env.ctx);
            self.redraw_pending = true;
        }
    }

    fn layout(&mut self) {
        self.autoscale();

        self.legend.update(&self.elements, &self.options.measure);
        let (lw, lh) = self.legend.size();
        let (width, height) = (self.options.width, self.options.height);
        let m = self.options.margins;
        let (mut left, mut top) = (m.left, m.top);
        let (mut right, mut bottom) = (width - m.right, height - m.bottom);
        let legend_at = match self.options.legend.position {
            LegendPosition::Right => {
                right -= lw;
                Some(Point2d::new(width - lw, top))
            }
            LegendPosition::Left => {
                left += lw;
                Some(Point2d::new(0.0, top))
            }
            LegendPosition::Top => {
                top += lh;
                Some(Point2d::new(left, 0.0))
            }
            LegendPosition::Bottom => {
                bottom -= lh;
                Some(Point2d::new(left, height - lh))
            }
            LegendPosition::PlotArea => None,
        };
        right = right.max(left + 1.0);
        bottom = bottom.max(top + 1.0);
        self.plot = Region2d::new(left, top, right, bottom);
        let legend_at = legend_at.unwrap_or_else(|| {
            let anchor = self.options.legend.anchor;
            let r = anchor_reference(&self.plot, anchor);
            anchor_point(r.x, r.y, lw, lh, anchor)
        });
        self.legend.place(legend_at);

        let plot = self.plot;
        let inverted = self.options.inverted;
        for axis in self.axes.values_mut() {
            if axis.side().is_x() != inverted {
                axis.set_screen(plot.left, plot.width());
                axis.update_ticks(hmap);
            } else {
                axis.set_screen(plot.top, plot.height());
                axis.update_ticks(vmap);
            }
        }
        log::trace!("layout: plot {plot:?}, legend {:?}", self.legend.region());

        for marker in self.markers.values_mut() {
            marker.needs_remap = true;
        }
        for element in self.elements.values_mut() {
            element.needs_remap = true;
        }
        self.layout_dirty = false;
        self.redraw_pending = true;
    }

    /// Set each axis's data extents from the visible elements mapped to it.
    fn autoscale(&mut self) {
        let mut extents: HashMap<&str, Option<(f64, f64)>> = HashMap::new();
        for element in self.elements.values().filter(|e| !e.options.hide) {
            let pair = &element.options.axes;
            let (Some(x), Some(y)) = (self.axes.get(&pair.x), self.axes.get(&pair.y)) else {
                continue;
            };
            let (xe, ye) = element.data_extents(x.options.scale, y.options.scale);
            for (name, e) in [(pair.x.as_str(), xe), (pair.y.as_str(), ye)] {
                let slot = extents.entry(name).or_default();
                *slot = merge_extents(*slot, e);
            }
        }
        let extents: HashMap<String, (f64, f64)> = extents
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
            .collect();
        for axis in self.axes.values_mut() {
            axis.set_data_extents(extents.get(axis.name()).copied());
            axis.update_range();
        }
    }

    /// Draw the whole graph.
    pub fn draw(&mut self, painter: &mut dyn Painter) {
        self.update();
        let full = Region2d::new(0.0, 0.0, self.options.width, self.options.height);
        painter.draw_rectangle(&full, &Paint::fill(self.options.background));
        if let Some(bg) = self.options.plot_background {
            painter.draw_rectangle(&self.plot, &Paint::fill(bg));
        }
        self.draw_markers(true, painter);
        for element in self.elements.values() {
            element.draw(&self.pens, &self.plot, painter);
        }
        self.draw_markers(false, painter);
        self.draw_decorations(painter);
        self.place_windows();
        self.redraw_pending = false;
    }

    fn draw_markers(&self, under: bool, painter: &mut dyn Painter) {
        for marker in self
            .markers
            .values()
            .filter(|m| m.options.draw_under == under)
            .filter(|m| marker_shown(m, &self.elements, &self.element_names))
        {
            marker.draw(painter);
        }
    }

    fn place_windows(&mut self) {
        let Some(host) = self.windows.as_mut() else {
            return;
        };
        for marker in self.markers.values() {
            let Some(window) = window_name(&marker.options) else {
                continue;
            };
            let shown = marker.is_drawable() && marker_shown(marker, &self.elements, &self.element_names);
            match marker.window_region().filter(|_| shown) {
                Some(region) => host.place(window, region),
                None => host.unmap(window),
            }
        }
    }

    /// Axes, legend and title.
    fn draw_decorations(&self, painter: &mut dyn Painter) {
        for axis in self.axes.values().filter(|a| !a.options.hide) {
            self.draw_axis(axis, painter);
        }
        self.legend.draw(&self.elements, &self.pens, painter);
        if let Some(title) = &self.options.title {
            let (_, h) = (self.options.measure)(title, &self.options.font);
            let center = Point2d::new(self.plot.center().x, (self.plot.top - h).max(h * 0.5));
            painter.draw_text(
                title,
                center,
                &TextStyle {
                    color: self.options.foreground,
                    font: self.options.font.clone(),
                    angle: 0.0,
                },
            );
        }
    }

    fn draw_axis(&self, axis: &Axis, painter: &mut dyn Painter) {
        let plot = &self.plot;
        let horizontal = axis.side().is_x() != self.options.inverted;
        // Top and right axes sit on the far edge whether or not x and y
        // are swapped.
        let far = matches!(axis.side(), AxisSide::Top | AxisSide::Right);
        let out = if far { -1.0 } else { 1.0 };
        let paint = Paint::stroke(axis.options.color, 1.0, &Dashes::Solid);
        let style = TextStyle {
            color: axis.options.color,
            font: self.options.font.clone(),
            angle: 0.0,
        };
        let measure = &self.options.measure;

        let mut segments = Vec::with_capacity(axis.ticks().len() + 1);
        let mut labels = Vec::with_capacity(axis.ticks().len());
        let mut extent: f64 = 0.0;
        if horizontal {
            let y = if far { plot.top } else { plot.bottom };
            segments.push(Segment2d::new(
                Point2d::new(plot.left, y),
                Point2d::new(plot.right, y),
            ));
            for t in axis.ticks() {
                let x = t.screen_pos;
                segments.push(Segment2d::new(
                    Point2d::new(x, y),
                    Point2d::new(x, y + out * TICK_LENGTH),
                ));
                let (_, h) = measure(&t.label, &style.font);
                extent = extent.max(h);
                labels.push((
                    &t.label,
                    Point2d::new(x, y + out * (TICK_LENGTH + 2.0 + h * 0.5)),
                ));
            }
        } else {
            let x = if far { plot.right } else { plot.left };
            let out = -out;
            segments.push(Segment2d::new(
                Point2d::new(x, plot.top),
                Point2d::new(x, plot.bottom),
            ));
            for t in axis.ticks() {
                let y = t.screen_pos;
                segments.push(Segment2d::new(
                    Point2d::new(x, y),
                    Point2d::new(x + out * TICK_LENGTH, y),
                ));
                let (w, _) = measure(&t.label, &style.font);
                extent = extent.max(w);
                labels.push((
                    &t.label,
                    Point2d::new(x + out * (TICK_LENGTH + 2.0 + w * 0.5), y),
                ));
            }
        }
        painter.draw_segments(&segments, &paint);
        for (label, center) in labels {
            painter.draw_text(label, center, &style);
        }

        let Some(title) = &axis.options.title else {
            return;
        };
        let (_, h) = measure(title, &style.font);
        let offset = TICK_LENGTH + 4.0 + extent + h * 0.5;
        let (center, angle) = if horizontal {
            let y = if far { plot.top - offset } else { plot.bottom + offset };
            (Point2d::new(plot.center().x, y), 0.0)
        } else {
            let x = if far { plot.right + offset } else { plot.left - offset };
            (Point2d::new(x, plot.center().y), 90.0)
        };
        painter.draw_text(title, center, &TextStyle { angle, ..style });
    }

    /// Render the graph as Encapsulated PostScript.
    pub fn postscript(&mut self) -> String {
        self.update();
        let mut ps = PsWriter::new(self.options.width, self.options.height);
        ps.set_background(self.options.background);
        ps.fill_background();
        if let Some(bg) = self.options.plot_background {
            ps.comment("plot area");
            ps.draw_rectangle(&self.plot, &Paint::fill(bg));
        }
        for marker in self.shown_markers(true) {
            marker.postscript(&mut ps);
        }
        for element in self.elements.values() {
            element.postscript(&self.pens, &self.plot, &mut ps);
        }
        for marker in self.shown_markers(false) {
            marker.postscript(&mut ps);
        }
        ps.comment("axes and legend");
        self.draw_decorations(&mut ps);
        ps.finish()
    }

    fn shown_markers(&self, under: bool) -> impl Iterator<Item = &Marker> {
        self.markers
            .values()
            .filter(move |m| m.options.draw_under == under)
            .filter(move |m| marker_shown(m, &self.elements, &self.element_names))
    }
}
