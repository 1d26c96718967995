//! Pick/bind table: turns raw pointer and key events into per-object
//! Enter/Leave/press/release/motion/key callbacks.
//!
//! The table tracks which object is *current* (logically under the pointer)
//! and which has keyboard *focus*. It never owns those objects; it holds
//! handles and asks a [`Picker`] to resolve positions and tags.
//!
//! While a pointer button is held the current object is implicitly grabbed:
//! it stays current, and no crossing events are generated, until every button
//! is released.
//!
//! Scripts run synchronously during dispatch but only see the event and a
//! caller-supplied context (usually a deferred command queue), so they cannot
//! re-enter the table or mutate the objects being picked.
use core::fmt;

use crate::error::GraphError;
use crate::event::{CrossingDetail, Event, EventKind, ModifierState};

/// Resolves screen positions to objects and objects to their binding tags.
pub trait Picker<I> {
    /// Topmost object at the given position, if any.
    fn pick(&self, x: f64, y: f64) -> Option<I>;

    /// Tags used to look up bindings for `item`, most specific first.
    fn tags(&self, item: &I) -> Vec<String>;
}

/// The event a script is invoked with.
#[derive(Debug, Clone, PartialEq)]
pub struct BindEvent<I> {
    pub event: Event,
    /// Object the event was dispatched to.
    pub item: I,
    /// Tag whose binding matched.
    pub tag: String,
}

/// A bound callback. `C` is the dispatch context supplied by the owner.
pub type Script<I, C> = Box<dyn FnMut(&BindEvent<I>, &mut C)>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternDetail {
    Button(u8),
    Key(String),
}

/// A parsed event pattern such as `<Shift-ButtonPress-1>` or `<Enter>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPattern {
    kind: EventKind,
    modifiers: ModifierState,
    detail: Option<PatternDetail>,
}

fn bad_pattern(pattern: &str, reason: impl Into<String>) -> GraphError {
    GraphError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

impl EventPattern {
    pub fn parse(pattern: &str) -> Result<Self, GraphError> {
        let body = pattern
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(|| bad_pattern(pattern, "missing angle brackets"))?;
        if body.is_empty() {
            return Err(bad_pattern(pattern, "empty pattern"));
        }

        let mut modifiers = ModifierState::NONE;
        let mut kind = None;
        let mut detail = None;
        for word in body.split('-') {
            if kind.is_none() {
                let m = match word {
                    "Shift" => Some(ModifierState::SHIFT),
                    "Lock" => Some(ModifierState::LOCK),
                    "Control" => Some(ModifierState::CONTROL),
                    "Alt" | "Mod1" => Some(ModifierState::ALT),
                    "Meta" => Some(ModifierState::META),
                    "B1" | "Button1" => Some(ModifierState::BUTTON1),
                    "B2" | "Button2" => Some(ModifierState::BUTTON2),
                    "B3" | "Button3" => Some(ModifierState::BUTTON3),
                    "B4" | "Button4" => Some(ModifierState::BUTTON4),
                    "B5" | "Button5" => Some(ModifierState::BUTTON5),
                    _ => None,
                };
                if let Some(m) = m {
                    modifiers = modifiers | m;
                    continue;
                }
                kind = Some(match word {
                    "ButtonPress" | "Button" => EventKind::ButtonPress,
                    "ButtonRelease" => EventKind::ButtonRelease,
                    "Motion" => EventKind::Motion,
                    "Enter" => EventKind::Enter,
                    "Leave" => EventKind::Leave,
                    "KeyPress" | "Key" => EventKind::KeyPress,
                    "KeyRelease" => EventKind::KeyRelease,
                    // "<1>" is shorthand for "<ButtonPress-1>".
                    d if d.len() == 1 && matches!(d.as_bytes()[0], b'1'..=b'5') => {
                        detail = Some(PatternDetail::Button(d.as_bytes()[0] - b'0'));
                        EventKind::ButtonPress
                    }
                    other => return Err(bad_pattern(pattern, format!("unknown word \"{other}\""))),
                });
                continue;
            }
            if detail.is_some() {
                return Err(bad_pattern(pattern, "extra words after detail"));
            }
            detail = Some(match kind {
                Some(EventKind::ButtonPress | EventKind::ButtonRelease) => match word {
                    "1" | "2" | "3" | "4" | "5" => PatternDetail::Button(word.as_bytes()[0] - b'0'),
                    other => {
                        return Err(bad_pattern(pattern, format!("bad button \"{other}\"")));
                    }
                },
                Some(EventKind::KeyPress | EventKind::KeyRelease) if !word.is_empty() => {
                    PatternDetail::Key(word.to_string())
                }
                _ => return Err(bad_pattern(pattern, format!("no detail allowed: \"{word}\""))),
            });
        }
        let kind = kind.ok_or_else(|| bad_pattern(pattern, "no event type"))?;
        Ok(Self {
            kind,
            modifiers,
            detail,
        })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn matches(&self, event: &Event) -> bool {
        if self.kind != event.kind || !event.state.contains(self.modifiers) {
            return false;
        }
        match &self.detail {
            None => true,
            Some(PatternDetail::Button(b)) => *b == event.button,
            Some(PatternDetail::Key(k)) => event.key.as_deref() == Some(k.as_str()),
        }
    }

    fn specificity(&self) -> u32 {
        self.modifiers.count() + if self.detail.is_some() { 8 } else { 0 }
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        let names = [
            (ModifierState::SHIFT, "Shift"),
            (ModifierState::LOCK, "Lock"),
            (ModifierState::CONTROL, "Control"),
            (ModifierState::ALT, "Alt"),
            (ModifierState::META, "Meta"),
            (ModifierState::BUTTON1, "B1"),
            (ModifierState::BUTTON2, "B2"),
            (ModifierState::BUTTON3, "B3"),
            (ModifierState::BUTTON4, "B4"),
            (ModifierState::BUTTON5, "B5"),
        ];
        for (mask, name) in names {
            if self.modifiers.contains(mask) {
                write!(f, "{name}-")?;
            }
        }
        write!(f, "{}", self.kind)?;
        match &self.detail {
            Some(PatternDetail::Button(b)) => write!(f, "-{b}")?,
            Some(PatternDetail::Key(k)) => write!(f, "-{k}")?,
            None => {}
        }
        f.write_str(">")
    }
}

struct Binding<I, C> {
    tag: String,
    pattern: EventPattern,
    script: Script<I, C>,
}

/// Tag x pattern -> script store.
///
/// For each tag of the target, in order, the most specific matching binding
/// runs. Among equally specific matches the most recently bound wins.
pub struct BindingTable<I, C> {
    bindings: Vec<Binding<I, C>>,
}

impl<I, C> Default for BindingTable<I, C> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<I: Clone, C> BindingTable<I, C> {
    /// Bind `script` to `pattern` on `tag`, replacing an identical binding.
    pub fn bind(
        &mut self,
        tag: &str,
        pattern: &str,
        script: Script<I, C>,
    ) -> Result<(), GraphError> {
        let pattern = EventPattern::parse(pattern)?;
        self.bindings
            .retain(|b| !(b.tag == tag && b.pattern == pattern));
        self.bindings.push(Binding {
            tag: tag.to_string(),
            pattern,
            script,
        });
        Ok(())
    }

    /// Remove a binding. Returns false if there was none.
    pub fn unbind(&mut self, tag: &str, pattern: &str) -> Result<bool, GraphError> {
        let pattern = EventPattern::parse(pattern)?;
        let before = self.bindings.len();
        self.bindings
            .retain(|b| !(b.tag == tag && b.pattern == pattern));
        Ok(self.bindings.len() != before)
    }

    /// Remove every binding on `tag`.
    pub fn delete_tag(&mut self, tag: &str) {
        self.bindings.retain(|b| b.tag != tag);
    }

    /// Patterns bound on `tag`, in binding order.
    pub fn patterns(&self, tag: &str) -> Vec<String> {
        self.bindings
            .iter()
            .filter(|b| b.tag == tag)
            .map(|b| b.pattern.to_string())
            .collect()
    }

    /// Run the best matching script for each tag. Returns how many ran.
    pub fn dispatch(&mut self, tags: &[String], event: &Event, item: &I, ctx: &mut C) -> usize {
        let mut ran = 0;
        for tag in tags {
            let best = self
                .bindings
                .iter()
                .enumerate()
                .filter(|(_, b)| &b.tag == tag && b.pattern.matches(event))
                .max_by_key(|(i, b)| (b.pattern.specificity(), *i))
                .map(|(i, _)| i);
            if let Some(i) = best {
                let bind_event = BindEvent {
                    event: event.clone(),
                    item: item.clone(),
                    tag: tag.clone(),
                };
                (self.bindings[i].script)(&bind_event, ctx);
                ran += 1;
            }
        }
        ran
    }
}

/// Current/focus tracking plus the binding store for one widget.
pub struct BindTable<I, C> {
    bindings: BindingTable<I, C>,
    current: Option<I>,
    new_item: Option<I>,
    focus: Option<I>,
    state: ModifierState,
    pick_event: Option<Event>,
    left_grabbed_item: bool,
}

impl<I, C> Default for BindTable<I, C> {
    fn default() -> Self {
        Self {
            bindings: BindingTable::default(),
            current: None,
            new_item: None,
            focus: None,
            state: ModifierState::NONE,
            pick_event: None,
            left_grabbed_item: false,
        }
    }
}

impl<I: Clone + PartialEq + fmt::Debug, C> BindTable<I, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bindings(&self) -> &BindingTable<I, C> {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut BindingTable<I, C> {
        &mut self.bindings
    }

    /// Object currently under the pointer (or grabbed).
    pub fn current(&self) -> Option<&I> {
        self.current.as_ref()
    }

    pub fn focus_item(&self) -> Option<&I> {
        self.focus.as_ref()
    }

    pub fn set_focus(&mut self, item: Option<I>) {
        self.focus = item;
    }

    /// Tracked modifier and button state.
    pub fn state(&self) -> ModifierState {
        self.state
    }

    /// True while a button is held and the pointer has left the grabbed object.
    pub fn is_grab_deferred(&self) -> bool {
        self.left_grabbed_item
    }

    /// Drop every reference to `item`. Call before the object goes away.
    pub fn forget(&mut self, item: &I) {
        if self.current.as_ref() == Some(item) {
            self.current = None;
            self.left_grabbed_item = false;
        }
        if self.new_item.as_ref() == Some(item) {
            self.new_item = None;
        }
        if self.focus.as_ref() == Some(item) {
            self.focus = None;
        }
    }

    /// Feed one raw event through the table.
    pub fn handle_event(&mut self, event: &Event, picker: &impl Picker<I>, ctx: &mut C) {
        match event.kind {
            EventKind::ButtonPress => {
                // Pick with the state from before the press so the press itself
                // can make a newly covered object current.
                self.state = event.state;
                self.pick_item(event, picker, ctx);
                self.state = self.state.toggle(ModifierState::button(event.button));
                let target = self.current.clone();
                self.do_event(event, target, picker, ctx);
            }
            EventKind::ButtonRelease => {
                self.state = event.state;
                let target = self.current.clone();
                self.do_event(event, target, picker, ctx);
                self.state = event.state.toggle(ModifierState::button(event.button));
                self.pick_item(event, picker, ctx);
            }
            EventKind::Enter | EventKind::Leave => {
                self.state = event.state;
                self.pick_item(event, picker, ctx);
            }
            EventKind::Motion => {
                self.state = event.state;
                self.pick_item(event, picker, ctx);
                let target = self.current.clone();
                self.do_event(event, target, picker, ctx);
            }
            EventKind::KeyPress | EventKind::KeyRelease => {
                self.state = event.state;
                self.pick_item(event, picker, ctx);
                let target = self.focus.clone();
                self.do_event(event, target, picker, ctx);
            }
        }
    }

    /// Re-run picking with the last pick event, e.g. after objects moved or
    /// were deleted without any pointer motion.
    pub fn repick(&mut self, picker: &impl Picker<I>, ctx: &mut C) {
        if let Some(event) = self.pick_event.clone() {
            self.pick_item(&event, picker, ctx);
        }
    }

    /// Decide which object is current and dispatch the crossing events that
    /// result.
    pub fn pick_item(&mut self, event: &Event, picker: &impl Picker<I>, ctx: &mut C) {
        let button_down = self.state.any_button();
        if !button_down {
            self.left_grabbed_item = false;
        }

        let pick_event = match event.kind {
            EventKind::Motion | EventKind::ButtonRelease => {
                let mut crossing = event.crossing(EventKind::Enter);
                crossing.state = self.state;
                crossing
            }
            EventKind::KeyPress | EventKind::KeyRelease => {
                // Keys carry no pointer position; pick where the pointer was last seen.
                let Some(last) = &self.pick_event else {
                    return;
                };
                let mut at = event.clone();
                at.x = last.x;
                at.y = last.y;
                at
            }
            _ => event.clone(),
        };

        let new_item = if pick_event.kind == EventKind::Leave {
            None
        } else {
            picker.pick(pick_event.x, pick_event.y)
        };
        self.pick_event = Some(pick_event);
        self.new_item = new_item.clone();

        // Back over the grabbed object: no Leave, but it is entered again.
        let regained = new_item == self.current;
        if regained && !self.left_grabbed_item {
            return;
        }
        if button_down && !regained {
            log::trace!("pick deferred by grab: {:?} -> {:?}", self.current, new_item);
            self.left_grabbed_item = true;
            return;
        }

        if !regained && let Some(old) = self.current.clone() {
            let leave = self.crossing_event(EventKind::Leave);
            self.do_event(&leave, Some(old), picker, ctx);
        }

        log::trace!("current item {:?} -> {:?}", self.current, new_item);
        self.left_grabbed_item = false;
        self.current = new_item.clone();
        if let Some(new) = new_item {
            let enter = self.crossing_event(EventKind::Enter);
            self.do_event(&enter, Some(new), picker, ctx);
        }
    }

    fn crossing_event(&self, kind: EventKind) -> Event {
        let mut event = match &self.pick_event {
            Some(e) => e.crossing(kind),
            None => Event::motion(0.0, 0.0).crossing(kind),
        };
        event.detail = CrossingDetail::Ancestor;
        event
    }

    /// Dispatch an already resolved event to `item` using its tags.
    pub fn do_event(&mut self, event: &Event, item: Option<I>, picker: &impl Picker<I>, ctx: &mut C) {
        let Some(item) = item else {
            return;
        };
        let tags = picker.tags(&item);
        if tags.is_empty() {
            return;
        }
        self.bindings.dispatch(&tags, event, &item, ctx);
    }
}
