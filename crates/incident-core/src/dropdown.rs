//! Accessible single-select control.
//!
//! The controller is a pure state machine. Hosts feed it [`DropdownEvent`]s
//! from their UI toolkit and apply the returned [`DropdownEffect`]s: moving
//! input focus, (un)subscribing from the global input stream, and receiving
//! the committed value. A selection change is only ever reported through
//! [`DropdownEffect::Commit`].

use crate::models::IncidentType;

/// Placeholder shown on the trigger when nothing is selected
pub const DEFAULT_PLACEHOLDER: &str = "Select an option";

/// A selectable entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption<V> {
    pub label: String,
    pub value: V,
}

impl<V> SelectOption<V> {
    pub fn new(label: impl Into<String>, value: V) -> Self {
        Self { label: label.into(), value }
    }
}

/// Options for the incident type picker, labelled with their wire values
pub fn incident_type_options() -> Vec<SelectOption<IncidentType>> {
    IncidentType::ALL.iter().map(|t| SelectOption::new(t.as_str(), *t)).collect()
}

/// Keys the control reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Space,
    Escape,
    Other,
}

/// Input delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownEvent {
    /// Pointer activation of the trigger button
    TriggerClicked,
    /// Key pressed while the trigger has focus
    TriggerKey(Key),
    /// Key pressed inside the open menu
    MenuKey(Key),
    OptionHovered(usize),
    OptionClicked(usize),
    /// Pointer down anywhere outside both trigger and menu
    PointerOutside,
    /// Key seen on the global input stream
    GlobalKey(Key),
}

/// Where the host should move input focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Trigger,
    Option(usize),
}

/// Side effect the host must apply after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropdownEffect<V> {
    Focus(FocusTarget),
    /// The user chose this value
    Commit(V),
    /// Start listening for outside pointer events and Escape
    SubscribeGlobal,
    UnsubscribeGlobal,
}

/// Open/closed state; the active index only exists while open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownState {
    Closed,
    Open { active_index: usize },
}

#[derive(Debug, Clone)]
pub struct DropdownController<V> {
    label: String,
    placeholder: String,
    options: Vec<SelectOption<V>>,
    selected: Option<usize>,
    state: DropdownState,
    disabled: bool,
}

impl<V: Clone + PartialEq> DropdownController<V> {
    pub fn new(label: impl Into<String>, options: Vec<SelectOption<V>>) -> Self {
        Self {
            label: label.into(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            options,
            selected: None,
            state: DropdownState::Closed,
            disabled: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn state(&self) -> DropdownState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DropdownState::Open { .. })
    }

    pub fn active_index(&self) -> Option<usize> {
        match self.state {
            DropdownState::Open { active_index } => Some(active_index),
            DropdownState::Closed => None,
        }
    }

    pub fn options(&self) -> &[SelectOption<V>] {
        &self.options
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_value(&self) -> Option<&V> {
        self.selected.and_then(|i| self.options.get(i)).map(|o| &o.value)
    }

    /// Sync the selection with the owner's value (e.g. after a form reset).
    /// Values not among the options clear the selection. No commit is emitted.
    pub fn set_selected(&mut self, value: Option<&V>) {
        self.selected = value.and_then(|v| self.options.iter().position(|o| &o.value == v));
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Disable or enable the control; disabling an open control closes it
    pub fn set_disabled(&mut self, disabled: bool) -> Vec<DropdownEffect<V>> {
        self.disabled = disabled;
        if disabled && self.is_open() {
            self.state = DropdownState::Closed;
            return vec![DropdownEffect::UnsubscribeGlobal];
        }
        Vec::new()
    }

    /// Apply one input event and return the effects for the host
    pub fn handle(&mut self, event: DropdownEvent) -> Vec<DropdownEffect<V>> {
        if self.disabled {
            return Vec::new();
        }

        match (self.state, event) {
            (DropdownState::Closed, DropdownEvent::TriggerClicked)
            | (
                DropdownState::Closed,
                DropdownEvent::TriggerKey(Key::ArrowDown | Key::Enter | Key::Space),
            ) => self.open(),
            (DropdownState::Closed, _) => Vec::new(),

            (DropdownState::Open { .. }, DropdownEvent::TriggerClicked) => self.close(None),
            (
                DropdownState::Open { .. },
                DropdownEvent::TriggerKey(Key::Escape)
                | DropdownEvent::MenuKey(Key::Escape)
                | DropdownEvent::GlobalKey(Key::Escape),
            ) => self.close(Some(FocusTarget::Trigger)),
            (DropdownState::Open { .. }, DropdownEvent::PointerOutside) => self.close(None),

            (DropdownState::Open { active_index }, DropdownEvent::MenuKey(Key::ArrowDown)) => {
                self.move_to((active_index + 1) % self.options.len())
            }
            (DropdownState::Open { active_index }, DropdownEvent::MenuKey(Key::ArrowUp)) => {
                let n = self.options.len();
                self.move_to((active_index + n - 1) % n)
            }
            (
                DropdownState::Open { active_index },
                DropdownEvent::MenuKey(Key::Enter | Key::Space),
            ) => self.commit(active_index),

            (DropdownState::Open { .. }, DropdownEvent::OptionHovered(index))
                if index < self.options.len() =>
            {
                self.state = DropdownState::Open { active_index: index };
                Vec::new()
            }
            (DropdownState::Open { .. }, DropdownEvent::OptionClicked(index))
                if index < self.options.len() =>
            {
                self.commit(index)
            }

            (DropdownState::Open { .. }, _) => Vec::new(),
        }
    }

    fn open(&mut self) -> Vec<DropdownEffect<V>> {
        if self.options.is_empty() {
            return Vec::new();
        }
        let active_index = self.selected.filter(|i| *i < self.options.len()).unwrap_or(0);
        self.state = DropdownState::Open { active_index };
        vec![
            DropdownEffect::SubscribeGlobal,
            DropdownEffect::Focus(FocusTarget::Option(active_index)),
        ]
    }

    fn close(&mut self, focus: Option<FocusTarget>) -> Vec<DropdownEffect<V>> {
        self.state = DropdownState::Closed;
        let mut effects = vec![DropdownEffect::UnsubscribeGlobal];
        if let Some(target) = focus {
            effects.push(DropdownEffect::Focus(target));
        }
        effects
    }

    fn move_to(&mut self, index: usize) -> Vec<DropdownEffect<V>> {
        self.state = DropdownState::Open { active_index: index };
        vec![DropdownEffect::Focus(FocusTarget::Option(index))]
    }

    fn commit(&mut self, index: usize) -> Vec<DropdownEffect<V>> {
        let Some(option) = self.options.get(index) else {
            return Vec::new();
        };
        let value = option.value.clone();
        self.selected = Some(index);
        self.state = DropdownState::Closed;
        vec![
            DropdownEffect::Commit(value),
            DropdownEffect::UnsubscribeGlobal,
            DropdownEffect::Focus(FocusTarget::Trigger),
        ]
    }

    // Accessibility attributes

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Text on the trigger: the selected label or the placeholder
    pub fn trigger_text(&self) -> &str {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(|o| o.label.as_str())
            .unwrap_or(self.placeholder.as_str())
    }

    /// Id slug derived from the label: lowercase, whitespace runs become `-`,
    /// anything outside `[a-z0-9-_]` is dropped
    pub fn control_id(&self) -> String {
        let lowered = self.label.to_lowercase();
        let mut slug = String::with_capacity(lowered.len());
        let mut in_whitespace = false;
        for c in lowered.chars() {
            if c.is_whitespace() {
                if !in_whitespace {
                    slug.push('-');
                }
                in_whitespace = true;
                continue;
            }
            in_whitespace = false;
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
                slug.push(c);
            }
        }
        slug
    }

    pub fn trigger_id(&self) -> String {
        format!("{}-button", self.control_id())
    }

    pub fn menu_id(&self) -> String {
        format!("{}-menu", self.control_id())
    }

    /// Value of `aria-expanded` on the trigger
    pub fn aria_expanded(&self) -> bool {
        self.is_open()
    }

    /// Value of `aria-selected` on an option
    pub fn aria_selected(&self, index: usize) -> bool {
        self.selected == Some(index)
    }
}
