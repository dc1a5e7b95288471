//! Cutscene dialogs and the input handler stack they sit on.
//!
//! A [`Dialog`] is a strictly forward, single pass sequence of [`Line`]s.
//! Rendering one pushes its handler onto a [`HandlerStack`] so that it receives
//! input ahead of whatever was active before; tearing it down removes exactly
//! that handler again.

use common::Side;
use serde::Deserialize;

/// A single line of dialog.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Line {
    pub side: Side,
    pub speaker: String,
    pub text: String,
}

impl Line {
    pub fn new(side: Side, speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            side,
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// Identifies one registration on a [`HandlerStack`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Ordered input priority stack. Only the topmost handler receives commands.
#[derive(Debug)]
pub struct HandlerStack<H> {
    next: u64,
    entries: Vec<(HandlerId, H)>,
}

impl<H> Default for HandlerStack<H> {
    fn default() -> Self {
        Self {
            next: 0,
            entries: Vec::new(),
        }
    }
}

impl<H> HandlerStack<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates a handler on top of the stack.
    pub fn push(&mut self, handler: H) -> HandlerId {
        let id = HandlerId(self.next);
        self.next += 1;
        self.entries.push((id, handler));
        id
    }

    /// The handler that currently receives input.
    pub fn top(&self) -> Option<&H> {
        self.entries.last().map(|(_, h)| h)
    }

    /// Deactivates a registration wherever it sits. Returns `false` if it was
    /// already gone.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        match self.entries.iter().position(|(i, _)| *i == id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.entries.iter().any(|(i, _)| *i == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lifecycle of a [`Dialog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogState {
    /// Built, not rendered yet.
    Pending,
    /// Rendered and owning its input handler.
    Active,
    /// Finished or dismissed; inert from now on.
    TornDown,
}

/// Result of a [`Dialog::advance`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum DialogStep<'a> {
    /// Display this line.
    Show(&'a Line),
    /// The dialog just tore itself down.
    Finished,
    /// Nothing happened.
    Inert,
}

/// Linear dialog sequencer.
#[derive(Debug)]
pub struct Dialog {
    lines: Vec<Line>,
    cursor: usize,
    state: DialogState,
    handler: Option<HandlerId>,
}

impl Dialog {
    pub fn new(lines: Vec<Line>) -> Self {
        Self {
            lines,
            cursor: 0,
            state: DialogState::Pending,
            handler: None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    /// Pushes the dialog's handler and shows the first line.
    ///
    /// Only a pending dialog renders; anything else is [`DialogStep::Inert`].
    pub fn render<H>(&mut self, stack: &mut HandlerStack<H>, handler: H) -> DialogStep<'_> {
        if self.state != DialogState::Pending {
            return DialogStep::Inert;
        }
        self.handler = Some(stack.push(handler));
        self.state = DialogState::Active;
        self.advance(stack)
    }

    /// Shows the next line, or tears down once every line has been shown.
    pub fn advance<H>(&mut self, stack: &mut HandlerStack<H>) -> DialogStep<'_> {
        if self.state != DialogState::Active {
            return DialogStep::Inert;
        }
        if self.cursor < self.lines.len() {
            let line = &self.lines[self.cursor];
            self.cursor += 1;
            return DialogStep::Show(line);
        }
        self.teardown(stack);
        DialogStep::Finished
    }

    /// Abandons the dialog from any point. Returns `true` if it was active.
    pub fn dismiss<H>(&mut self, stack: &mut HandlerStack<H>) -> bool {
        match self.state {
            DialogState::Active => {
                self.teardown(stack);
                true
            }
            DialogState::Pending => {
                self.state = DialogState::TornDown;
                false
            }
            DialogState::TornDown => false,
        }
    }

    fn teardown<H>(&mut self, stack: &mut HandlerStack<H>) {
        if let Some(id) = self.handler.take() {
            if !stack.remove(id) {
                tracing::warn!("dialog handler {:?} was already removed", id);
            }
        }
        self.state = DialogState::TornDown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum H {
        Movement,
        Dialog,
    }

    fn lines(n: usize) -> Vec<Line> {
        (0..n)
            .map(|i| Line::new(Side::Left, "ada", format!("line {}", i)))
            .collect()
    }

    fn stack() -> HandlerStack<H> {
        let mut s = HandlerStack::new();
        s.push(H::Movement);
        s
    }

    #[test]
    fn render_pushes_handler_and_shows_first_line() {
        let mut s = stack();
        let mut d = Dialog::new(lines(3));
        match d.render(&mut s, H::Dialog) {
            DialogStep::Show(line) => assert_eq!(line.text, "line 0"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(s.top(), Some(&H::Dialog));
        assert_eq!(d.cursor(), 1);
    }

    #[test]
    fn advancing_len_times_shows_every_line_then_tears_down() {
        let mut s = stack();
        let mut d = Dialog::new(lines(3));
        let mut shown = Vec::new();
        if let DialogStep::Show(l) = d.render(&mut s, H::Dialog) {
            shown.push(l.text.clone());
        }
        for _ in 1..3 {
            if let DialogStep::Show(l) = d.advance(&mut s) {
                shown.push(l.text.clone());
            }
        }
        assert_eq!(shown, vec!["line 0", "line 1", "line 2"]);
        assert_eq!(d.state(), DialogState::Active);
        assert_eq!(d.advance(&mut s), DialogStep::Finished);
        assert_eq!(d.state(), DialogState::TornDown);
        assert_eq!(s.top(), Some(&H::Movement));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn advance_after_teardown_is_noop() {
        let mut s = stack();
        let mut d = Dialog::new(lines(1));
        d.render(&mut s, H::Dialog);
        assert_eq!(d.advance(&mut s), DialogStep::Finished);
        assert_eq!(d.advance(&mut s), DialogStep::Inert);
        assert_eq!(d.advance(&mut s), DialogStep::Inert);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn torn_down_dialog_cannot_render_again() {
        let mut s = stack();
        let mut d = Dialog::new(lines(1));
        d.render(&mut s, H::Dialog);
        d.dismiss(&mut s);
        assert_eq!(d.render(&mut s, H::Dialog), DialogStep::Inert);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn empty_dialog_tears_down_on_render() {
        let mut s = stack();
        let mut d = Dialog::new(Vec::new());
        assert_eq!(d.render(&mut s, H::Dialog), DialogStep::Finished);
        assert_eq!(s.top(), Some(&H::Movement));
    }

    #[test]
    fn dismiss_pops_only_its_own_handler() {
        let mut s = stack();
        let mut d = Dialog::new(lines(2));
        d.render(&mut s, H::Dialog);
        let extra = s.push(H::Movement);
        assert!(d.dismiss(&mut s));
        assert!(!d.dismiss(&mut s));
        assert!(s.contains(extra));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn advance_before_render_is_inert() {
        let mut s = stack();
        let mut d = Dialog::new(lines(2));
        assert_eq!(d.advance(&mut s), DialogStep::Inert);
        assert_eq!(d.cursor(), 0);
    }

    #[test]
    fn removing_unknown_handler_returns_false() {
        let mut s: HandlerStack<H> = HandlerStack::new();
        let id = s.push(H::Movement);
        assert!(s.remove(id));
        assert!(!s.remove(id));
        assert!(s.is_empty());
    }
}
