use common::Notification;
use dialog::{Dialog, DialogState, DialogStep};

use crate::session::{GameSession, Handler};

impl GameSession {
    /// Starts the dialog script `script`. Returns `false` if it is unknown.
    pub fn start_dialog(&mut self, script: &str) -> bool {
        let Some(lines) = self.scripts.get(script) else {
            tracing::warn!("unknown dialog script `{}`", script);
            return false;
        };
        tracing::debug!("starting dialog `{}` ({} lines)", script, lines.len());
        let dialog = Dialog::new(lines.to_vec());
        self.play_dialog(dialog);
        true
    }

    /// Renders `dialog`, dismissing whichever one was active.
    pub fn play_dialog(&mut self, mut dialog: Dialog) {
        self.dismiss_dialog();
        let note = line_note(dialog.render(&mut self.handlers, Handler::Dialog));
        self.outbox.extend(note);
        if dialog.state() == DialogState::Active {
            self.dialog = Some(dialog);
        }
    }

    pub(crate) fn advance_dialog(&mut self) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };
        let note = line_note(dialog.advance(&mut self.handlers));
        if dialog.state() == DialogState::TornDown {
            self.dialog = None;
        }
        self.outbox.extend(note);
    }

    /// Abandons the active dialog. Returns `true` if one was showing.
    pub(crate) fn dismiss_dialog(&mut self) -> bool {
        let Some(mut dialog) = self.dialog.take() else {
            return false;
        };
        let closed = dialog.dismiss(&mut self.handlers);
        if closed {
            self.outbox.push(Notification::DialogClosed);
        }
        closed
    }
}

fn line_note(step: DialogStep<'_>) -> Option<Notification> {
    match step {
        DialogStep::Show(line) => Some(Notification::DialogLine {
            side: line.side,
            speaker: line.speaker.clone(),
            text: line.text.clone(),
        }),
        DialogStep::Finished => Some(Notification::DialogClosed),
        DialogStep::Inert => None,
    }
}
