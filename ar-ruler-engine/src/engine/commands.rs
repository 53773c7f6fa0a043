//! User commands serialised onto the frame loop.
//!
//! Input arrives from whatever thread the UI runs on. Commands are queued here
//! and drained by the session at a fixed point of each frame, so the graph is
//! only ever mutated by the frame loop.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::units::UnitSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureCommand {
    AddPoint,
    Undo,
    Finish,
    Clear,
    SetUnits(UnitSystem),
}

/// Cloneable, thread-safe handle onto a session's command queue.
#[derive(Debug, Clone, Default)]
pub struct CommandSender(Arc<Mutex<Vec<MeasureCommand>>>);

impl CommandSender {
    pub fn send(&self, command: MeasureCommand) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(command);
        }
    }

    pub fn pending(&self) -> usize {
        self.0.lock().map(|queue| queue.len()).unwrap_or(0)
    }

    pub(crate) fn drain(&self) -> Vec<MeasureCommand> {
        if let Ok(mut queue) = self.0.lock() {
            std::mem::take(&mut *queue)
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order_across_threads() {
        let sender = CommandSender::default();
        let remote = sender.clone();
        std::thread::spawn(move || {
            remote.send(MeasureCommand::AddPoint);
            remote.send(MeasureCommand::Undo);
        })
        .join()
        .unwrap();
        sender.send(MeasureCommand::Finish);

        assert_eq!(sender.pending(), 3);
        assert_eq!(
            sender.drain(),
            vec![
                MeasureCommand::AddPoint,
                MeasureCommand::Undo,
                MeasureCommand::Finish
            ]
        );
        assert_eq!(sender.pending(), 0);
    }
}
