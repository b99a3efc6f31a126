//! Append-only transcripts.
//!
//! A transcript is the literal prompt history sent to the model: the system
//! turn first, then user/assistant turns in insertion order.

use parking_lot::Mutex;

use relay_domain::message::{Role, Turn};
use relay_domain::trace::TraceEvent;

/// An ordered, append-only list of turns for one session.
///
/// Each append is atomic, but nothing serializes whole request cycles:
/// two concurrent requests on the same session may interleave their
/// user/assistant pairs.
#[derive(Debug)]
pub struct Transcript {
    session_key: String,
    turns: Mutex<Vec<Turn>>,
}

impl Transcript {
    /// Create a transcript holding a single system turn.
    pub fn seeded(session_key: &str, instructions: &str) -> Self {
        Self {
            session_key: session_key.to_owned(),
            turns: Mutex::new(vec![Turn::system(instructions)]),
        }
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Append a turn at the end and return the new length.
    pub fn append(&self, role: Role, content: impl Into<String>) -> usize {
        let len = {
            let mut turns = self.turns.lock();
            turns.push(Turn::new(role, content));
            turns.len()
        };

        TraceEvent::TranscriptAppend {
            session_key: self.session_key.clone(),
            role: role.as_str().to_owned(),
            turns: len,
        }
        .emit();

        len
    }

    /// Copy of all turns, in order.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.turns.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_transcript_has_one_system_turn() {
        let t = Transcript::seeded("s1", "be nice");
        let turns = t.snapshot();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[0].content, "be nice");
    }

    #[test]
    fn user_then_assistant_appends_in_order() {
        let t = Transcript::seeded("s1", "sys");
        t.append(Role::User, "hi");
        t.append(Role::Assistant, "hello");
        let n = t.len();

        t.append(Role::User, "how are you?");
        let len = t.append(Role::Assistant, "fine");
        assert_eq!(len, n + 2);

        let turns = t.snapshot();
        assert_eq!(turns[n].role, Role::User);
        assert_eq!(turns[n].content, "how are you?");
        assert_eq!(turns[n + 1].role, Role::Assistant);
        assert_eq!(turns[n + 1].content, "fine");
        // System turn stays first.
        assert_eq!(turns[0].role, Role::System);
    }

    #[test]
    fn empty_content_is_accepted() {
        let t = Transcript::seeded("s1", "sys");
        t.append(Role::Assistant, "");
        assert_eq!(t.snapshot()[1].content, "");
    }
}
