//! The turn engine — the heart of Stepwise.
//!
//! The engine follows a **Thought → Action → Observation** cycle:
//!
//! 1. **Send** the conversation (system prompt + user question + prior
//!    turns) to the model
//! 2. **Parse** the reply: a tool request (`Action: {...} PAUSE`) or an
//!    answer
//! 3. **If a tool was requested**: run it, append `Observation: <result>`,
//!    loop back to step 1
//! 4. **Otherwise**: emit the answer
//!
//! Progress is reported as a stream of [`AgentEvent`]s. The loop ends on
//! an answer, a repeated action, a successful information lookup, two
//! unreadable replies in a row, or the turn budget.

pub mod engine;
pub mod guard;
pub mod parser;
pub mod prompt;
pub mod stream_event;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use engine::{RunOutcome, TurnEngine, build_engine};
pub use guard::LoopGuard;
pub use parser::{Action, ParsedReply, final_answer, parse_reply};
pub use prompt::system_prompt;
pub use stream_event::AgentEvent;
