//! Turn engine — the reason / act / observe loop.
//!
//! Each turn sends the whole conversation to the model, reads the reply,
//! and either runs the requested tool and feeds its result back as an
//! `Observation:`, or finishes with an answer. The [`LoopGuard`] keeps the
//! loop finite: repeated actions short-circuit to a cached answer, two
//! unreadable replies in a row end the run, and the turn budget is hard.
//!
//! Every run emits exactly one terminal event (`answer` or `error`) and
//! nothing after it.

use std::sync::Arc;
use stepwise_config::AppConfig;
use stepwise_core::message::{Conversation, Message};
use stepwise_core::provider::{Provider, ProviderRequest};
use stepwise_core::tool::ToolRegistry;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::guard::LoopGuard;
use crate::parser::{Action, OBSERVATION_MARKER, ParsedReply, final_answer, parse_reply};
use crate::prompt::system_prompt;
use crate::stream_event::AgentEvent;

const OBSERVED_PREVIEW_CHARS: usize = 200;

/// Drives one conversation per run. Cheap to clone; clones share the
/// provider, registry and prompt.
#[derive(Clone)]
pub struct TurnEngine {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_turns: u32,
    force_stop_tools: Arc<[String]>,
    system_prompt: Arc<str>,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub events: Vec<AgentEvent>,
    pub conversation: Conversation,
    /// Model calls made.
    pub turns: u32,
}

impl RunOutcome {
    /// The terminal event, if the run got that far.
    pub fn terminal(&self) -> Option<&AgentEvent> {
        self.events.last().filter(|e| e.is_terminal())
    }

    pub fn answer(&self) -> Option<&str> {
        match self.terminal() {
            Some(AgentEvent::Answer { content }) => Some(content),
            _ => None,
        }
    }
}

enum Step {
    Continue,
    Done(AgentEvent),
    /// The event consumer went away.
    Cancelled,
}

enum Sink {
    Channel(mpsc::Sender<AgentEvent>),
    Buffer(Vec<AgentEvent>),
}

impl Sink {
    /// Returns `false` once nobody is listening.
    async fn emit(&mut self, event: AgentEvent) -> bool {
        match self {
            Self::Channel(tx) => tx.send(event).await.is_ok(),
            Self::Buffer(events) => {
                events.push(event);
                true
            }
        }
    }
}

macro_rules! emit_or_cancel {
    ($sink:expr, $event:expr) => {
        if !$sink.emit($event).await {
            return Step::Cancelled;
        }
    };
}

impl TurnEngine {
    /// Create an engine with default settings: temperature 0, five turns,
    /// `web_search` and `get_weather` answering immediately on success.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
    ) -> Self {
        let prompt = system_prompt(&tools.definitions());
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            max_turns: 5,
            force_stop_tools: Arc::from(vec!["web_search".to_string(), "get_weather".to_string()]),
            system_prompt: Arc::from(prompt),
        }
    }

    /// Create an engine configured from `[agent]` and `[provider].model`.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        config: &AppConfig,
    ) -> Self {
        let agent = &config.agent;
        let mut engine = Self::new(provider, tools, &config.provider.model)
            .with_temperature(agent.temperature)
            .with_max_turns(agent.max_turns)
            .with_force_stop_tools(agent.force_stop_tools.clone());
        if let Some(max) = agent.max_tokens {
            engine = engine.with_max_tokens(max);
        }
        if let Some(prompt) = &agent.system_prompt_override {
            engine = engine.with_system_prompt(prompt.clone());
        }
        engine
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.max_turns = max;
        self
    }

    /// Tools whose first successful result is returned as the answer.
    pub fn with_force_stop_tools(mut self, tools: Vec<String>) -> Self {
        self.force_stop_tools = Arc::from(tools);
        self
    }

    /// Replace the generated system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Arc::from(prompt.into());
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Run a query, streaming events as they happen.
    ///
    /// The run happens on its own task. Dropping the receiver stops it at
    /// the next event.
    pub fn run_stream(&self, user_message: &str) -> mpsc::Receiver<AgentEvent> {
        let (tx, rx) = mpsc::channel::<AgentEvent>(128);
        let engine = self.clone();
        let user_message = user_message.to_string();

        tokio::spawn(async move {
            let mut sink = Sink::Channel(tx);
            engine.drive(&user_message, &mut sink).await;
        });

        rx
    }

    /// Run a query to completion and collect everything it produced.
    pub async fn run(&self, user_message: &str) -> RunOutcome {
        let mut sink = Sink::Buffer(Vec::new());
        let (conversation, turns) = self.drive(user_message, &mut sink).await;
        let events = match sink {
            Sink::Buffer(events) => events,
            Sink::Channel(_) => Vec::new(),
        };
        RunOutcome {
            events,
            conversation,
            turns,
        }
    }

    /// Owns the single terminal emission of a run.
    async fn drive(&self, user_message: &str, sink: &mut Sink) -> (Conversation, u32) {
        let mut conversation = Conversation::new();
        conversation.push(Message::system(self.system_prompt.as_ref()));
        conversation.push(Message::user(user_message));
        let mut guard = LoopGuard::new(self.max_turns);

        info!(conversation = %conversation.id, model = %self.model, "Run started");

        if !sink.emit(AgentEvent::thought("Thinking...")).await {
            return (conversation, guard.turns());
        }

        let terminal = loop {
            match self.turn(&mut conversation, &mut guard, sink).await {
                Step::Continue => continue,
                Step::Done(event) => break Some(event),
                Step::Cancelled => break None,
            }
        };

        match terminal {
            Some(event) => {
                info!(
                    conversation = %conversation.id,
                    outcome = event.event_type(),
                    turns = guard.turns(),
                    "Run finished"
                );
                sink.emit(event).await;
            }
            None => {
                info!(conversation = %conversation.id, turns = guard.turns(), "Run cancelled");
            }
        }

        (conversation, guard.turns())
    }

    async fn turn(
        &self,
        conversation: &mut Conversation,
        guard: &mut LoopGuard,
        sink: &mut Sink,
    ) -> Step {
        if !guard.increment_turn() {
            warn!(conversation = %conversation.id, max_turns = self.max_turns, "Turn budget exhausted");
            return Step::Done(AgentEvent::error("Max turns reached without final answer."));
        }
        debug!(conversation = %conversation.id, turn = guard.turns(), "Calling model");

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: conversation.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: vec![OBSERVATION_MARKER.to_string()],
        };

        let reply = match self.provider.complete(request).await {
            Ok(response) => response.message.content,
            Err(e) => {
                warn!(conversation = %conversation.id, error = %e, "Model call failed");
                return Step::Done(AgentEvent::error(format!("Model error: {e}")));
            }
        };
        conversation.push(Message::assistant(reply.as_str()));

        match parse_reply(&reply) {
            ParsedReply::NoAction => Step::Done(AgentEvent::answer(final_answer(&reply))),
            ParsedReply::ToolRequest(action) => {
                guard.reset_failures();
                self.act(action, conversation, guard, sink).await
            }
            ParsedReply::ParseFailure(reason) => {
                let failures = guard.record_failure();
                warn!(conversation = %conversation.id, %reason, failures, "Unreadable action");
                if failures >= 2 {
                    return Step::Done(AgentEvent::error("Multiple parsing failures. Stopping."));
                }
                conversation.push(Message::user(format!(
                    "{OBSERVATION_MARKER} Error parsing action format. Please provide your Answer directly."
                )));
                emit_or_cancel!(sink, AgentEvent::thought("Error parsing action, retrying..."));
                Step::Continue
            }
        }
    }

    async fn act(
        &self,
        action: Action,
        conversation: &mut Conversation,
        guard: &mut LoopGuard,
        sink: &mut Sink,
    ) -> Step {
        let key = action.key();

        if guard.should_stop(&key).is_some() {
            debug!(conversation = %conversation.id, tool = %action.name, "Repeated action");
            let cached = guard.cached_answer(&key).unwrap_or_default();
            emit_or_cancel!(
                sink,
                AgentEvent::thought("Duplicate tool call detected. Using cached result to answer.")
            );
            return Step::Done(AgentEvent::answer(cached));
        }

        emit_or_cancel!(sink, AgentEvent::tool(format!("Running {}...", action.name)));
        let result = self.tools.invoke(&action.name, action.params_value()).await;

        if !result.success {
            warn!(conversation = %conversation.id, tool = %action.name, output = %result.output, "Tool failed");
        } else if self.force_stop_tools.iter().any(|t| *t == action.name) {
            emit_or_cancel!(sink, AgentEvent::thought("Got result. Answering immediately."));
            return Step::Done(AgentEvent::answer(result.output));
        }

        guard.record(key, &result.output);
        let observation = guard.annotate_if_seen(&result.output);
        let preview: String = observation.chars().take(OBSERVED_PREVIEW_CHARS).collect();
        conversation.push(Message::user(format!("{OBSERVATION_MARKER} {observation}")));
        emit_or_cancel!(sink, AgentEvent::thought(format!("Observed: {preview}...")));
        Step::Continue
    }
}

/// Build an engine with the configured provider and built-in tools.
pub fn build_engine(config: &AppConfig) -> stepwise_core::Result<TurnEngine> {
    let provider = stepwise_providers::build_from_config(&config.provider)?;
    let tools = Arc::new(stepwise_tools::registry_from_config(&config.tools));
    Ok(TurnEngine::from_config(provider, tools, config))
}
