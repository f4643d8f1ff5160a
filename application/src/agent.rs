//! Agent runtime.
//!
//! An [`Agent`] adapts a task prompt to one personality and provider and
//! always returns an [`AgentResponse`]: provider failures are folded into
//! a response whose content begins with `Error: ` so a single flaky
//! provider never aborts a round.

use crate::ports::llm::{CompletionOptions, CompletionResponse, LlmProvider, ProviderError};
use crate::ports::tool::{ToolDefinition, ToolOutcome};
use crate::prompts::DeliberationPrompts;
use conclave_domain::message::Message;
use conclave_domain::personality::Personality;
use conclave_domain::response::{AgentResponse, TokenUsage, VoteChoice};
use conclave_domain::tool::ToolSpec;
use conclave_domain::voting::parsing::{extract_json_object, parse_choice};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Cap on model/tool round-trips inside one `process` call
const MAX_TOOL_ITERATIONS: usize = 10;

/// Reply used when the tool loop hits the iteration cap
const MAX_ITERATIONS_REPLY: &str = "Maximum tool iterations reached";

/// Minimal schema descriptor for structured output.
///
/// No reflection and no registry: callers declare field names and type
/// hints, the agent concatenates them into the prompt and extracts the
/// JSON substring from the reply.
#[derive(Debug, Clone, Default)]
pub struct SchemaHint {
    fields: Vec<(String, String)>,
}

impl SchemaHint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, type_hint: impl Into<String>) -> Self {
        self.fields.push((name.into(), type_hint.into()));
        self
    }

    /// Render as the `{name: type}` hint appended to the task
    pub fn render(&self) -> String {
        let body = self
            .fields
            .iter()
            .map(|(name, ty)| format!("\"{}\": {}", name, ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{}}}", body)
    }
}

/// One deliberation participant: personality, provider, tools.
///
/// Immutable after construction and safely shared across concurrent
/// executions.
pub struct Agent {
    id: String,
    name: String,
    personality: Personality,
    provider: Arc<dyn LlmProvider>,
    tools: Vec<ToolDefinition>,
    default_options: CompletionOptions,
}

impl Agent {
    pub(crate) fn new(
        id: String,
        name: String,
        personality: Personality,
        provider: Arc<dyn LlmProvider>,
        tools: Vec<ToolDefinition>,
        default_options: CompletionOptions,
    ) -> Self {
        Self {
            id,
            name,
            personality,
            provider,
            tools,
            default_options,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// System prompt derived from the personality: seed prompt plus
    /// expertise, traits, and the style suffix.
    pub fn system_prompt(&self) -> String {
        let mut prompt = self.personality.system_prompt.clone();
        if let Some(expertise) = &self.personality.expertise {
            prompt.push_str(&format!("\n\nYour domain of expertise: {}.", expertise));
        }
        if !self.personality.traits.is_empty() {
            let traits = self
                .personality
                .traits
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            prompt.push_str(&format!("\n\nTraits: {}.", traits));
        }
        prompt.push_str("\n\n");
        prompt.push_str(self.personality.style.prompt_suffix());
        prompt
    }

    /// Completion options for one invocation: defaults with the derived
    /// system prompt, temperature falling back to creativity.
    fn completion_options(&self) -> CompletionOptions {
        let mut options = self.default_options.clone();
        if options.temperature.is_none() {
            options.temperature = Some(self.personality.creativity);
        }
        options.system_prompt = Some(self.system_prompt());
        options
    }

    /// Process a task, optionally with prepended context messages.
    pub async fn process(
        &self,
        task: &str,
        context: Option<&[Message]>,
        cancel: &CancellationToken,
    ) -> AgentResponse {
        let started = Instant::now();
        let mut messages: Vec<Message> = context.map(<[Message]>::to_vec).unwrap_or_default();
        messages.push(Message::user(task));

        let result = if self.tools.is_empty() {
            self.complete(&messages, cancel)
                .await
                .map(|r| (r.content, r.usage))
        } else {
            self.run_tool_loop(messages, cancel).await
        };

        match result {
            Ok((content, usage)) => {
                let mut response =
                    AgentResponse::new(&self.id, &self.name, content, started.elapsed());
                if let Some(usage) = usage {
                    response = response.with_usage(usage);
                }
                response
            }
            Err(e) => {
                warn!(agent = %self.id, error = %e, "agent invocation failed");
                AgentResponse::new(
                    &self.id,
                    &self.name,
                    format!("Error: {}", e),
                    started.elapsed(),
                )
            }
        }
    }

    /// Process a task requesting structured output.
    ///
    /// The schema hint is appended to the task; the reply is parsed
    /// best-effort from the first `{` to the last `}`. Parse failure is
    /// non-fatal: the text response is preserved and `structured` stays
    /// empty.
    pub async fn process_structured(
        &self,
        task: &str,
        schema: &SchemaHint,
        context: Option<&[Message]>,
        cancel: &CancellationToken,
    ) -> AgentResponse {
        let hinted_task = format!(
            "{}\n\nRespond with a JSON object matching: {}",
            task,
            schema.render()
        );
        let mut response = self.process(&hinted_task, context, cancel).await;
        let parsed = extract_json_object(&response.content)
            .and_then(|json| serde_json::from_str::<serde_json::Value>(json).ok());
        match parsed {
            Some(value) => response = response.with_structured(value),
            None => debug!(agent = %self.id, "structured output parse failed, keeping text"),
        }
        response
    }

    /// Vote over other agents' responses.
    ///
    /// The reply is scanned for the highest number in `1..=N`; when none
    /// appears, the vote falls through to the first candidate. The chosen
    /// agent id and the voter's reasoning are attached as structured
    /// output.
    pub async fn vote(
        &self,
        task: &str,
        others: &[AgentResponse],
        cancel: &CancellationToken,
    ) -> AgentResponse {
        let candidates: Vec<&AgentResponse> = others.iter().collect();
        let prompt = DeliberationPrompts::vote(task, &candidates);
        let mut response = self.process(&prompt, None, cancel).await;

        if others.is_empty() {
            return response;
        }
        let chosen_idx = parse_choice(&response.content, others.len()).unwrap_or(1) - 1;
        let choice = VoteChoice {
            chosen_agent_id: others[chosen_idx].agent_id.clone(),
            reasoning: response.content.clone(),
        };
        if let Ok(value) = serde_json::to_value(&choice) {
            response = response.with_structured(value);
        }
        response
    }

    /// One completion, racing the cancellation token.
    async fn complete(
        &self,
        messages: &[Message],
        cancel: &CancellationToken,
    ) -> Result<CompletionResponse, ProviderError> {
        let options = self.completion_options();
        tokio::select! {
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = self.provider.complete(messages, &options) => result,
        }
    }

    /// Bounded sequential tool loop.
    async fn run_tool_loop(
        &self,
        mut messages: Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<(String, Option<TokenUsage>), ProviderError> {
        let options = self.completion_options();
        let specs: Vec<ToolSpec> = self.tools.iter().map(|t| t.spec.clone()).collect();
        let mut total_usage: Option<TokenUsage> = None;

        for _ in 0..MAX_TOOL_ITERATIONS {
            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                result = self.provider.complete_with_tools(&messages, &specs, &options) => result?,
            };
            if let Some(usage) = response.usage {
                let acc = total_usage.get_or_insert_with(TokenUsage::default);
                acc.prompt_tokens += usage.prompt_tokens;
                acc.completion_tokens += usage.completion_tokens;
            }

            if response.tool_calls.is_empty() {
                return Ok((response.content, total_usage));
            }

            messages.push(
                Message::assistant(response.content.clone())
                    .with_tool_calls(response.tool_calls.clone()),
            );
            for call in &response.tool_calls {
                let outcome = match self.tools.iter().find(|t| t.name() == call.name) {
                    Some(ToolDefinition {
                        handler: Some(handler),
                        ..
                    }) => handler.invoke(&call.arguments, cancel).await,
                    Some(_) => ToolOutcome::failure(format!("tool {} has no handler", call.name)),
                    None => ToolOutcome::failure(format!("unknown tool: {}", call.name)),
                };
                debug!(agent = %self.id, tool = %call.name, success = outcome.success, "tool call");
                messages.push(Message::tool(call.id.clone(), outcome.into_message_text()));
            }
        }

        Ok((MAX_ITERATIONS_REPLY.to_string(), total_usage))
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tools", &self.tools.len())
            .finish()
    }
}
