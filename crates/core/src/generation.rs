//! Generation Boundary
//!
//! The opaque request/response call to a text-generation model. The controller
//! only depends on the [`GenerationClient`] trait; a single attempt is made per
//! turn and failures are surfaced to the caller unchanged.

use anyhow::{Context, Result, anyhow};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::debug;

use crate::curriculum::CurriculumModule;
use crate::learner::Profession;
use crate::message::{ConversationMessage, Speaker};
use crate::prompt::PromptTemplates;

/// Out-of-band context sent with every generation request.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub learner_name: String,
    pub profession: Profession,
    pub active_module: Option<&'static CurriculumModule>,
    /// True for the first turn of a module, when there is no user text.
    pub is_launch: bool,
}

/// A client that can produce the proctor's next reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generates the next reply.
    ///
    /// # Arguments
    ///
    /// * `history` - The conversation so far, oldest first, excluding `latest_input`.
    /// * `latest_input` - The learner's new text; empty on a launch turn.
    /// * `context` - Learner and module details for this turn.
    async fn generate(
        &self,
        history: &[ConversationMessage],
        latest_input: &str,
        context: &GenerationContext,
    ) -> Result<String>;
}

/// An implementation of `GenerationClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
    prompts: PromptTemplates,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions (e.g., "gpt-4o").
    /// * `prompts` - The proctor's instruction templates.
    pub fn new(config: OpenAIConfig, model: String, prompts: PromptTemplates) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            prompts,
        }
    }

    fn build_messages(
        &self,
        history: &[ConversationMessage],
        latest_input: &str,
        context: &GenerationContext,
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.system_prompt(context))
                .build()?
                .into(),
        ];
        for msg in history {
            match msg.speaker {
                Speaker::User => messages.push(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(msg.text())
                        .build()?
                        .into(),
                ),
                Speaker::Proctor => messages.push(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(msg.text())
                        .build()?
                        .into(),
                ),
            }
        }

        let final_text = if context.is_launch {
            self.prompts
                .launch_instruction(context)
                .context("A launch turn requires an active module")?
        } else {
            latest_input.to_string()
        };
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(final_text)
                .build()?
                .into(),
        );
        Ok(messages)
    }
}

#[async_trait]
impl GenerationClient for OpenAICompatibleClient {
    async fn generate(
        &self,
        history: &[ConversationMessage],
        latest_input: &str,
        context: &GenerationContext,
    ) -> Result<String> {
        let messages = self.build_messages(history, latest_input, context)?;
        debug!(
            model = %self.model,
            turns = messages.len(),
            is_launch = context.is_launch,
            "Requesting proctor reply"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.4)
            .build()?;

        let response: CreateChatCompletionResponse = self.client.chat().create(request).await?;
        response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .clone()
            .context("No content in LLM response")
    }
}

/// One request observed by a [`ScriptedGenerationClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub history_len: usize,
    pub latest_input: String,
    pub is_launch: bool,
    pub module_id: Option<u32>,
}

/// A `GenerationClient` that replays a fixed script of replies.
///
/// Each call pops the next entry; an `Err` entry simulates a provider
/// failure. Useful for integration tests and for running the service
/// without provider credentials.
#[derive(Default)]
pub struct ScriptedGenerationClient {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedGenerationClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::default(),
        }
    }

    /// Appends a reply to the script.
    pub async fn push_reply(&self, reply: impl Into<String>) {
        self.script.lock().await.push_back(Ok(reply.into()));
    }

    /// Appends a simulated failure to the script.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script.lock().await.push_back(Err(message.into()));
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedGenerationClient {
    async fn generate(
        &self,
        history: &[ConversationMessage],
        latest_input: &str,
        context: &GenerationContext,
    ) -> Result<String> {
        self.requests.lock().await.push(RecordedRequest {
            history_len: history.len(),
            latest_input: latest_input.to_string(),
            is_launch: context.is_launch,
            module_id: context.active_module.map(|m| m.id),
        });
        match self.script.lock().await.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("Generation script exhausted")),
        }
    }
}
