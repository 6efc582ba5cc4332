// src/extraction/testing.rs
//! Scripted stand-in for the hosted model, used by unit and route tests

use crate::core::TextGenerator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Replays canned responses in order. `Err` entries become transport failures.
pub(crate) struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    max_tokens: Mutex<Vec<u32>>,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedGenerator {
    pub(crate) fn new<'a>(responses: impl IntoIterator<Item = Result<&'a str, &'a str>>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
            max_tokens: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.call_times.lock().unwrap().len()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn max_tokens_seen(&self) -> Vec<u32> {
        self.max_tokens.lock().unwrap().clone()
    }

    /// Time between consecutive calls.
    pub(crate) fn gaps(&self) -> Vec<Duration> {
        self.call_times
            .lock()
            .unwrap()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn infer(&self, prompt: &str, max_output_tokens: u32) -> anyhow::Result<String> {
        self.call_times.lock().unwrap().push(Instant::now());
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.max_tokens.lock().unwrap().push(max_output_tokens);

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("scripted responses exhausted")),
        }
    }
}
