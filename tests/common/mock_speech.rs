//! Mock speech output for testing
//!
//! Records all spoken text for verification.

use async_trait::async_trait;
use kodilink::intents::SpeechOut;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MockSpeech {
    spoken: Mutex<Vec<String>>,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn was_spoken(&self, text: &str) -> bool {
        self.spoken.lock().unwrap().iter().any(|s| s.contains(text))
    }
}

#[async_trait]
impl SpeechOut for MockSpeech {
    async fn say(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}
