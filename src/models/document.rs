use anyhow::Result;
use uuid::Uuid;

use crate::services::pdf;

/// An uploaded PDF together with the text pulled out of it. Lives only for
/// one session.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub bytes: Vec<u8>,
    pub text: String,
}

impl Document {
    pub fn new(filename: &str, bytes: Vec<u8>, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            bytes,
            text,
        }
    }

    pub async fn from_pdf(filename: &str, bytes: Vec<u8>) -> Result<Self> {
        let text = pdf::extract_text(&bytes).await?;
        Ok(Self::new(filename, bytes, text))
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
