//! Retrieval-augmented FAQ assistant over a static ITR knowledge base

pub mod chunker;
pub mod index;
pub mod model;
pub mod prompt;

pub use chunker::split_into_chunks;
pub use index::{cosine_similarity, KnowledgeIndex};
pub use model::{LanguageModel, ModelError, OpenAiCompatibleModel};
pub use prompt::Exchange;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::constants::RETRIEVAL_TOP_K;

/// Answers questions from the knowledge base file
///
/// The index is built on the first question. Concurrent first callers wait
/// for a single build; a failed build leaves the cell empty so the next
/// question tries again.
pub struct Assistant {
    model: Arc<dyn LanguageModel>,
    knowledge_base_path: PathBuf,
    index: OnceCell<KnowledgeIndex>,
}

impl Assistant {
    pub fn new(model: Arc<dyn LanguageModel>, knowledge_base_path: impl Into<PathBuf>) -> Self {
        Self {
            model,
            knowledge_base_path: knowledge_base_path.into(),
            index: OnceCell::new(),
        }
    }

    async fn index(&self) -> Result<&KnowledgeIndex, ModelError> {
        self.index
            .get_or_try_init(|| async {
                tracing::info!(
                    "Building knowledge index from {}",
                    self.knowledge_base_path.display()
                );
                let text = tokio::fs::read_to_string(&self.knowledge_base_path).await?;
                KnowledgeIndex::build(&text, self.model.as_ref()).await
            })
            .await
    }

    /// Whether the index has been built yet
    pub fn is_ready(&self) -> bool {
        self.index.initialized()
    }

    pub async fn answer(&self, question: &str, history: &[Exchange]) -> Result<String, ModelError> {
        let index = self.index().await?;

        let top = index
            .retrieve(self.model.as_ref(), question, RETRIEVAL_TOP_K)
            .await?;
        let context = prompt::format_context(&top);
        let full_question = prompt::question_with_history(question, history);

        let answer = self
            .model
            .generate(&prompt::build_prompt(&context, &full_question))
            .await?;

        Ok(answer.trim().to_string())
    }
}
