//! Question answering: retrieval context plus a templated prompt sent to the LLM

use serde_json::Value;
use wws_core::{Error, GenerationConfig, LLMProvider, RAGEngine, RAGResult, Result, sku};

/// Answer to one question, with what was retrieved for it
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub retrieval: Option<RAGResult>,
}

impl Answer {
    /// Number of documents placed in the prompt
    pub fn documents_used(&self) -> usize {
        self.retrieval.as_ref().map_or(0, |r| r.documents.len())
    }
}

/// Render the prompt sent to the model
pub fn render_prompt(context: &str, question: &str) -> String {
    let context = if context.trim().is_empty() {
        "(no relevant documents found)"
    } else {
        context
    };

    format!(
        "You are an expert in answering questions about a Water Works Based Supply Chain Business\n\
        \n\
        Product reference (authoritative, overrides any conflicting document):\n\
        {}\n\
        \n\
        Here are some relevant documents:\n\
        {}\n\
        \n\
        Here is the question to answer: {}\n",
        sku::reference_table(),
        context,
        question.trim()
    )
}

/// Answers questions about the document set using an LLM and a RAG engine
pub struct Assistant<L: LLMProvider, R: RAGEngine> {
    llm: L,
    rag: R,
    generation: GenerationConfig,
}

impl<L: LLMProvider, R: RAGEngine> Assistant<L, R> {
    /// Create a new assistant using the LLM's own model id
    pub fn new(llm: L, rag: R) -> Self {
        let generation = GenerationConfig {
            model_id: llm.model_id().to_string(),
            ..Default::default()
        };
        Self {
            llm,
            rag,
            generation,
        }
    }

    /// Build the prompt with retrieval context when the RAG engine is ready
    pub async fn build_prompt(&self, question: &str) -> Result<(String, Option<RAGResult>)> {
        if !self.rag.is_ready() {
            tracing::warn!("RAG engine not ready, answering without documents");
            return Ok((render_prompt("", question), None));
        }

        let retrieval = self.rag.retrieve(question).await?;
        tracing::debug!(
            documents = retrieval.documents.len(),
            sku = ?retrieval.sku,
            "retrieved context"
        );
        Ok((render_prompt(&retrieval.context, question), Some(retrieval)))
    }

    /// Answer one question
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(Error::InvalidInput("question is empty".to_string()));
        }
        let (prompt, retrieval) = self.build_prompt(question).await?;
        let result = self.llm.generate_with_config(&prompt, &self.generation).await?;

        Ok(Answer {
            text: result.text,
            retrieval,
        })
    }

    /// Statistics from the RAG engine
    pub async fn stats(&self) -> Result<Value> {
        self.rag.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use wws_core::{
        GenerationResult, RetrievalBudget, SourceCategory, VectorDocument,
    };

    struct EchoLLM {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LLMProvider for EchoLLM {
        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
            self.generate_with_config(prompt, &GenerationConfig::default()).await
        }

        async fn generate_with_config(
            &self,
            prompt: &str,
            config: &GenerationConfig,
        ) -> Result<GenerationResult> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(GenerationResult {
                text: "HydroMax Ultra is the best rated.".to_string(),
                model_id: config.model_id.clone(),
                prompt_tokens: None,
                completion_tokens: None,
            })
        }

        fn model_id(&self) -> &str {
            "echo"
        }
    }

    struct FixedRAG {
        ready: bool,
    }

    #[async_trait]
    impl RAGEngine for FixedRAG {
        async fn initialize(&mut self) -> Result<()> {
            self.ready = true;
            Ok(())
        }

        async fn retrieve(&self, _question: &str) -> Result<RAGResult> {
            let documents = vec![VectorDocument {
                id: "review_0".to_string(),
                content: "HydroMax Ultra (SKU-3) - Strong pressure".to_string(),
                category: SourceCategory::Reviews,
                embedding: None,
                metadata: json!({}),
                score: Some(0.9),
            }];
            let context = self.build_context(&documents);
            Ok(RAGResult {
                documents,
                context,
                budget: RetrievalBudget::new(0, 0, 20),
                sku: None,
                supplementary_count: 0,
            })
        }

        fn build_context(&self, documents: &[VectorDocument]) -> String {
            documents
                .iter()
                .map(|d| d.content.clone())
                .collect::<Vec<_>>()
                .join("\n")
        }

        async fn stats(&self) -> Result<Value> {
            Ok(json!({"ready": self.ready}))
        }

        fn is_ready(&self) -> bool {
            self.ready
        }
    }

    fn llm() -> EchoLLM {
        EchoLLM {
            prompts: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_answer_uses_retrieved_context() {
        let assistant = Assistant::new(llm(), FixedRAG { ready: true });
        let answer = assistant.answer("Which product is best rated?").await.unwrap();

        assert_eq!(answer.text, "HydroMax Ultra is the best rated.");
        assert_eq!(answer.documents_used(), 1);

        let prompts = assistant.llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("HydroMax Ultra (SKU-3) - Strong pressure"));
        assert!(prompts[0].contains("Here is the question to answer: Which product is best rated?"));
    }

    #[tokio::test]
    async fn test_answer_without_ready_rag() {
        let assistant = Assistant::new(llm(), FixedRAG { ready: false });

        let answer = assistant.answer("Hi").await.unwrap();
        assert_eq!(answer.documents_used(), 0);
        let prompts = assistant.llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("(no relevant documents found)"));
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected() {
        let assistant = Assistant::new(llm(), FixedRAG { ready: true });
        let err = assistant.answer("   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(assistant.llm.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_generation_uses_llm_model() {
        let assistant = Assistant::new(llm(), FixedRAG { ready: true });
        assert_eq!(assistant.generation.model_id, "echo");
    }
}
