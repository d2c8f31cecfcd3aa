//! End-to-end tests for the answer synthesizer with a scripted generator.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pdfchat_rag::{
    AnswerSynthesizer, Chunk, Chunker, ContextFormat, EmbeddingProvider, Generator,
    HashingEmbeddingProvider, PromptTemplate, RagConfig, RagError, RetrievalIndex, SourceDocument,
    TextChunker,
};

/// Replays scripted replies and records every prompt it receives.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<pdfchat_rag::Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<pdfchat_rag::Result<String>>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into()), prompts: Mutex::new(Vec::new()) })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> pdfchat_rag::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Ok("default reply".to_string()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Fails with a non-generation error to check wrapping.
struct BrokenGenerator;

#[async_trait]
impl Generator for BrokenGenerator {
    async fn generate(&self, _prompt: &str) -> pdfchat_rag::Result<String> {
        Err(RagError::ConfigError("missing credentials".to_string()))
    }
}

const CV_PAGES: [&str; 3] = [
    "Maria Virtanen. Work experience: office cleaning at Siisti Oy from 2019 to 2021.",
    "Contact details: phone number +358 40 123 4567 and email maria@example.com.",
    "Languages: Finnish native, English fluent. Hobbies: hiking and baking.",
];

async fn cv_index() -> Arc<RetrievalIndex> {
    let documents: Vec<SourceDocument> = CV_PAGES
        .iter()
        .enumerate()
        .map(|(i, text)| SourceDocument::new("cv.pdf", i as u32 + 1, *text))
        .collect();
    let chunks = TextChunker::new(500, 50).unwrap().chunk_all(&documents);
    Arc::new(
        RetrievalIndex::build(chunks, Arc::new(HashingEmbeddingProvider::default())).await.unwrap(),
    )
}

fn synthesizer(index: Arc<RetrievalIndex>, generator: Arc<dyn Generator>) -> AnswerSynthesizer {
    AnswerSynthesizer::builder().index(index).generator(generator).build().unwrap()
}

#[tokio::test]
async fn answer_is_returned_verbatim_with_sources() {
    let reply = "  The phone number is +358 40 123 4567.\n";
    let generator = ScriptedGenerator::new(vec![Ok(reply.to_string())]);
    let synthesizer = synthesizer(cv_index().await, generator.clone());

    let answer =
        synthesizer.answer("What is the phone number in the contact details?").await.unwrap();

    assert_eq!(answer.text, reply);
    assert_eq!(answer.sources.len(), 3);
    assert_eq!(answer.sources[0].chunk.page, 2);
    for pair in answer.sources.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let prompts = generator.prompts();
    assert_eq!(prompts, vec![answer.prompt.clone()]);
    assert!(answer.prompt.contains("+358 40 123 4567"));
    assert!(answer.prompt.contains("What is the phone number in the contact details?"));
}

#[tokio::test]
async fn context_joins_chunks_in_score_order() {
    let generator = ScriptedGenerator::new(Vec::new());
    let synthesizer = AnswerSynthesizer::builder()
        .config(RagConfig::builder().top_k(2).build().unwrap())
        .index(cv_index().await)
        .generator(generator.clone())
        .template(PromptTemplate::new("{context}|{question}").unwrap())
        .build()
        .unwrap();

    let answer = synthesizer.answer("phone number contact details").await.unwrap();

    assert_eq!(answer.sources.len(), 2);
    let expected = format!(
        "{}\n\n{}|phone number contact details",
        answer.sources[0].chunk.text, answer.sources[1].chunk.text
    );
    assert_eq!(answer.prompt, expected);
}

#[tokio::test]
async fn attribution_labels_each_chunk() {
    let synthesizer = AnswerSynthesizer::builder()
        .config(RagConfig::builder().top_k(1).build().unwrap())
        .index(cv_index().await)
        .generator(ScriptedGenerator::new(Vec::new()))
        .template(PromptTemplate::new("{context}|{question}").unwrap())
        .context_format(ContextFormat::with_attribution(true))
        .build()
        .unwrap();

    let answer = synthesizer.answer("hobbies hiking baking").await.unwrap();
    assert!(answer.prompt.starts_with("[cv.pdf p.3]\n"), "prompt was {:?}", answer.prompt);
}

#[tokio::test]
async fn generation_failure_does_not_poison_later_questions() {
    let generator = ScriptedGenerator::new(vec![
        Err(RagError::GenerationError {
            provider: "scripted".into(),
            message: "request timed out after 60s".into(),
        }),
        Ok("Finnish and English.".to_string()),
    ]);
    let synthesizer = synthesizer(cv_index().await, generator.clone());

    let err = synthesizer.answer("Which languages?").await.unwrap_err();
    assert!(matches!(
        err,
        RagError::GenerationError { ref message, .. } if message.contains("timed out")
    ));
    assert!(err.is_per_request());

    let answer = synthesizer.answer("Which languages?").await.unwrap();
    assert_eq!(answer.text, "Finnish and English.");
    assert_eq!(generator.prompts().len(), 2);
}

#[tokio::test]
async fn other_generator_errors_become_generation_errors() {
    let synthesizer = synthesizer(cv_index().await, Arc::new(BrokenGenerator));
    let err = synthesizer.answer("anything").await.unwrap_err();
    assert!(matches!(
        err,
        RagError::GenerationError { ref provider, ref message }
            if provider == "custom" && message.contains("missing credentials")
    ));
}

#[tokio::test]
async fn empty_index_still_asks_the_generator() {
    let index = Arc::new(
        RetrievalIndex::build(Vec::new(), Arc::new(HashingEmbeddingProvider::default()))
            .await
            .unwrap(),
    );
    let generator = ScriptedGenerator::new(vec![Ok("No relevant information found.".into())]);
    let synthesizer = AnswerSynthesizer::builder()
        .index(index)
        .generator(generator.clone())
        .template(PromptTemplate::new("[{context}] {question}").unwrap())
        .build()
        .unwrap();

    let answer = synthesizer.answer("What is the phone number?").await.unwrap();
    assert!(answer.sources.is_empty());
    assert_eq!(answer.prompt, "[] What is the phone number?");
    assert_eq!(answer.text, "No relevant information found.");
}

#[tokio::test]
async fn blank_question_is_rejected_before_generation() {
    let generator = ScriptedGenerator::new(Vec::new());
    let synthesizer = synthesizer(cv_index().await, generator.clone());

    for question in ["", "   ", "\n\t"] {
        assert!(matches!(synthesizer.answer(question).await, Err(RagError::InvalidQuery(_))));
    }
    assert!(generator.prompts().is_empty());
}

#[tokio::test]
async fn threshold_drops_weak_matches() {
    let synthesizer = AnswerSynthesizer::builder()
        .config(RagConfig::builder().top_k(3).similarity_threshold(0.99).build().unwrap())
        .index(cv_index().await)
        .generator(ScriptedGenerator::new(Vec::new()))
        .build()
        .unwrap();

    let exact = synthesizer.retrieve(CV_PAGES[1]).await.unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].chunk.page, 2);

    let unrelated = synthesizer.retrieve("quantum chromodynamics lecture").await.unwrap();
    assert!(unrelated.is_empty());
}

#[tokio::test]
async fn synthesizer_answers_concurrently() {
    let synthesizer = Arc::new(synthesizer(cv_index().await, ScriptedGenerator::new(Vec::new())));

    let handles: Vec<_> = ["phone number", "languages", "work experience"]
        .into_iter()
        .map(|q| {
            let synthesizer = Arc::clone(&synthesizer);
            tokio::spawn(async move { synthesizer.answer(q).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().text, "default reply");
    }
}

#[tokio::test]
async fn builder_requires_index_and_generator() {
    let missing_index =
        AnswerSynthesizer::builder().generator(ScriptedGenerator::new(Vec::new())).build();
    assert!(matches!(missing_index, Err(RagError::ConfigError(msg)) if msg.contains("index")));

    let missing_generator = AnswerSynthesizer::builder().index(cv_index().await).build();
    assert!(
        matches!(missing_generator, Err(RagError::ConfigError(msg)) if msg.contains("generator"))
    );
}

#[tokio::test]
async fn builder_rejects_invalid_config() {
    let config = RagConfig { top_k: 0, ..RagConfig::default() };
    let result = AnswerSynthesizer::builder()
        .config(config)
        .index(cv_index().await)
        .generator(ScriptedGenerator::new(Vec::new()))
        .build();
    assert!(matches!(result, Err(RagError::ConfigError(_))));
}

/// Points every chunk away from every question, so all scores are negative.
struct OpposedEmbedder;

#[async_trait]
impl EmbeddingProvider for OpposedEmbedder {
    async fn embed(&self, text: &str) -> pdfchat_rag::Result<Vec<f32>> {
        Ok(if text.starts_with("bravo") { vec![1.0, 0.2] } else { vec![-1.0, 0.5] })
    }

    fn dimensions(&self) -> usize {
        2
    }
}

#[tokio::test]
async fn default_config_keeps_top_k_even_with_negative_scores() {
    let chunks = (0..3)
        .map(|i| Chunk {
            id: format!("notes.pdf#p1_{i}"),
            document_id: "notes.pdf#p1".into(),
            source: "notes.pdf".into(),
            page: 1,
            ordinal: i,
            text: format!("bravo section {i}"),
            char_start: 0,
            char_end: 15,
        })
        .collect();
    let index = Arc::new(RetrievalIndex::build(chunks, Arc::new(OpposedEmbedder)).await.unwrap());
    let generator = ScriptedGenerator::new(Vec::new());
    let synthesizer = synthesizer(index, generator.clone());

    let answer = synthesizer.answer("salary").await.unwrap();

    assert_eq!(answer.sources.len(), 3);
    assert!(answer.sources.iter().all(|r| r.score < 0.0));
    assert!(generator.prompts()[0].contains("bravo section 0"));
}
