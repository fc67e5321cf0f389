use super::knowledge_base::{KnowledgeBase, KnowledgeBaseStats, ScoredDocument};
use super::overrides::OverrideTable;
use super::{AnswerResponse, Link};
use crate::answer::{extractor_from_config, AnswerExtractor, ExtractedAnswer};
use crate::config::{Config, RetrievalConfig};
use crate::corpus::DocumentLoader;
use crate::embedding::{EmbeddingProvider, FastEmbedProvider, SearchResult};
use crate::error::{Result, TaError};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell, Semaphore};
use tracing::{debug, info, warn};

type KnowledgeCell = OnceCell<Arc<KnowledgeBase>>;

#[derive(Debug, Clone, Copy)]
struct StageBudgets {
    build: Duration,
    embed: Duration,
    extract: Duration,
}

/// Answers questions over the course and forum corpus.
///
/// The knowledge base is built on first use. Concurrent first callers share a
/// single build, which runs in its own task and keeps going when the caller
/// that started it gives up. [`rebuild`](Self::rebuild) swaps in a fresh one
/// while queries already running keep the old one.
pub struct QaEngine {
    core: Arc<EngineCore>,
}

/// State shared between callers and background builds
struct EngineCore {
    loader: DocumentLoader,
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: Arc<dyn AnswerExtractor>,
    overrides: OverrideTable,
    retrieval: RetrievalConfig,
    embed_batch_size: usize,
    budgets: StageBudgets,
    inference: Arc<Semaphore>,
    knowledge: RwLock<Arc<KnowledgeCell>>,
    rebuilding: Mutex<()>,
}

impl QaEngine {
    pub fn new(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        extractor: Arc<dyn AnswerExtractor>,
    ) -> Self {
        let core = EngineCore {
            loader: DocumentLoader::from_config(&config.data),
            embedder,
            extractor,
            overrides: OverrideTable::from_config(&config.overrides),
            retrieval: config.retrieval.clone(),
            embed_batch_size: config.embedding.batch_size.max(1),
            budgets: StageBudgets {
                build: Duration::from_secs(config.timeouts.build_secs),
                embed: Duration::from_secs(config.timeouts.embed_secs),
                extract: Duration::from_secs(config.timeouts.extract_secs),
            },
            inference: Arc::new(Semaphore::new(
                config.retrieval.max_concurrent_inference.max(1),
            )),
            knowledge: RwLock::new(Arc::new(OnceCell::new())),
            rebuilding: Mutex::new(()),
        };
        Self {
            core: Arc::new(core),
        }
    }

    /// Initialize the configured embedding model and extractor.
    ///
    /// Blocks while models load (and download on first use).
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = FastEmbedProvider::new(&config.embedding.model)
            .map_err(|e| TaError::ModelUnavailable(e.to_string()))?
            .with_batch_size(config.embedding.batch_size);
        let extractor = extractor_from_config(&config.extractor)
            .map_err(|e| TaError::ModelUnavailable(e.to_string()))?;

        info!(
            "QA engine ready (embedding: {}, extractor: {})",
            embedder.model_name(),
            extractor.name()
        );

        Ok(Self::new(config, Arc::new(embedder), extractor))
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.core.overrides
    }

    /// Answer a question
    pub async fn answer(&self, question: &str) -> Result<AnswerResponse> {
        if question.trim().is_empty() {
            return Err(TaError::InvalidQuestion(
                "question must not be empty".to_string(),
            ));
        }

        if let Some((rule, response)) = self.core.overrides.check(question) {
            info!("Override '{}' answered question", rule);
            return Ok(response);
        }

        let start = Instant::now();
        let kb = self.knowledge_base().await?;
        let retrieval = &self.core.retrieval;

        let query = self.core.embed_query(question).await?;
        let hits = kb.search(&query, retrieval.top_k)?;
        debug!("Retrieved {} documents", hits.len());

        let (context, mut links) = assemble_context(
            &kb,
            &hits,
            retrieval.context_docs,
            &retrieval.context_separator,
        );

        let extracted = if context.trim().is_empty() {
            ExtractedAnswer::empty()
        } else {
            self.core.extract(question, context).await?
        };
        debug!("Extracted answer with confidence {:.3}", extracted.confidence);

        links.truncate(retrieval.max_links);

        info!(
            "Answered question in {}ms ({} links)",
            start.elapsed().as_millis(),
            links.len()
        );

        Ok(AnswerResponse {
            answer: extracted.text.trim().to_string(),
            links,
        })
    }

    /// Build the knowledge base now instead of on the first question
    pub async fn warm_up(&self) -> Result<Arc<KnowledgeBase>> {
        self.knowledge_base().await
    }

    /// Rebuild from the sources and swap the result in.
    ///
    /// Queries that already hold the previous knowledge base finish on it.
    /// Rebuilds run one after another. Before the first build has finished,
    /// a rebuild joins that build instead of starting another.
    pub async fn rebuild(&self) -> Result<Arc<KnowledgeBase>> {
        let _rebuilding = self.core.rebuilding.lock().await;

        if !self.core.current_cell().initialized() {
            debug!("No knowledge base yet, joining the first build");
            return self.knowledge_base().await;
        }

        let kb = self.core.build_knowledge_base().await?;
        let cell = Arc::new(OnceCell::new_with(Some(Arc::clone(&kb))));
        *self
            .core
            .knowledge
            .write()
            .unwrap_or_else(PoisonError::into_inner) = cell;

        info!(
            "Knowledge base replaced (fingerprint {})",
            kb.stats().fingerprint
        );
        Ok(kb)
    }

    /// Nearest documents to `query`, best first
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        if query.trim().is_empty() {
            return Err(TaError::InvalidQuestion(
                "query must not be empty".to_string(),
            ));
        }

        let kb = self.knowledge_base().await?;
        let embedding = self.core.embed_query(query).await?;
        Ok(kb.search_documents(&embedding, k)?)
    }

    /// Statistics of the current knowledge base, if one has been built
    pub fn stats(&self) -> Option<KnowledgeBaseStats> {
        self.core.current_cell().get().map(|kb| kb.stats().clone())
    }

    pub fn is_built(&self) -> bool {
        self.core.current_cell().initialized()
    }

    /// Current knowledge base, building it first if needed
    async fn knowledge_base(&self) -> Result<Arc<KnowledgeBase>> {
        let cell = self.core.current_cell();
        if let Some(kb) = cell.get() {
            return Ok(Arc::clone(kb));
        }

        // Dropping the handle detaches the task; the build itself carries on
        let core = Arc::clone(&self.core);
        tokio::spawn(async move {
            cell.get_or_try_init(|| core.build_knowledge_base())
                .await
                .map(Arc::clone)
        })
        .await?
    }
}

impl EngineCore {
    fn current_cell(&self) -> Arc<KnowledgeCell> {
        Arc::clone(
            &self
                .knowledge
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    async fn build_knowledge_base(&self) -> Result<Arc<KnowledgeBase>> {
        let budget = self.budgets.build;
        match tokio::time::timeout(budget, self.load_and_index()).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Knowledge base build exceeded {}s", budget.as_secs());
                Err(TaError::Timeout {
                    stage: "index build",
                    after: budget,
                })
            }
        }
    }

    async fn load_and_index(&self) -> Result<Arc<KnowledgeBase>> {
        let start = Instant::now();
        info!("Building knowledge base");

        let loader = self.loader.clone();
        let corpus = tokio::task::spawn_blocking(move || loader.load()).await?;

        let mut embeddings = Vec::with_capacity(corpus.documents.len());
        for (batch_number, batch) in corpus.documents.chunks(self.embed_batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|d| d.content.clone()).collect();
            let embedder = Arc::clone(&self.embedder);
            let rows = self
                .run_inference("document embedding", self.budgets.embed, move || {
                    embedder.embed_batch(&texts)
                })
                .await?;
            debug!("Embedded batch {} ({} documents)", batch_number, rows.len());
            embeddings.extend(rows);
        }

        let kb = KnowledgeBase::new(
            corpus.documents,
            embeddings,
            self.embedder.dimension(),
            self.embedder.model_name(),
            corpus.report,
            start.elapsed(),
        )?;

        let stats = kb.stats();
        info!(
            "Knowledge base built: {} documents ({} course, {} forum) in {}ms",
            stats.documents, stats.course_documents, stats.forum_documents, stats.build_ms
        );
        if kb.is_empty() {
            warn!("Knowledge base is empty; every answer will be empty");
        }

        Ok(Arc::new(kb))
    }

    async fn embed_query(&self, question: &str) -> Result<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        let question = question.to_string();
        self.run_inference("query embedding", self.budgets.embed, move || {
            embedder.embed(&question)
        })
        .await
    }

    async fn extract(&self, question: &str, context: String) -> Result<ExtractedAnswer> {
        let extractor = Arc::clone(&self.extractor);
        let question = question.to_string();
        self.run_inference("answer extraction", self.budgets.extract, move || {
            extractor.extract(&question, &context)
        })
        .await
    }

    /// Run CPU-bound model work on the blocking pool once a permit is free.
    /// The budget covers both the wait for a permit and the work itself.
    async fn run_inference<T, E, F>(&self, stage: &'static str, budget: Duration, work: F) -> Result<T>
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<TaError> + Send + 'static,
    {
        let inference = Arc::clone(&self.inference);
        let task = async move {
            let permit = inference
                .acquire_owned()
                .await
                .map_err(|_| TaError::CapacityExhausted("inference pool closed".to_string()))?;

            // The permit is held until the work returns, even after a timeout
            let output = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                work()
            })
            .await?
            .map_err(Into::<TaError>::into)?;
            Ok::<T, TaError>(output)
        };

        match tokio::time::timeout(budget, task).await {
            Ok(result) => result,
            Err(_) => Err(TaError::Timeout {
                stage,
                after: budget,
            }),
        }
    }
}

/// Join the leading `context_docs` hits into one context and collect their
/// citations in rank order
fn assemble_context(
    kb: &KnowledgeBase,
    hits: &[SearchResult],
    context_docs: usize,
    separator: &str,
) -> (String, Vec<Link>) {
    let documents: Vec<_> = hits
        .iter()
        .take(context_docs)
        .filter_map(|hit| kb.document(hit.row))
        .collect();

    let context = documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join(separator);
    let links = documents
        .iter()
        .map(|doc| Link::new(doc.source_url.clone(), doc.display_snippet.clone()))
        .collect();

    (context, links)
}
