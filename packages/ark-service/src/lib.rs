pub mod binding;
pub mod indexer;
pub mod matcher;
pub mod registry;
pub mod store;
pub mod vector;

mod error;

pub use error::{Error, Result};
pub use indexer::{AnnotationIndexer, ReindexReport};
pub use matcher::{AnnotationMatcher, MatchOutcome, MatchRequest, MatchStage};

use std::{future::Future, pin::Pin, sync::Arc};

use uuid::Uuid;

use ark_config::Config;
use ark_domain::{
	Annotation, AnnotationSetting, CollectionBinding, DatasetView, MatchCandidate,
	NewAnnotationHistory,
};
use ark_storage::{db::Db, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An embedding model instance resolved for one tenant.
pub trait EmbeddingModel
where
	Self: Send + Sync,
{
	fn provider(&self) -> &str;

	fn model(&self) -> &str;

	fn dimensions(&self) -> u32;

	fn embed_documents<'a>(
		&'a self,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;

	fn embed_query<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move {
			let texts = [text.to_string()];

			self.embed_documents(&texts).await?.into_iter().next().ok_or_else(|| {
				Error::Provider { message: "Embedding provider returned no vectors.".to_string() }
			})
		})
	}
}

pub trait ModelRegistry
where
	Self: Send + Sync,
{
	/// Fails with [`Error::ModelNotFound`] for unknown or misconfigured provider/model pairs.
	fn resolve_embedding<'a>(
		&'a self,
		tenant_id: &'a str,
		provider: &'a str,
		model: &'a str,
	) -> BoxFuture<'a, Result<Arc<dyn EmbeddingModel>>>;
}

pub trait CollectionBindingResolver
where
	Self: Send + Sync,
{
	/// Idempotent. Repeated calls with the same triple return the same binding.
	fn resolve<'a>(
		&'a self,
		provider: &'a str,
		model: &'a str,
		purpose: &'a str,
	) -> BoxFuture<'a, Result<CollectionBinding>>;
}

pub trait AnnotationStore
where
	Self: Send + Sync,
{
	fn get_setting(&self, app_id: Uuid) -> BoxFuture<'_, Result<Option<AnnotationSetting>>>;

	fn get_annotation(&self, annotation_id: Uuid) -> BoxFuture<'_, Result<Option<Annotation>>>;

	fn list_annotations(&self, app_id: Uuid) -> BoxFuture<'_, Result<Vec<Annotation>>>;

	/// Append-only. Errors are always reported to the caller.
	fn append_history<'a>(
		&'a self,
		entry: &'a NewAnnotationHistory,
	) -> BoxFuture<'a, Result<Uuid>>;
}

/// Exact-match metadata filter applied to vector payloads.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
	pub field: String,
	pub value: String,
}
impl FieldFilter {
	pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
		Self { field: field.into(), value: value.into() }
	}
}

pub struct NearestRequest<'a> {
	pub dataset: &'a DatasetView,
	pub model: &'a dyn EmbeddingModel,
	pub query: &'a str,
	pub k: u64,
	pub score_threshold: f32,
	pub filter: &'a [FieldFilter],
}

/// Text placed into a dataset; the point id is the annotation id.
#[derive(Clone, Debug)]
pub struct IndexDocument {
	pub annotation_id: Uuid,
	pub text: String,
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	/// Results are ordered by descending similarity and never fall below the threshold.
	fn nearest<'a>(&'a self, req: NearestRequest<'a>) -> BoxFuture<'a, Result<Vec<MatchCandidate>>>;

	fn add_texts<'a>(
		&'a self,
		dataset: &'a DatasetView,
		model: &'a dyn EmbeddingModel,
		docs: &'a [IndexDocument],
	) -> BoxFuture<'a, Result<()>>;

	fn delete_annotation<'a>(
		&'a self,
		dataset: &'a DatasetView,
		annotation_id: Uuid,
	) -> BoxFuture<'a, Result<()>>;
}

/// Everything annotation reply talks to, injected rather than looked up globally.
#[derive(Clone)]
pub struct Collaborators {
	pub store: Arc<dyn AnnotationStore>,
	pub models: Arc<dyn ModelRegistry>,
	pub bindings: Arc<dyn CollectionBindingResolver>,
	pub index: Arc<dyn VectorIndex>,
}
impl Collaborators {
	pub fn new(
		store: Arc<dyn AnnotationStore>,
		models: Arc<dyn ModelRegistry>,
		bindings: Arc<dyn CollectionBindingResolver>,
		index: Arc<dyn VectorIndex>,
	) -> Self {
		Self { store, models, bindings, index }
	}

	/// Postgres store and binding resolver, config-backed model registry, Qdrant index.
	pub fn from_stores(cfg: &Config, db: Arc<Db>, qdrant: Arc<QdrantStore>) -> Self {
		Self {
			store: Arc::new(store::PgAnnotationStore::new(db.clone())),
			models: Arc::new(registry::ConfigModelRegistry::new(&cfg.providers)),
			bindings: Arc::new(binding::PgCollectionBindingResolver::new(db)),
			index: Arc::new(vector::QdrantVectorIndex::new(qdrant)),
		}
	}
}
