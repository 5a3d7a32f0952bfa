use std::{collections::HashMap, sync::Arc};

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
		DeletePointsBuilder, Distance, FieldType, Filter, PointStruct, Query, QueryPointsBuilder,
		ScoredPoint, UpsertPointsBuilder, Value, Vector, VectorParamsBuilder,
		VectorsConfigBuilder, value::Kind,
	},
};
use uuid::Uuid;

use ark_domain::{DatasetView, MatchCandidate};
use ark_storage::qdrant::{DENSE_VECTOR_NAME, QdrantStore};

use crate::{
	BoxFuture, EmbeddingModel, Error, FieldFilter, IndexDocument, NearestRequest, Result,
	VectorIndex, matcher::GROUP_ID_FIELD,
};

const ANNOTATION_ID_FIELD: &str = "annotation_id";

/// Annotation vectors in Qdrant, one collection per binding, partitioned by `group_id`.
pub struct QdrantVectorIndex {
	qdrant: Arc<QdrantStore>,
}
impl QdrantVectorIndex {
	pub fn new(qdrant: Arc<QdrantStore>) -> Self {
		Self { qdrant }
	}

	async fn search(&self, req: NearestRequest<'_>) -> Result<Vec<MatchCandidate>> {
		// Collections are created on first index, so an empty binding has nothing to search.
		if !self.qdrant.client.collection_exists(req.dataset.collection_name()).await? {
			return Ok(Vec::new());
		}

		let vector = req.model.embed_query(req.query).await?;

		if vector.len() != req.model.dimensions() as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		let search = QueryPointsBuilder::new(req.dataset.collection_name())
			.query(Query::new_nearest(vector))
			.using(DENSE_VECTOR_NAME)
			.filter(build_filter(req.filter))
			.score_threshold(req.score_threshold)
			.limit(req.k)
			.with_payload(true);
		let response = self.qdrant.client.query(search).await?;
		let mut candidates = response
			.result
			.into_iter()
			.map(candidate_from_point)
			.collect::<Result<Vec<_>>>()?;

		candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

		Ok(candidates)
	}

	async fn upsert(
		&self,
		dataset: &DatasetView,
		model: &dyn EmbeddingModel,
		docs: &[IndexDocument],
	) -> Result<()> {
		if docs.is_empty() {
			return Ok(());
		}

		let texts = docs.iter().map(|doc| doc.text.clone()).collect::<Vec<_>>();
		let vectors = model.embed_documents(&texts).await?;

		if vectors.len() != docs.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} documents.",
					vectors.len(),
					docs.len()
				),
			});
		}

		self.ensure_collection(dataset.collection_name(), model.dimensions()).await?;

		let mut points = Vec::with_capacity(docs.len());

		for (doc, vec) in docs.iter().zip(vectors) {
			let mut vectors = HashMap::new();

			vectors.insert(DENSE_VECTOR_NAME.to_string(), Vector::from(vec));
			points.push(PointStruct::new(
				doc.annotation_id.to_string(),
				vectors,
				point_payload(dataset, doc),
			));
		}

		self.qdrant
			.client
			.upsert_points(UpsertPointsBuilder::new(dataset.collection_name(), points).wait(true))
			.await?;

		tracing::debug!(
			collection = dataset.collection_name(),
			group_id = %dataset.id,
			points = docs.len(),
			"Annotation vectors upserted."
		);

		Ok(())
	}

	async fn ensure_collection(&self, collection: &str, dimensions: u32) -> Result<()> {
		let client = &self.qdrant.client;

		if client.collection_exists(collection).await? {
			return Ok(());
		}

		let mut vectors_config = VectorsConfigBuilder::default();

		vectors_config.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(dimensions.into(), Distance::Cosine),
		);

		let builder = CreateCollectionBuilder::new(collection).vectors_config(vectors_config);

		if let Err(err) = client.create_collection(builder).await {
			// Another writer may have created it first.
			if client.collection_exists(collection).await? {
				return Ok(());
			}

			return Err(err.into());
		}

		client
			.create_field_index(
				CreateFieldIndexCollectionBuilder::new(
					collection,
					GROUP_ID_FIELD,
					FieldType::Keyword,
				)
				.wait(true),
			)
			.await?;

		tracing::info!(collection, dimensions, "Annotation collection created.");

		Ok(())
	}

	async fn delete(&self, dataset: &DatasetView, annotation_id: Uuid) -> Result<()> {
		let client = &self.qdrant.client;

		if !client.collection_exists(dataset.collection_name()).await? {
			return Ok(());
		}

		let filter = build_filter(&[
			FieldFilter::new(GROUP_ID_FIELD, dataset.group_id()),
			FieldFilter::new(ANNOTATION_ID_FIELD, annotation_id.to_string()),
		]);

		client
			.delete_points(
				DeletePointsBuilder::new(dataset.collection_name()).points(filter).wait(true),
			)
			.await?;

		Ok(())
	}
}
impl VectorIndex for QdrantVectorIndex {
	fn nearest<'a>(&'a self, req: NearestRequest<'a>) -> BoxFuture<'a, Result<Vec<MatchCandidate>>> {
		Box::pin(self.search(req))
	}

	fn add_texts<'a>(
		&'a self,
		dataset: &'a DatasetView,
		model: &'a dyn EmbeddingModel,
		docs: &'a [IndexDocument],
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.upsert(dataset, model, docs))
	}

	fn delete_annotation<'a>(
		&'a self,
		dataset: &'a DatasetView,
		annotation_id: Uuid,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.delete(dataset, annotation_id))
	}
}

fn build_filter(filters: &[FieldFilter]) -> Filter {
	Filter::must(
		filters
			.iter()
			.map(|filter| Condition::matches(filter.field.as_str(), filter.value.clone()))
			.collect::<Vec<_>>(),
	)
}

fn point_payload(dataset: &DatasetView, doc: &IndexDocument) -> Payload {
	let mut payload = Payload::new();

	payload.insert("doc_id", doc.annotation_id.to_string());
	payload.insert(ANNOTATION_ID_FIELD, doc.annotation_id.to_string());
	payload.insert("app_id", dataset.id.to_string());
	payload.insert(GROUP_ID_FIELD, dataset.group_id());
	payload.insert("page_content", doc.text.clone());

	payload
}

fn candidate_from_point(point: ScoredPoint) -> Result<MatchCandidate> {
	let annotation_id = payload_uuid(&point.payload, ANNOTATION_ID_FIELD).ok_or_else(|| {
		Error::InvalidPayload {
			message: "Annotation point is missing a valid annotation_id.".to_string(),
		}
	})?;

	Ok(MatchCandidate { annotation_id, score: point.score })
}

fn payload_uuid(payload: &HashMap<String, Value>, key: &str) -> Option<Uuid> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Uuid::parse_str(text).ok(),
		_ => None,
	}
}
