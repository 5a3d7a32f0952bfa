//! Keeps the annotation vector index in step with stored annotations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ark_domain::{Annotation, AnnotationSetting, DatasetView};

use crate::{Collaborators, EmbeddingModel, Error, IndexDocument, Result};

const REINDEX_BATCH_SIZE: usize = 32;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexReport {
	pub indexed: u64,
	pub failed: u64,
}

pub struct AnnotationIndexer {
	collaborators: Collaborators,
	collection_purpose: String,
}
impl AnnotationIndexer {
	pub fn new(collaborators: Collaborators, collection_purpose: impl Into<String>) -> Self {
		Self { collaborators, collection_purpose: collection_purpose.into() }
	}

	/// Embeds the annotation question into the application's dataset.
	pub async fn index_annotation(&self, tenant_id: &str, annotation: &Annotation) -> Result<()> {
		let (dataset, model) = self.dataset(tenant_id, annotation.app_id).await?;

		self.collaborators
			.index
			.add_texts(&dataset, model.as_ref(), &[document(annotation)])
			.await?;

		tracing::info!(
			tenant_id,
			app_id = %annotation.app_id,
			annotation_id = %annotation.annotation_id,
			"Annotation indexed."
		);

		Ok(())
	}

	pub async fn remove_annotation(
		&self,
		tenant_id: &str,
		app_id: Uuid,
		annotation_id: Uuid,
	) -> Result<()> {
		let (dataset, _) = self.dataset(tenant_id, app_id).await?;

		self.collaborators.index.delete_annotation(&dataset, annotation_id).await?;

		tracing::info!(
			tenant_id,
			app_id = %app_id,
			annotation_id = %annotation_id,
			"Annotation removed from index."
		);

		Ok(())
	}

	/// Re-embeds every stored annotation of the application.
	///
	/// A failing batch is counted and skipped; setup failures abort the run.
	pub async fn reindex_app(&self, tenant_id: &str, app_id: Uuid) -> Result<ReindexReport> {
		let (dataset, model) = self.dataset(tenant_id, app_id).await?;
		let annotations = self.collaborators.store.list_annotations(app_id).await?;
		let mut report = ReindexReport::default();

		for batch in annotations.chunks(REINDEX_BATCH_SIZE) {
			let docs = batch.iter().map(document).collect::<Vec<_>>();

			match self.collaborators.index.add_texts(&dataset, model.as_ref(), &docs).await {
				Ok(()) => report.indexed += docs.len() as u64,
				Err(err) => {
					report.failed += docs.len() as u64;

					tracing::warn!(
						tenant_id,
						app_id = %app_id,
						batch = docs.len(),
						error = %err,
						"Annotation batch reindex failed."
					);
				},
			}
		}

		tracing::info!(
			tenant_id,
			app_id = %app_id,
			indexed = report.indexed,
			failed = report.failed,
			"Annotation reindex finished."
		);

		Ok(report)
	}

	async fn dataset(
		&self,
		tenant_id: &str,
		app_id: Uuid,
	) -> Result<(DatasetView, Arc<dyn EmbeddingModel>)> {
		let setting = self.setting(app_id).await?;
		let provider = setting.embedding_provider_name.as_str();
		let model_name = setting.embedding_model_name.as_str();
		let model = self.collaborators.models.resolve_embedding(tenant_id, provider, model_name).await?;
		let binding = self
			.collaborators
			.bindings
			.resolve(provider, model_name, &self.collection_purpose)
			.await?;

		Ok((DatasetView::for_annotations(app_id, tenant_id, binding), model))
	}

	async fn setting(&self, app_id: Uuid) -> Result<AnnotationSetting> {
		self.collaborators.store.get_setting(app_id).await?.ok_or_else(|| Error::InvalidRequest {
			message: format!("Annotation reply is not enabled for app {app_id}."),
		})
	}
}

fn document(annotation: &Annotation) -> IndexDocument {
	IndexDocument { annotation_id: annotation.annotation_id, text: annotation.question.clone() }
}
