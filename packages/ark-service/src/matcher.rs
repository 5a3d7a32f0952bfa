//! Annotation reply matching.
//!
//! Decides per query whether a curated annotation should answer instead of the model. Matching
//! is best effort: every collaborator failure is logged and reported to the caller as "no
//! match", so the primary response path never breaks because of it.

use std::fmt;

use uuid::Uuid;

use ark_domain::{Annotation, DatasetView, InvocationSource, NewAnnotationHistory};

use crate::{Collaborators, Error, FieldFilter, NearestRequest, Result};

/// Number of neighbours requested from the index.
const TOP_K: u64 = 1;
/// Payload field holding the owning application id on every annotation point.
pub const GROUP_ID_FIELD: &str = "group_id";

pub struct MatchRequest<'a> {
	pub tenant_id: &'a str,
	pub app_id: Uuid,
	/// Only used as a foreign key on the history entry.
	pub message_id: Uuid,
	pub query: &'a str,
	pub user_id: &'a str,
	pub invoke_from: InvocationSource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStage {
	Setting,
	Model,
	Binding,
	Search,
	Annotation,
	History,
}
impl MatchStage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Setting => "setting",
			Self::Model => "model",
			Self::Binding => "binding",
			Self::Search => "search",
			Self::Annotation => "annotation",
			Self::History => "history",
		}
	}
}
impl fmt::Display for MatchStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Detailed result of one lookup. Only [`MatchOutcome::Matched`] carries an annotation.
#[derive(Debug)]
pub enum MatchOutcome {
	Matched { annotation: Annotation, score: f32, history_id: Uuid },
	EmptyQuery,
	NotConfigured,
	NoCandidate,
	BelowThreshold { score: f32, threshold: f32 },
	StaleIndex { annotation_id: Uuid },
	Unavailable { stage: MatchStage, error: Error },
}
impl MatchOutcome {
	pub fn is_match(&self) -> bool {
		matches!(self, Self::Matched { .. })
	}

	pub fn into_annotation(self) -> Option<Annotation> {
		match self {
			Self::Matched { annotation, .. } => Some(annotation),
			_ => None,
		}
	}
}

struct StageFailure {
	stage: MatchStage,
	error: Error,
}

trait AtStage<T> {
	fn at(self, stage: MatchStage) -> Result<T, StageFailure>;
}
impl<T> AtStage<T> for Result<T> {
	fn at(self, stage: MatchStage) -> Result<T, StageFailure> {
		self.map_err(|error| StageFailure { stage, error })
	}
}

pub struct AnnotationMatcher {
	collaborators: Collaborators,
	collection_purpose: String,
}
impl AnnotationMatcher {
	pub fn new(collaborators: Collaborators, collection_purpose: impl Into<String>) -> Self {
		Self { collaborators, collection_purpose: collection_purpose.into() }
	}

	/// Returns the annotation that should answer `req.query`, if any.
	///
	/// Never fails. Errors are logged and collapse to `None`.
	pub async fn query(&self, req: MatchRequest<'_>) -> Option<Annotation> {
		let app_id = req.app_id;
		let tenant_id = req.tenant_id.to_string();
		let outcome = self.evaluate(req).await;

		log_outcome(&tenant_id, app_id, &outcome);

		outcome.into_annotation()
	}

	/// Same as [`AnnotationMatcher::query`] but keeps the reason for a miss.
	pub async fn evaluate(&self, req: MatchRequest<'_>) -> MatchOutcome {
		if req.query.trim().is_empty() {
			return MatchOutcome::EmptyQuery;
		}

		match self.run(req).await {
			Ok(outcome) => outcome,
			Err(StageFailure { stage, error }) => MatchOutcome::Unavailable { stage, error },
		}
	}

	async fn run(&self, req: MatchRequest<'_>) -> Result<MatchOutcome, StageFailure> {
		let MatchRequest { tenant_id, app_id, message_id, query, user_id, invoke_from } = req;
		let Collaborators { store, models, bindings, index } = &self.collaborators;
		let Some(setting) = store.get_setting(app_id).await.at(MatchStage::Setting)? else {
			return Ok(MatchOutcome::NotConfigured);
		};
		let threshold = setting.effective_score_threshold();
		let provider = setting.embedding_provider_name.as_str();
		let model_name = setting.embedding_model_name.as_str();
		let model = models
			.resolve_embedding(tenant_id, provider, model_name)
			.await
			.at(MatchStage::Model)?;
		let binding = bindings
			.resolve(provider, model_name, &self.collection_purpose)
			.await
			.at(MatchStage::Binding)?;
		let dataset = DatasetView::for_annotations(app_id, tenant_id, binding);
		let filter = [FieldFilter::new(GROUP_ID_FIELD, dataset.group_id())];
		let candidates = index
			.nearest(NearestRequest {
				dataset: &dataset,
				model: model.as_ref(),
				query,
				k: TOP_K,
				score_threshold: threshold,
				filter: &filter,
			})
			.await
			.at(MatchStage::Search)?;
		let Some(candidate) = candidates.into_iter().next() else {
			return Ok(MatchOutcome::NoCandidate);
		};

		if candidate.score.is_nan() || candidate.score < threshold {
			return Ok(MatchOutcome::BelowThreshold { score: candidate.score, threshold });
		}

		let Some(annotation) =
			store.get_annotation(candidate.annotation_id).await.at(MatchStage::Annotation)?
		else {
			return Ok(MatchOutcome::StaleIndex { annotation_id: candidate.annotation_id });
		};
		let history = NewAnnotationHistory::for_match(
			app_id,
			&annotation,
			query,
			user_id,
			message_id,
			invoke_from.history_source(),
			candidate.score,
		);
		let history_id = store.append_history(&history).await.at(MatchStage::History)?;

		Ok(MatchOutcome::Matched { annotation, score: candidate.score, history_id })
	}
}

fn log_outcome(tenant_id: &str, app_id: Uuid, outcome: &MatchOutcome) {
	match outcome {
		MatchOutcome::Matched { annotation, score, history_id } => tracing::info!(
			tenant_id,
			app_id = %app_id,
			annotation_id = %annotation.annotation_id,
			history_id = %history_id,
			score,
			"Annotation reply matched."
		),
		MatchOutcome::EmptyQuery => {
			tracing::debug!(tenant_id, app_id = %app_id, "Annotation query is empty.")
		},
		MatchOutcome::NotConfigured => {
			tracing::debug!(tenant_id, app_id = %app_id, "Annotation reply is not enabled.")
		},
		MatchOutcome::NoCandidate => {
			tracing::debug!(tenant_id, app_id = %app_id, "No annotation cleared the threshold.")
		},
		MatchOutcome::BelowThreshold { score, threshold } => tracing::debug!(
			tenant_id,
			app_id = %app_id,
			score,
			threshold,
			"Annotation candidate below threshold."
		),
		MatchOutcome::StaleIndex { annotation_id } => tracing::debug!(
			tenant_id,
			app_id = %app_id,
			annotation_id = %annotation_id,
			"Indexed annotation no longer exists."
		),
		MatchOutcome::Unavailable { stage, error } => tracing::warn!(
			tenant_id,
			app_id = %app_id,
			stage = stage.as_str(),
			error = %error,
			"Query annotation failed."
		),
	}
}
