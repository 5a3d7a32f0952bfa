use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::invocation::HistorySource;

/// Threshold applied when an application never configured one.
///
/// This is the maximum cosine similarity, so an unconfigured application only matches
/// annotations whose question embeds to the same vector as the query.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 1.0;

/// Per-application annotation reply configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSetting {
	pub app_id: Uuid,
	pub embedding_provider_name: String,
	pub embedding_model_name: String,
	pub collection_binding_id: Option<Uuid>,
	pub score_threshold: Option<f32>,
}
impl AnnotationSetting {
	/// Unset and zero thresholds both fall back to [`DEFAULT_SCORE_THRESHOLD`].
	pub fn effective_score_threshold(&self) -> f32 {
		match self.score_threshold {
			Some(threshold) if threshold != 0.0 && threshold.is_finite() => threshold,
			_ => DEFAULT_SCORE_THRESHOLD,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
	pub annotation_id: Uuid,
	pub app_id: Uuid,
	pub question: String,
	pub content: String,
	pub hit_count: i64,
	pub created_at: OffsetDateTime,
}

/// History row to append after a successful match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAnnotationHistory {
	pub annotation_id: Uuid,
	pub app_id: Uuid,
	pub annotation_question: String,
	pub annotation_content: String,
	pub query: String,
	pub user_id: String,
	pub message_id: Uuid,
	pub source: HistorySource,
	pub score: f32,
}
impl NewAnnotationHistory {
	/// `app_id` is the application that asked, which is not necessarily the annotation owner.
	pub fn for_match(
		app_id: Uuid,
		annotation: &Annotation,
		query: &str,
		user_id: &str,
		message_id: Uuid,
		source: HistorySource,
		score: f32,
	) -> Self {
		Self {
			annotation_id: annotation.annotation_id,
			app_id,
			annotation_question: annotation.question.clone(),
			annotation_content: annotation.content.clone(),
			query: query.to_string(),
			user_id: user_id.to_string(),
			message_id,
			source,
			score,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationHistoryEntry {
	pub history_id: Uuid,
	pub annotation_id: Uuid,
	pub app_id: Uuid,
	pub annotation_question: String,
	pub annotation_content: String,
	pub query: String,
	pub user_id: String,
	pub message_id: Uuid,
	pub source: HistorySource,
	pub score: f32,
	pub created_at: OffsetDateTime,
}

/// Top hit from the vector index. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchCandidate {
	pub annotation_id: Uuid,
	pub score: f32,
}
