use time::OffsetDateTime;
use uuid::Uuid;

use ark_domain::{
	Annotation, AnnotationHistoryEntry, AnnotationSetting, CollectionBinding, HistorySource,
};

use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
pub struct AnnotationSettingRow {
	pub app_id: Uuid,
	pub tenant_id: String,
	pub embedding_provider_name: String,
	pub embedding_model_name: String,
	pub collection_binding_id: Option<Uuid>,
	pub score_threshold: Option<f32>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl From<AnnotationSettingRow> for AnnotationSetting {
	fn from(row: AnnotationSettingRow) -> Self {
		Self {
			app_id: row.app_id,
			embedding_provider_name: row.embedding_provider_name,
			embedding_model_name: row.embedding_model_name,
			collection_binding_id: row.collection_binding_id,
			score_threshold: row.score_threshold,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct MessageAnnotationRow {
	pub annotation_id: Uuid,
	pub app_id: Uuid,
	pub question: String,
	pub content: String,
	pub hit_count: i64,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl From<MessageAnnotationRow> for Annotation {
	fn from(row: MessageAnnotationRow) -> Self {
		Self {
			annotation_id: row.annotation_id,
			app_id: row.app_id,
			question: row.question,
			content: row.content,
			hit_count: row.hit_count,
			created_at: row.created_at,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct AnnotationHitHistoryRow {
	pub history_id: Uuid,
	pub annotation_id: Uuid,
	pub app_id: Uuid,
	pub annotation_question: String,
	pub annotation_content: String,
	pub source: String,
	pub question: String,
	pub account_id: String,
	pub message_id: Uuid,
	pub score: f32,
	pub created_at: OffsetDateTime,
}
impl TryFrom<AnnotationHitHistoryRow> for AnnotationHistoryEntry {
	type Error = Error;

	fn try_from(row: AnnotationHitHistoryRow) -> Result<Self> {
		let source = HistorySource::parse(&row.source).ok_or_else(|| {
			Error::InvalidRow(format!("Unknown annotation history source {:?}.", row.source))
		})?;

		Ok(Self {
			history_id: row.history_id,
			annotation_id: row.annotation_id,
			app_id: row.app_id,
			annotation_question: row.annotation_question,
			annotation_content: row.annotation_content,
			query: row.question,
			user_id: row.account_id,
			message_id: row.message_id,
			source,
			score: row.score,
			created_at: row.created_at,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct CollectionBindingRow {
	pub binding_id: Uuid,
	pub provider_name: String,
	pub model_name: String,
	pub purpose: String,
	pub collection_name: String,
	pub created_at: OffsetDateTime,
}
impl From<CollectionBindingRow> for CollectionBinding {
	fn from(row: CollectionBindingRow) -> Self {
		Self {
			binding_id: row.binding_id,
			provider_name: row.provider_name,
			model_name: row.model_name,
			purpose: row.purpose,
			collection_name: row.collection_name,
		}
	}
}
