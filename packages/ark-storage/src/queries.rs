use sqlx::{PgExecutor, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use ark_domain::{Annotation, CollectionBinding, NewAnnotationHistory};

use crate::{
	Error, Result,
	models::{
		AnnotationHitHistoryRow, AnnotationSettingRow, CollectionBindingRow, MessageAnnotationRow,
	},
};

pub struct UpsertSettingArgs<'a> {
	pub app_id: Uuid,
	pub tenant_id: &'a str,
	pub embedding_provider_name: &'a str,
	pub embedding_model_name: &'a str,
	pub collection_binding_id: Option<Uuid>,
	pub score_threshold: Option<f32>,
}

pub async fn fetch_annotation_setting<'e, E>(
	executor: E,
	app_id: Uuid,
) -> Result<Option<AnnotationSettingRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, AnnotationSettingRow>(
		"\
SELECT
	app_id,
	tenant_id,
	embedding_provider_name,
	embedding_model_name,
	collection_binding_id,
	score_threshold,
	created_at,
	updated_at
FROM app_annotation_settings
WHERE app_id = $1",
	)
	.bind(app_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn upsert_annotation_setting<'e, E>(
	executor: E,
	args: UpsertSettingArgs<'_>,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let UpsertSettingArgs {
		app_id,
		tenant_id,
		embedding_provider_name,
		embedding_model_name,
		collection_binding_id,
		score_threshold,
	} = args;

	sqlx::query(
		"\
INSERT INTO app_annotation_settings (
	app_id,
	tenant_id,
	embedding_provider_name,
	embedding_model_name,
	collection_binding_id,
	score_threshold
)
VALUES ($1,$2,$3,$4,$5,$6)
ON CONFLICT (app_id) DO UPDATE
SET
	tenant_id = EXCLUDED.tenant_id,
	embedding_provider_name = EXCLUDED.embedding_provider_name,
	embedding_model_name = EXCLUDED.embedding_model_name,
	collection_binding_id = EXCLUDED.collection_binding_id,
	score_threshold = EXCLUDED.score_threshold,
	updated_at = now()",
	)
	.bind(app_id)
	.bind(tenant_id)
	.bind(embedding_provider_name)
	.bind(embedding_model_name)
	.bind(collection_binding_id)
	.bind(score_threshold)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn fetch_annotation<'e, E>(
	executor: E,
	annotation_id: Uuid,
) -> Result<Option<MessageAnnotationRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, MessageAnnotationRow>(
		"\
SELECT annotation_id, app_id, question, content, hit_count, created_at, updated_at
FROM message_annotations
WHERE annotation_id = $1",
	)
	.bind(annotation_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn list_app_annotations<'e, E>(
	executor: E,
	app_id: Uuid,
) -> Result<Vec<MessageAnnotationRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, MessageAnnotationRow>(
		"\
SELECT annotation_id, app_id, question, content, hit_count, created_at, updated_at
FROM message_annotations
WHERE app_id = $1
ORDER BY created_at, annotation_id",
	)
	.bind(app_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn insert_annotation<'e, E>(executor: E, annotation: &Annotation) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO message_annotations (
	annotation_id,
	app_id,
	question,
	content,
	hit_count,
	created_at,
	updated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$6)",
	)
	.bind(annotation.annotation_id)
	.bind(annotation.app_id)
	.bind(annotation.question.as_str())
	.bind(annotation.content.as_str())
	.bind(annotation.hit_count)
	.bind(annotation.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn delete_annotation<'e, E>(executor: E, annotation_id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM message_annotations WHERE annotation_id = $1")
		.bind(annotation_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() > 0)
}

/// Appends one hit history row and bumps the annotation hit counter in the same transaction.
pub async fn insert_hit_history_tx(
	tx: &mut Transaction<'_, Postgres>,
	history: &NewAnnotationHistory,
	now: OffsetDateTime,
) -> Result<Uuid> {
	let history_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO app_annotation_hit_histories (
	history_id,
	annotation_id,
	app_id,
	annotation_question,
	annotation_content,
	source,
	question,
	account_id,
	message_id,
	score,
	created_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)",
	)
	.bind(history_id)
	.bind(history.annotation_id)
	.bind(history.app_id)
	.bind(history.annotation_question.as_str())
	.bind(history.annotation_content.as_str())
	.bind(history.source.as_str())
	.bind(history.query.as_str())
	.bind(history.user_id.as_str())
	.bind(history.message_id)
	.bind(history.score)
	.bind(now)
	.execute(&mut **tx)
	.await?;

	let updated = sqlx::query(
		"\
UPDATE message_annotations
SET hit_count = hit_count + 1
WHERE annotation_id = $1",
	)
	.bind(history.annotation_id)
	.execute(&mut **tx)
	.await?;

	if updated.rows_affected() == 0 {
		return Err(Error::NotFound(format!(
			"Annotation {} no longer exists.",
			history.annotation_id
		)));
	}

	Ok(history_id)
}

pub async fn list_hit_histories<'e, E>(
	executor: E,
	app_id: Uuid,
) -> Result<Vec<AnnotationHitHistoryRow>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, AnnotationHitHistoryRow>(
		"\
SELECT
	history_id,
	annotation_id,
	app_id,
	annotation_question,
	annotation_content,
	source,
	question,
	account_id,
	message_id,
	score,
	created_at
FROM app_annotation_hit_histories
WHERE app_id = $1
ORDER BY created_at, history_id",
	)
	.bind(app_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn fetch_collection_binding<'e, E>(
	executor: E,
	provider_name: &str,
	model_name: &str,
	purpose: &str,
) -> Result<Option<CollectionBindingRow>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, CollectionBindingRow>(
		"\
SELECT binding_id, provider_name, model_name, purpose, collection_name, created_at
FROM dataset_collection_bindings
WHERE provider_name = $1 AND model_name = $2 AND purpose = $3",
	)
	.bind(provider_name)
	.bind(model_name)
	.bind(purpose)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Inserts a binding for the triple unless one already exists. Concurrent callers converge on
/// whichever row won the unique constraint.
pub async fn insert_collection_binding_if_absent<'e, E>(
	executor: E,
	provider_name: &str,
	model_name: &str,
	purpose: &str,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let binding_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO dataset_collection_bindings (
	binding_id,
	provider_name,
	model_name,
	purpose,
	collection_name
)
VALUES ($1,$2,$3,$4,$5)
ON CONFLICT (provider_name, model_name, purpose) DO NOTHING",
	)
	.bind(binding_id)
	.bind(provider_name)
	.bind(model_name)
	.bind(purpose)
	.bind(CollectionBinding::collection_name_for(binding_id))
	.execute(executor)
	.await?;

	Ok(())
}
