use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use ark_domain::{Annotation, AnnotationSetting, NewAnnotationHistory};
use ark_storage::{db::Db, queries};

use crate::{AnnotationStore, BoxFuture, Result};

pub struct PgAnnotationStore {
	db: Arc<Db>,
}
impl PgAnnotationStore {
	pub fn new(db: Arc<Db>) -> Self {
		Self { db }
	}

	async fn setting(&self, app_id: Uuid) -> Result<Option<AnnotationSetting>> {
		let row = queries::fetch_annotation_setting(&self.db.pool, app_id).await?;

		Ok(row.map(AnnotationSetting::from))
	}

	async fn annotation(&self, annotation_id: Uuid) -> Result<Option<Annotation>> {
		let row = queries::fetch_annotation(&self.db.pool, annotation_id).await?;

		Ok(row.map(Annotation::from))
	}

	async fn annotations(&self, app_id: Uuid) -> Result<Vec<Annotation>> {
		let rows = queries::list_app_annotations(&self.db.pool, app_id).await?;

		Ok(rows.into_iter().map(Annotation::from).collect())
	}

	async fn insert_history(&self, entry: &NewAnnotationHistory) -> Result<Uuid> {
		let mut tx = self.db.pool.begin().await?;
		let history_id =
			queries::insert_hit_history_tx(&mut tx, entry, OffsetDateTime::now_utc()).await?;

		tx.commit().await?;

		Ok(history_id)
	}
}
impl AnnotationStore for PgAnnotationStore {
	fn get_setting(&self, app_id: Uuid) -> BoxFuture<'_, Result<Option<AnnotationSetting>>> {
		Box::pin(self.setting(app_id))
	}

	fn get_annotation(&self, annotation_id: Uuid) -> BoxFuture<'_, Result<Option<Annotation>>> {
		Box::pin(self.annotation(annotation_id))
	}

	fn list_annotations(&self, app_id: Uuid) -> BoxFuture<'_, Result<Vec<Annotation>>> {
		Box::pin(self.annotations(app_id))
	}

	fn append_history<'a>(
		&'a self,
		entry: &'a NewAnnotationHistory,
	) -> BoxFuture<'a, Result<Uuid>> {
		Box::pin(self.insert_history(entry))
	}
}
