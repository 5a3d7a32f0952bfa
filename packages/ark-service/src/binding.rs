use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use ark_domain::CollectionBinding;
use ark_storage::{db::Db, queries};

use crate::{BoxFuture, CollectionBindingResolver, Error, Result};

type BindingKey = (String, String, String);

/// Collection bindings backed by `dataset_collection_bindings`, memoized per process.
///
/// A missing binding is created on first use. Rows are never updated, so cached entries stay
/// valid for the lifetime of the process.
pub struct PgCollectionBindingResolver {
	db: Arc<Db>,
	cache: Mutex<HashMap<BindingKey, CollectionBinding>>,
}
impl PgCollectionBindingResolver {
	pub fn new(db: Arc<Db>) -> Self {
		Self { db, cache: Mutex::new(HashMap::new()) }
	}

	fn cached(&self, key: &BindingKey) -> Option<CollectionBinding> {
		self.cache.lock().unwrap_or_else(|err| err.into_inner()).get(key).cloned()
	}

	async fn load_or_create(
		&self,
		provider: &str,
		model: &str,
		purpose: &str,
	) -> Result<CollectionBinding> {
		let key = (provider.to_string(), model.to_string(), purpose.to_string());

		if let Some(binding) = self.cached(&key) {
			return Ok(binding);
		}

		let row = match queries::fetch_collection_binding(&self.db.pool, provider, model, purpose)
			.await?
		{
			Some(row) => row,
			None => {
				queries::insert_collection_binding_if_absent(
					&self.db.pool,
					provider,
					model,
					purpose,
				)
				.await?;

				queries::fetch_collection_binding(&self.db.pool, provider, model, purpose)
					.await?
					.ok_or_else(|| Error::Storage {
						message: format!(
							"Collection binding for {provider}/{model}/{purpose} vanished after insert."
						),
					})?
			},
		};
		let binding = CollectionBinding::from(row);

		tracing::debug!(
			provider,
			model,
			purpose,
			collection = binding.collection_name.as_str(),
			"Collection binding resolved."
		);

		self.cache.lock().unwrap_or_else(|err| err.into_inner()).insert(key, binding.clone());

		Ok(binding)
	}
}
impl CollectionBindingResolver for PgCollectionBindingResolver {
	fn resolve<'a>(
		&'a self,
		provider: &'a str,
		model: &'a str,
		purpose: &'a str,
	) -> BoxFuture<'a, Result<CollectionBinding>> {
		Box::pin(self.load_or_create(provider, model, purpose))
	}
}
