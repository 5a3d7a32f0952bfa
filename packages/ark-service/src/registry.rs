use std::sync::Arc;

use ark_config::{EmbeddingProviderConfig, Providers};

use crate::{BoxFuture, EmbeddingModel, Error, ModelRegistry, Result};

/// Embedding models declared in the `providers.embedding` config section.
///
/// A tenant-scoped entry wins over the shared entry for the same provider.
pub struct ConfigModelRegistry {
	providers: Vec<EmbeddingProviderConfig>,
}
impl ConfigModelRegistry {
	pub fn new(providers: &Providers) -> Self {
		Self { providers: providers.embedding.clone() }
	}

	pub fn lookup(
		&self,
		tenant_id: &str,
		provider: &str,
		model: &str,
	) -> Result<&EmbeddingProviderConfig> {
		let candidates = self.providers.iter().filter(|cfg| cfg.serves(provider, model));
		let mut shared = None;

		for cfg in candidates {
			match cfg.tenant_id.as_deref() {
				Some(owner) if owner == tenant_id => return Ok(cfg),
				None if shared.is_none() => shared = Some(cfg),
				_ => {},
			}
		}

		shared.ok_or_else(|| Error::ModelNotFound {
			message: format!(
				"No embedding model {model:?} from provider {provider:?} for tenant {tenant_id:?}."
			),
		})
	}
}
impl ModelRegistry for ConfigModelRegistry {
	fn resolve_embedding<'a>(
		&'a self,
		tenant_id: &'a str,
		provider: &'a str,
		model: &'a str,
	) -> BoxFuture<'a, Result<Arc<dyn EmbeddingModel>>> {
		Box::pin(async move {
			let cfg = self.lookup(tenant_id, provider, model)?;
			let model: Arc<dyn EmbeddingModel> =
				Arc::new(HttpEmbeddingModel { cfg: cfg.clone(), model: model.to_string() });

			Ok(model)
		})
	}
}

/// Embedding model served over an OpenAI-compatible HTTP API.
pub struct HttpEmbeddingModel {
	cfg: EmbeddingProviderConfig,
	model: String,
}
impl EmbeddingModel for HttpEmbeddingModel {
	fn provider(&self) -> &str {
		&self.cfg.provider_id
	}

	fn model(&self) -> &str {
		&self.model
	}

	fn dimensions(&self) -> u32 {
		self.cfg.dimensions
	}

	fn embed_documents<'a>(
		&'a self,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			let vectors = ark_providers::embedding::embed(&self.cfg, &self.model, texts).await?;

			Ok(vectors)
		})
	}
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;

	fn provider(tenant_id: Option<&str>, api_key: &str, models: &[&str]) -> EmbeddingProviderConfig {
		EmbeddingProviderConfig {
			provider_id: "openai".to_string(),
			tenant_id: tenant_id.map(str::to_string),
			api_base: "http://127.0.0.1:1".to_string(),
			api_key: api_key.to_string(),
			path: "/embeddings".to_string(),
			models: models.iter().map(|model| model.to_string()).collect(),
			dimensions: 4,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		}
	}

	fn registry() -> ConfigModelRegistry {
		ConfigModelRegistry::new(&Providers {
			embedding: vec![
				provider(None, "shared-key", &["text-embedding-3-small", "text-embedding-ada-002"]),
				provider(Some("tenant_alpha"), "alpha-key", &["text-embedding-3-small"]),
			],
		})
	}

	#[test]
	fn tenant_entry_wins_over_shared_entry() {
		let registry = registry();
		let alpha = registry
			.lookup("tenant_alpha", "openai", "text-embedding-3-small")
			.expect("Expected tenant entry.");
		let beta = registry
			.lookup("tenant_beta", "openai", "text-embedding-3-small")
			.expect("Expected shared entry.");

		assert_eq!(alpha.api_key, "alpha-key");
		assert_eq!(beta.api_key, "shared-key");
	}

	#[test]
	fn tenant_falls_back_to_shared_for_models_it_does_not_override() {
		let registry = registry();
		let cfg = registry
			.lookup("tenant_alpha", "openai", "text-embedding-ada-002")
			.expect("Expected shared entry.");

		assert_eq!(cfg.api_key, "shared-key");
	}

	#[test]
	fn unknown_pairs_are_model_not_found() {
		let registry = registry();

		assert!(matches!(
			registry.lookup("tenant_alpha", "cohere", "text-embedding-3-small"),
			Err(Error::ModelNotFound { .. })
		));
		assert!(matches!(
			registry.lookup("tenant_alpha", "openai", "text-embedding-3-large"),
			Err(Error::ModelNotFound { .. })
		));
	}

	#[tokio::test]
	async fn resolved_model_reports_its_identity() {
		let registry = registry();
		let model = registry
			.resolve_embedding("tenant_alpha", "openai", "text-embedding-3-small")
			.await
			.expect("Expected model.");

		assert_eq!(model.provider(), "openai");
		assert_eq!(model.model(), "text-embedding-3-small");
		assert_eq!(model.dimensions(), 4);
	}
}
