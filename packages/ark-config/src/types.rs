use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub annotation: Annotation,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
	/// Upper bound for one annotation match, applied by callers around the whole lookup.
	#[serde(default = "default_match_timeout_ms")]
	pub match_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: Vec<EmbeddingProviderConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	/// Optional. Entries with a tenant take precedence over shared entries for that tenant.
	#[serde(default)]
	pub tenant_id: Option<String>,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub models: Vec<String>,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}
impl EmbeddingProviderConfig {
	pub fn serves(&self, provider_id: &str, model: &str) -> bool {
		self.provider_id == provider_id && self.models.iter().any(|m| m == model)
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Annotation {
	pub collection_purpose: String,
}
impl Default for Annotation {
	fn default() -> Self {
		Self { collection_purpose: "annotation".to_string() }
	}
}

fn default_match_timeout_ms() -> u64 {
	10_000
}
