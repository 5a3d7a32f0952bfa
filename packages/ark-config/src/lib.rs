mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Annotation, Config, EmbeddingProviderConfig, Postgres, Providers, Qdrant, Service, Storage,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.service.match_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "service.match_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.annotation.collection_purpose.trim().is_empty() {
		return Err(Error::Validation {
			message: "annotation.collection_purpose must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding must contain at least one provider.".to_string(),
		});
	}

	let mut seen = HashSet::new();

	for provider in &cfg.providers.embedding {
		let label = provider.provider_id.as_str();

		if label.trim().is_empty() {
			return Err(Error::Validation {
				message: "providers.embedding.provider_id must be non-empty.".to_string(),
			});
		}
		if provider.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
		if provider.models.is_empty() || provider.models.iter().any(|m| m.trim().is_empty()) {
			return Err(Error::Validation {
				message: format!("Provider {label} models must be non-empty."),
			});
		}
		if provider.dimensions == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} dimensions must be greater than zero."),
			});
		}
		if provider.timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("Provider {label} timeout_ms must be greater than zero."),
			});
		}
		if !seen.insert((label, provider.tenant_id.as_deref())) {
			return Err(Error::Validation {
				message: format!(
					"Provider {label} is declared more than once for tenant {:?}.",
					provider.tenant_id
				),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for provider in &mut cfg.providers.embedding {
		if provider.tenant_id.as_deref().map(|id| id.trim().is_empty()).unwrap_or(false) {
			provider.tenant_id = None;
		}
	}
}
