pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Model not found: {message}")]
	ModelNotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
	#[error("Invalid payload: {message}")]
	InvalidPayload { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<ark_storage::Error> for Error {
	fn from(err: ark_storage::Error) -> Self {
		match err {
			ark_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			ark_storage::Error::InvalidRow(message) => Self::Storage { message },
			ark_storage::Error::NotFound(message) => Self::Storage { message },
			ark_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<ark_providers::Error> for Error {
	fn from(err: ark_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant { message: err.to_string() }
	}
}
