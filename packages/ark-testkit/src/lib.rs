//! Throwaway Postgres databases and Qdrant collections for ignored integration tests.

mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr, sync::Mutex, thread, time::Duration};

use qdrant_client::Qdrant;
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::{runtime::Builder, time};
use uuid::Uuid;

use ark_domain::CollectionBinding;

const PG_DSN_VAR: &str = "ARK_PG_DSN";
const QDRANT_URL_VAR: &str = "ARK_QDRANT_URL";
const QDRANT_TIMEOUT: Duration = Duration::from_secs(10);

/// One database per test, created from `ARK_PG_DSN`, plus the binding collections the test wrote.
///
/// Everything is dropped on [`TestDatabase::cleanup`]. `Drop` does the same on a helper thread when
/// a test panics before reaching cleanup.
pub struct TestDatabase {
	name: String,
	dsn: String,
	admin: PgConnectOptions,
	collections: Mutex<Vec<String>>,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Invalid {PG_DSN_VAR}: {err}.")))?;
		let admin = base.clone().database("postgres");
		let name = database_name();
		let mut conn = PgConnection::connect_with(&admin).await?;

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str()).await?;
		conn.close().await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin, collections: Mutex::new(Vec::new()), cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	/// Schedules the binding's Qdrant collection for deletion at cleanup.
	pub fn track_binding(&self, binding: &CollectionBinding) {
		let mut collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		if !collections.contains(&binding.collection_name) {
			collections.push(binding.collection_name.clone());
		}
	}

	pub async fn cleanup(mut self) -> Result<()> {
		let collections = self.take_collections();
		let dropped = drop_database(&self.name, &self.admin).await;

		delete_collections(&collections).await?;
		dropped?;

		self.cleaned = true;

		Ok(())
	}

	fn take_collections(&self) -> Vec<String> {
		std::mem::take(&mut *self.collections.lock().unwrap_or_else(|err| err.into_inner()))
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let name = self.name.clone();
		let admin = self.admin.clone();
		let collections = self.take_collections();
		let handle = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test cleanup could not start a runtime: {err}.");

					return;
				},
			};

			runtime.block_on(async {
				if let Err(err) = delete_collections(&collections).await {
					eprintln!("Test collection cleanup failed: {err}.");
				}
				if let Err(err) = drop_database(&name, &admin).await {
					eprintln!("Test database {name} cleanup failed: {err}.");
				}
			});
		});

		let _ = handle.join();
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(PG_DSN_VAR).ok()
}

pub fn env_qdrant_url() -> Option<String> {
	env::var(QDRANT_URL_VAR).ok()
}

fn database_name() -> String {
	format!("ark_test_{}", Uuid::new_v4().simple())
}

async fn drop_database(name: &str, admin: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin).await?;

	sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.execute(&mut conn)
	.await?;
	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str()).await?;
	conn.close().await?;

	Ok(())
}

async fn delete_collections(collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let Some(url) = env_qdrant_url() else {
		eprintln!("Leaving {} Qdrant collection(s); {QDRANT_URL_VAR} is unset.", collections.len());

		return Ok(());
	};
	let client = Qdrant::from_url(&url).build()?;

	for collection in collections {
		let deleted = time::timeout(QDRANT_TIMEOUT, client.delete_collection(collection.as_str()))
			.await
			.map_err(|_| Error::Message(format!("Deleting collection {collection} timed out.")))?;

		deleted?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn database_names_are_unique_quoted_identifiers() {
		let first = database_name();
		let second = database_name();

		assert_ne!(first, second);
		assert!(first.starts_with("ark_test_"));
		assert!(first.len() <= 63);
		assert!(first.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_'));
	}
}
