use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use ark_config::Config;
use ark_domain::{Annotation, InvocationSource};
use ark_service::{AnnotationIndexer, AnnotationMatcher, Collaborators, MatchRequest};
use ark_storage::{db::Db, qdrant::QdrantStore};

#[derive(Debug, Parser)]
#[command(
	version = ark_cli::VERSION,
	rename_all = "kebab",
	styles = ark_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Look up the annotation that should answer a query.
	Match(MatchArgs),
	/// Embed one stored annotation into the index.
	Index(IndexArgs),
	/// Re-embed every stored annotation of an application.
	Reindex(ReindexArgs),
}

#[derive(Debug, clap::Args)]
pub struct MatchArgs {
	#[arg(long)]
	pub tenant_id: String,
	#[arg(long)]
	pub app_id: Uuid,
	#[arg(long)]
	pub query: String,
	#[arg(long, default_value = "anonymous")]
	pub user_id: String,
	/// Generated when omitted.
	#[arg(long)]
	pub message_id: Option<Uuid>,
	#[arg(long, default_value = "service-api")]
	pub source: InvocationSource,
}

#[derive(Debug, clap::Args)]
pub struct IndexArgs {
	#[arg(long)]
	pub tenant_id: String,
	#[arg(long)]
	pub annotation_id: Uuid,
}

#[derive(Debug, clap::Args)]
pub struct ReindexArgs {
	#[arg(long)]
	pub tenant_id: String,
	#[arg(long)]
	pub app_id: Uuid,
}

#[derive(Debug, Serialize)]
struct MatchOutput {
	matched: bool,
	annotation: Option<Annotation>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = ark_config::load(&args.config)?;

	init_tracing(&config)?;

	let collaborators = connect(&config).await?;
	let purpose = config.annotation.collection_purpose.clone();

	match args.command {
		Command::Match(cmd) => {
			let matcher = AnnotationMatcher::new(collaborators, purpose);
			let annotation = run_match(&matcher, &cmd, config.service.match_timeout_ms).await;
			let output = MatchOutput { matched: annotation.is_some(), annotation };

			println!("{}", serde_json::to_string_pretty(&output)?);
		},
		Command::Index(cmd) => {
			let Some(annotation) = collaborators.store.get_annotation(cmd.annotation_id).await?
			else {
				return Err(eyre::eyre!("Annotation {} does not exist.", cmd.annotation_id));
			};
			let indexer = AnnotationIndexer::new(collaborators, purpose);

			indexer.index_annotation(&cmd.tenant_id, &annotation).await?;
		},
		Command::Reindex(cmd) => {
			let indexer = AnnotationIndexer::new(collaborators, purpose);
			let report = indexer.reindex_app(&cmd.tenant_id, cmd.app_id).await?;

			println!("{}", serde_json::to_string_pretty(&report)?);
		},
	}

	Ok(())
}

async fn run_match(
	matcher: &AnnotationMatcher,
	cmd: &MatchArgs,
	timeout_ms: u64,
) -> Option<Annotation> {
	let req = MatchRequest {
		tenant_id: &cmd.tenant_id,
		app_id: cmd.app_id,
		message_id: cmd.message_id.unwrap_or_else(Uuid::new_v4),
		query: &cmd.query,
		user_id: &cmd.user_id,
		invoke_from: cmd.source,
	};

	match tokio::time::timeout(Duration::from_millis(timeout_ms), matcher.query(req)).await {
		Ok(annotation) => annotation,
		Err(_) => {
			tracing::warn!(app_id = %cmd.app_id, timeout_ms, "Annotation match timed out.");

			None
		},
	}
}

async fn connect(config: &Config) -> color_eyre::Result<Collaborators> {
	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let qdrant = QdrantStore::new(&config.storage.qdrant)?;

	Ok(Collaborators::from_stores(config, Arc::new(db), Arc::new(qdrant)))
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
