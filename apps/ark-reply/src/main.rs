use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = ark_reply::Args::parse();

	ark_reply::run(args).await
}
