use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use ark_config::Error;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_value() -> Value {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn render(value: &Value) -> String {
	toml::to_string(value).expect("Failed to render template config.")
}

fn first_provider(value: &mut Value) -> &mut toml::Table {
	value
		.get_mut("providers")
		.and_then(|providers| providers.get_mut("embedding"))
		.and_then(Value::as_array_mut)
		.and_then(|entries| entries.first_mut())
		.and_then(Value::as_table_mut)
		.expect("Template config must include [[providers.embedding]].")
}

fn validation_message(raw: &str) -> String {
	match ark_config::parse(raw) {
		Err(Error::Validation { message }) => message,
		other => panic!("Expected validation error, got {other:?}"),
	}
}

fn write_temp_config(payload: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("Clock skew.").as_nanos();
	let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
	let path = env::temp_dir().join(format!("ark_config_test_{nanos}_{seq}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

#[test]
fn sample_config_loads_from_disk() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML);
	let cfg = ark_config::load(&path).expect("Expected sample config to load.");

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert_eq!(cfg.service.match_timeout_ms, 5_000);
	assert_eq!(cfg.providers.embedding.len(), 2);
	assert_eq!(cfg.providers.embedding[1].tenant_id.as_deref(), Some("tenant_alpha"));
	assert!(cfg.providers.embedding[0].serves("openai", "text-embedding-ada-002"));
	assert!(!cfg.providers.embedding[1].serves("openai", "text-embedding-ada-002"));
	assert_eq!(cfg.annotation.collection_purpose, "annotation");
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("ark_config_test_does_not_exist.toml");
	let err = ark_config::load(&path).expect_err("Expected missing file to fail.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}

#[test]
fn malformed_toml_reports_path() {
	let path = write_temp_config("[service\nlog_level = ");
	let err = ark_config::load(&path).expect_err("Expected malformed config to fail.");

	fs::remove_file(&path).expect("Failed to remove test config.");

	match err {
		Error::ParseConfig { path: reported, .. } => assert_eq!(reported, path),
		other => panic!("Expected parse error, got {other:?}"),
	}
}

#[test]
fn annotation_section_defaults_when_absent() {
	let mut value = sample_value();

	value.as_table_mut().expect("Template config must be a table.").remove("annotation");

	let cfg = ark_config::parse(&render(&value)).expect("Expected config without [annotation].");

	assert_eq!(cfg.annotation.collection_purpose, "annotation");
}

#[test]
fn match_timeout_defaults_when_absent() {
	let mut value = sample_value();

	value
		.get_mut("service")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [service].")
		.remove("match_timeout_ms");

	let cfg = ark_config::parse(&render(&value)).expect("Expected config without timeout.");

	assert_eq!(cfg.service.match_timeout_ms, 10_000);
}

#[test]
fn blank_tenant_is_normalized_to_shared() {
	let mut value = sample_value();
	let providers = value
		.get_mut("providers")
		.and_then(|providers| providers.get_mut("embedding"))
		.and_then(Value::as_array_mut)
		.expect("Template config must include [[providers.embedding]].");

	providers.truncate(1);
	providers[0]
		.as_table_mut()
		.expect("Provider entry must be a table.")
		.insert("tenant_id".to_string(), Value::String("  ".to_string()));

	let cfg = ark_config::parse(&render(&value)).expect("Expected blank tenant to normalize.");

	assert_eq!(cfg.providers.embedding[0].tenant_id, None);
}

#[test]
fn empty_api_key_is_rejected() {
	let mut value = sample_value();

	first_provider(&mut value).insert("api_key".to_string(), Value::String(" ".to_string()));

	assert_eq!(validation_message(&render(&value)), "Provider openai api_key must be non-empty.");
}

#[test]
fn zero_dimensions_are_rejected() {
	let mut value = sample_value();

	first_provider(&mut value).insert("dimensions".to_string(), Value::Integer(0));

	assert_eq!(
		validation_message(&render(&value)),
		"Provider openai dimensions must be greater than zero."
	);
}

#[test]
fn empty_model_list_is_rejected() {
	let mut value = sample_value();

	first_provider(&mut value).insert("models".to_string(), Value::Array(Vec::new()));

	assert_eq!(validation_message(&render(&value)), "Provider openai models must be non-empty.");
}

#[test]
fn duplicate_provider_for_same_tenant_is_rejected() {
	let mut value = sample_value();
	let providers = value
		.get_mut("providers")
		.and_then(|providers| providers.get_mut("embedding"))
		.and_then(Value::as_array_mut)
		.expect("Template config must include [[providers.embedding]].");

	providers[1].as_table_mut().expect("Provider entry must be a table.").remove("tenant_id");

	let message = validation_message(&render(&value));

	assert!(message.contains("declared more than once"), "Unexpected message: {message}");
}

#[test]
fn zero_pool_size_is_rejected() {
	let mut value = sample_value();

	value
		.get_mut("storage")
		.and_then(|storage| storage.get_mut("postgres"))
		.and_then(Value::as_table_mut)
		.expect("Template config must include [storage.postgres].")
		.insert("pool_max_conns".to_string(), Value::Integer(0));

	assert_eq!(
		validation_message(&render(&value)),
		"storage.postgres.pool_max_conns must be greater than zero."
	);
}

#[test]
fn missing_providers_are_rejected() {
	let mut value = sample_value();

	value
		.get_mut("providers")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [providers].")
		.insert("embedding".to_string(), Value::Array(Vec::new()));

	assert_eq!(
		validation_message(&render(&value)),
		"providers.embedding must contain at least one provider."
	);
}
