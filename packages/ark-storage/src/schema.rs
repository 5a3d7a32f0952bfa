pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_dataset_collection_bindings.sql" => out
					.push_str(include_str!("../../../sql/tables/001_dataset_collection_bindings.sql")),
				"tables/002_app_annotation_settings.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_app_annotation_settings.sql")),
				"tables/003_message_annotations.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_message_annotations.sql")),
				"tables/004_app_annotation_hit_histories.sql" => out.push_str(include_str!(
					"../../../sql/tables/004_app_annotation_hit_histories.sql"
				)),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expands_every_table_include() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "), "Unexpanded include left in schema.");

		for table in [
			"dataset_collection_bindings",
			"app_annotation_settings",
			"message_annotations",
			"app_annotation_hit_histories",
		] {
			assert!(
				sql.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
				"Missing table {table}."
			);
		}
	}
}
