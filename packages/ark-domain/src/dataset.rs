use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared vector storage for every application using one embedding configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionBinding {
	pub binding_id: Uuid,
	pub provider_name: String,
	pub model_name: String,
	pub purpose: String,
	pub collection_name: String,
}
impl CollectionBinding {
	pub fn collection_name_for(binding_id: Uuid) -> String {
		format!("Vector_index_{}_Node", binding_id.to_string().replace('-', "_"))
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingTechnique {
	HighQuality,
	Economy,
}
impl IndexingTechnique {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::HighQuality => "high_quality",
			Self::Economy => "economy",
		}
	}
}

/// Logical dataset scoped to one application inside a shared collection.
///
/// Points belonging to the application carry `group_id == id`.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetView {
	pub id: Uuid,
	pub tenant_id: String,
	pub indexing_technique: IndexingTechnique,
	pub embedding_provider: String,
	pub embedding_model: String,
	pub binding: CollectionBinding,
}
impl DatasetView {
	pub fn for_annotations(app_id: Uuid, tenant_id: &str, binding: CollectionBinding) -> Self {
		Self {
			id: app_id,
			tenant_id: tenant_id.to_string(),
			indexing_technique: IndexingTechnique::HighQuality,
			embedding_provider: binding.provider_name.clone(),
			embedding_model: binding.model_name.clone(),
			binding,
		}
	}

	pub fn collection_name(&self) -> &str {
		&self.binding.collection_name
	}

	pub fn group_id(&self) -> String {
		self.id.to_string()
	}
}
