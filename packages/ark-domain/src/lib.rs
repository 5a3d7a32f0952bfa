pub mod annotation;
pub mod dataset;
pub mod invocation;

pub use annotation::{
	Annotation, AnnotationHistoryEntry, AnnotationSetting, DEFAULT_SCORE_THRESHOLD, MatchCandidate,
	NewAnnotationHistory,
};
pub use dataset::{CollectionBinding, DatasetView, IndexingTechnique};
pub use invocation::{HistorySource, InvocationSource};
