use crate::model::{IndexType, ProviderError, SceneStat};
use chrono::NaiveDate;

/// Scenes of one entity and index within `[start, end)`.
#[derive(Debug, Clone)]
pub struct SceneQuery {
    pub entity_id: String,
    pub index_type: IndexType,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Target number of scenes; longer series are thinned out.
    pub resolution: Option<usize>,
}

impl SceneQuery {
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.start >= self.end {
            return Err(ProviderError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Source of scene statistics. Implementations return scenes in chronological order.
#[async_trait::async_trait]
pub trait SceneProvider: Send + Sync {
    async fn fetch(&self, query: &SceneQuery) -> Result<Vec<SceneStat>, ProviderError>;
}
