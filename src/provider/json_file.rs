use crate::model::{IndexType, ProviderError, SceneStat};
use crate::normalizer::downsample;
use crate::provider::traits::{SceneProvider, SceneQuery};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SeriesFile {
    series: Vec<SeriesRecord>,
}

#[derive(Debug, Deserialize)]
struct SeriesRecord {
    entity_id: String,
    /// Attribute name as exported upstream, e.g. "ndvi".
    index_type: String,
    scenes: Vec<SceneStat>,
}

/// Reads scene statistics exported as a JSON document.
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn select(file: SeriesFile, query: &SceneQuery) -> Result<Vec<SceneStat>, ProviderError> {
        let mut found = false;
        let mut scenes = Vec::new();

        for record in file.series {
            if record.entity_id != query.entity_id {
                continue;
            }
            match record.index_type.parse::<IndexType>() {
                Ok(index) if index == query.index_type => {
                    found = true;
                    scenes.extend(record.scenes.into_iter().filter(|s| query.contains(s.sensing_date)));
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping series for {}: {}", record.entity_id, e),
            }
        }

        if !found {
            return Err(ProviderError::EntityNotFound {
                entity_id: query.entity_id.clone(),
                index_type: query.index_type,
            });
        }

        scenes.sort_by_key(|s| s.sensing_date);
        Ok(downsample(scenes, query.resolution))
    }
}

#[async_trait::async_trait]
impl SceneProvider for JsonFileProvider {
    async fn fetch(&self, query: &SceneQuery) -> Result<Vec<SceneStat>, ProviderError> {
        query.validate()?;
        let content = tokio::fs::read_to_string(&self.path).await?;
        let file: SeriesFile = serde_json::from_str(&content)?;
        let scenes = Self::select(file, query)?;
        debug!(
            "Loaded {} {} scenes for {} from {}",
            scenes.len(),
            query.index_type,
            query.entity_id,
            self.path.display()
        );
        Ok(scenes)
    }
}
