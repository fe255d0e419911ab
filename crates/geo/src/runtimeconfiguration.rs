use std::path::{Path, PathBuf};

use bon::bon;
use inf::gdalinterop;

use crate::Result;

/// Process wide GDAL setup, applied once at startup before any raster is opened
pub struct RuntimeConfiguration {
    gdal_config: gdalinterop::Config,
}

#[bon]
impl RuntimeConfiguration {
    #[builder]
    pub fn new(
        proj_db: Option<&Path>,
        gdal_debug_log: Option<bool>,
        cache_size_mb: Option<usize>,
        #[builder(default)] config_options: Vec<(String, String)>,
    ) -> Self {
        let mut config_options = config_options;
        if let Some(cache_size) = cache_size_mb {
            config_options.push(("GDAL_CACHEMAX".to_string(), cache_size.to_string()));
        }

        // the inputs are opened by name, directory listings are never needed
        if !config_options.iter().any(|(key, _)| key == "GDAL_DISABLE_READDIR_ON_OPEN") {
            config_options.push(("GDAL_DISABLE_READDIR_ON_OPEN".to_string(), "EMPTY_DIR".to_string()));
        }

        Self {
            gdal_config: gdalinterop::Config {
                debug_logging: gdal_debug_log.unwrap_or(false),
                proj_db_search_location: proj_db.map(PathBuf::from),
                config_options,
            },
        }
    }

    pub fn apply(&self) -> Result<()> {
        self.gdal_config.apply()?;
        Ok(())
    }

    pub fn config_options(&self) -> &[(String, String)] {
        &self.gdal_config.config_options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_options() {
        let config = RuntimeConfiguration::builder().cache_size_mb(512).build();
        assert!(config.config_options().contains(&("GDAL_CACHEMAX".to_string(), "512".to_string())));

        let config = RuntimeConfiguration::builder()
            .config_options(vec![("GDAL_NUM_THREADS".to_string(), "2".to_string())])
            .build();
        assert_eq!(config.config_options()[0], ("GDAL_NUM_THREADS".to_string(), "2".to_string()));
        assert!(!config.config_options().iter().any(|(key, _)| key == "GDAL_CACHEMAX"));
    }

    #[test_log::test]
    fn apply_config() {
        let config = RuntimeConfiguration::builder().gdal_debug_log(false).build();
        config.apply().unwrap();
        assert_eq!(
            gdal::config::get_config_option("GDAL_DISABLE_READDIR_ON_OPEN", "").unwrap(),
            "EMPTY_DIR"
        );
    }
}
