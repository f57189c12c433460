//! Configuration persistence
//!
//! Stores [`DeviceConfig`] as postcard in the flash key-value store.
//! Falls back to defaults if flash is empty or holds another layout version.

use defmt::*;

use g86_core::config::{DeviceConfig, CONFIG_VERSION};
use g86_hal_rp2040::flash::{FlashError, Rp2040FlashStorage, StorageKey};
// Import the FlashStorage trait to bring methods into scope
use g86_hal_rp2040::FlashStorageTrait;

/// Maximum serialized config size
const MAX_CONFIG_SIZE: usize = 256;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// Serialization failed
    Serialize,
    /// Config version mismatch
    VersionMismatch,
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

/// Defaults plus WiFi credentials baked in at build time
/// (`G86_WIFI_SSID`, `G86_WIFI_PASSWORD`)
pub fn default_config() -> DeviceConfig {
    let mut config = DeviceConfig::default();
    if let Some(ssid) = option_env!("G86_WIFI_SSID") {
        if config.wifi_ssid.push_str(ssid).is_err() {
            warn!("G86_WIFI_SSID too long, ignored");
            config.wifi_ssid.clear();
        }
    }
    if let Some(password) = option_env!("G86_WIFI_PASSWORD") {
        if config.wifi_password.push_str(password).is_err() {
            warn!("G86_WIFI_PASSWORD too long, ignored");
            config.wifi_password.clear();
        }
    }
    config
}

/// Configuration persistence manager
pub struct ConfigPersistence<'d> {
    storage: Rp2040FlashStorage<'d>,
}

impl<'d> ConfigPersistence<'d> {
    pub fn new(storage: Rp2040FlashStorage<'d>) -> Self {
        Self { storage }
    }

    /// Load configuration from flash
    pub async fn load(&mut self) -> Result<DeviceConfig, ConfigError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = self
            .storage
            .read(StorageKey::DeviceConfig, &mut buffer)
            .await?;

        debug!("Read {} bytes of config from flash", len);

        let mut config: DeviceConfig =
            postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Deserialize)?;

        if config.version != CONFIG_VERSION {
            warn!(
                "Config version mismatch: found {}, expected {}",
                config.version, CONFIG_VERSION
            );
            return Err(ConfigError::VersionMismatch);
        }

        if config.sanitize() {
            warn!("Stored config had out-of-range values");
        }
        Ok(config)
    }

    /// Load, or fall back to [`default_config`] on any failure
    pub async fn load_or_default(&mut self) -> DeviceConfig {
        match self.load().await {
            Ok(config) => {
                info!("Loaded configuration from flash");
                config
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                info!("No configuration in flash, using defaults");
                default_config()
            }
            Err(e @ (ConfigError::Deserialize | ConfigError::VersionMismatch)) => {
                warn!("Stored configuration unusable ({:?}), erasing", e);
                if let Err(e) = self.storage.erase_all().await {
                    error!("Config erase failed: {:?}", e);
                }
                default_config()
            }
            Err(e) => {
                warn!("Config read failed ({:?}), using defaults", e);
                default_config()
            }
        }
    }

    /// Write configuration to flash
    pub async fn save(&mut self, config: &DeviceConfig) -> Result<(), ConfigError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let bytes =
            postcard::to_slice(config, &mut buffer).map_err(|_| ConfigError::Serialize)?;
        self.storage
            .write(StorageKey::DeviceConfig, bytes)
            .await?;
        debug!("Saved {} bytes of config", bytes.len());
        Ok(())
    }
}
