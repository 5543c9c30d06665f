use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::alert::{
    parse_contact_env, validate_contacts, EmergencyContact, GatewayCredentials,
    MIN_ALERT_COOLDOWN_SECS,
};
use crate::detect::WeaponClass;
use crate::filter::ClassProfile;
use crate::ingest::CameraConfig;

const DEFAULT_USER_NAME: &str = "SafeSphere User";
const DEFAULT_ALERT_COOLDOWN_SECS: u64 = 300;
const DEFAULT_HISTORY_LENGTH: usize = 5;
const DEFAULT_QUORUM: usize = 3;
const DEFAULT_API_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_MODEL_PATH: &str = "stub://detector";
const DEFAULT_SIREN_DURATION_SECS: u64 = 4;

#[derive(Debug, Deserialize, Default)]
struct SentinelConfigFile {
    user_name: Option<String>,
    emergency_contacts: Option<Vec<String>>,
    alert_cooldown_secs: Option<u64>,
    history_length: Option<usize>,
    quorum: Option<usize>,
    classes: Option<HashMap<String, ClassProfileFile>>,
    camera: Option<CameraConfigFile>,
    api: Option<ApiConfigFile>,
    model_path: Option<String>,
    location_hint: Option<String>,
    messenger: Option<MessengerConfigFile>,
    sms: Option<SmsConfigFile>,
    siren: Option<SirenConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassProfileFile {
    confidence_threshold: Option<f32>,
    size_bounds: Option<(f32, f32)>,
    high_risk: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiConfigFile {
    addr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessengerConfigFile {
    gateway_url: String,
    recipient: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SmsConfigFile {
    gateway_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize, Default)]
struct SirenConfigFile {
    enabled: Option<bool>,
    sound_path: Option<String>,
    duration_secs: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct MessengerSettings {
    pub gateway_url: String,
    pub recipient: String,
    pub credentials: GatewayCredentials,
}

#[derive(Clone, Debug)]
pub struct SmsSettings {
    pub gateway_url: String,
    pub credentials: GatewayCredentials,
}

#[derive(Clone, Debug)]
pub struct SirenSettings {
    pub enabled: bool,
    pub sound_path: Option<String>,
    pub duration_secs: u64,
}

impl Default for SirenSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sound_path: None,
            duration_secs: DEFAULT_SIREN_DURATION_SECS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SentinelConfig {
    pub user_name: String,
    pub contacts: Vec<EmergencyContact>,
    pub alert_cooldown_secs: u64,
    pub history_length: usize,
    pub quorum: usize,
    pub classes: HashMap<WeaponClass, ClassProfile>,
    pub camera: CameraConfig,
    pub api_addr: String,
    pub model_path: String,
    pub location_hint: Option<String>,
    pub messenger: Option<MessengerSettings>,
    pub sms: Option<SmsSettings>,
    pub siren: SirenSettings,
}

impl SentinelConfig {
    /// Load from the file named by `SENTRY_CONFIG` (when set), then apply
    /// `SENTRY_*` environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SENTRY_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => SentinelConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env();
        cfg.validate();
        Ok(cfg)
    }

    fn from_file(file: SentinelConfigFile) -> Self {
        let mut classes: HashMap<WeaponClass, ClassProfile> = WeaponClass::all()
            .iter()
            .map(|&class| (class, ClassProfile::default_for(class)))
            .collect();
        for (label, overrides) in file.classes.unwrap_or_default() {
            let Some(class) = WeaponClass::from_label(&label) else {
                log::warn!("ignoring unknown weapon class {:?} in config", label);
                continue;
            };
            let profile = classes.entry(class).or_insert(ClassProfile::default_for(class));
            if let Some(threshold) = overrides.confidence_threshold {
                profile.confidence_threshold = threshold;
            }
            if let Some(bounds) = overrides.size_bounds {
                profile.size_bounds = Some(bounds);
            }
            if let Some(high_risk) = overrides.high_risk {
                profile.high_risk = high_risk;
            }
        }

        let camera_file = file.camera.unwrap_or_default();
        let camera_defaults = CameraConfig::default();
        let camera = CameraConfig {
            url: camera_file.url.unwrap_or(camera_defaults.url),
            target_fps: camera_file.target_fps.unwrap_or(camera_defaults.target_fps),
            width: camera_file.width.unwrap_or(camera_defaults.width),
            height: camera_file.height.unwrap_or(camera_defaults.height),
        };

        let siren_file = file.siren.unwrap_or_default();
        let siren = SirenSettings {
            enabled: siren_file.enabled.unwrap_or(false),
            sound_path: siren_file.sound_path,
            duration_secs: siren_file
                .duration_secs
                .unwrap_or(DEFAULT_SIREN_DURATION_SECS),
        };

        Self {
            user_name: file
                .user_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            contacts: validate_contacts(&file.emergency_contacts.unwrap_or_default()),
            alert_cooldown_secs: file
                .alert_cooldown_secs
                .unwrap_or(DEFAULT_ALERT_COOLDOWN_SECS),
            history_length: file.history_length.unwrap_or(DEFAULT_HISTORY_LENGTH),
            quorum: file.quorum.unwrap_or(DEFAULT_QUORUM),
            classes,
            camera,
            api_addr: file
                .api
                .and_then(|api| api.addr)
                .unwrap_or_else(|| DEFAULT_API_ADDR.to_string()),
            model_path: file
                .model_path
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            location_hint: file.location_hint,
            messenger: file.messenger.map(|m| MessengerSettings {
                gateway_url: m.gateway_url,
                recipient: m.recipient,
                credentials: GatewayCredentials::new(m.api_key),
            }),
            sms: file.sms.map(|s| SmsSettings {
                gateway_url: s.gateway_url,
                credentials: GatewayCredentials::new(s.api_key),
            }),
            siren,
        }
    }

    fn apply_env(&mut self) {
        if let Ok(name) = std::env::var("SENTRY_USER_NAME") {
            if !name.trim().is_empty() {
                self.user_name = name.trim().to_string();
            }
        }
        if let Ok(contacts) = std::env::var("SENTRY_EMERGENCY_CONTACTS") {
            if !contacts.trim().is_empty() {
                self.contacts = validate_contacts(&parse_contact_env(&contacts));
            }
        }
        if let Ok(cooldown) = std::env::var("SENTRY_ALERT_COOLDOWN_SECS") {
            match cooldown.parse::<u64>() {
                Ok(secs) => self.alert_cooldown_secs = secs,
                Err(_) => log::warn!(
                    "SENTRY_ALERT_COOLDOWN_SECS {:?} is not an integer, keeping {}s",
                    cooldown,
                    self.alert_cooldown_secs
                ),
            }
        }
        if let Ok(url) = std::env::var("SENTRY_CAMERA_URL") {
            if !url.trim().is_empty() {
                self.camera.url = url;
            }
        }
        if let Ok(addr) = std::env::var("SENTRY_API_ADDR") {
            if !addr.trim().is_empty() {
                self.api_addr = addr;
            }
        }
        if let Ok(path) = std::env::var("SENTRY_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = path;
            }
        }
        if let Ok(hint) = std::env::var("SENTRY_LOCATION_HINT") {
            if !hint.trim().is_empty() {
                self.location_hint = Some(hint);
            }
        }
        if let Ok(key) = std::env::var("SENTRY_MESSENGER_API_KEY") {
            match self.messenger.as_mut() {
                Some(messenger) => messenger.credentials = GatewayCredentials::new(key),
                None => log::warn!("SENTRY_MESSENGER_API_KEY set but no messenger configured"),
            }
        }
        if let Ok(recipient) = std::env::var("SENTRY_MESSENGER_RECIPIENT") {
            match self.messenger.as_mut() {
                Some(messenger) => messenger.recipient = recipient,
                None => log::warn!("SENTRY_MESSENGER_RECIPIENT set but no messenger configured"),
            }
        }
        if let Ok(key) = std::env::var("SENTRY_SMS_API_KEY") {
            match self.sms.as_mut() {
                Some(sms) => sms.credentials = GatewayCredentials::new(key),
                None => log::warn!("SENTRY_SMS_API_KEY set but no sms gateway configured"),
            }
        }
    }

    /// Clamp out-of-range values to safe defaults instead of failing.
    fn validate(&mut self) {
        if self.alert_cooldown_secs < MIN_ALERT_COOLDOWN_SECS {
            log::warn!(
                "alert cooldown {}s below floor, using {}s",
                self.alert_cooldown_secs,
                MIN_ALERT_COOLDOWN_SECS
            );
            self.alert_cooldown_secs = MIN_ALERT_COOLDOWN_SECS;
        }
        if self.history_length == 0 {
            log::warn!("history_length 0 is invalid, using {}", DEFAULT_HISTORY_LENGTH);
            self.history_length = DEFAULT_HISTORY_LENGTH;
        }
        if self.quorum == 0 {
            log::warn!("quorum 0 is invalid, using 1");
            self.quorum = 1;
        }
        if self.quorum > self.history_length {
            log::warn!(
                "quorum {} exceeds history length {}, clamping",
                self.quorum,
                self.history_length
            );
            self.quorum = self.history_length;
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            let defaults = CameraConfig::default();
            log::warn!(
                "camera dimensions {}x{} are invalid, using {}x{}",
                self.camera.width,
                self.camera.height,
                defaults.width,
                defaults.height
            );
            self.camera.width = defaults.width;
            self.camera.height = defaults.height;
        }
        if self.contacts.is_empty() {
            log::warn!("no valid emergency contacts; sms channel will have no recipients");
        }
    }

    /// Classes exempt from temporal smoothing.
    pub fn high_risk_classes(&self) -> std::collections::BTreeSet<WeaponClass> {
        self.classes
            .iter()
            .filter(|(_, profile)| profile.high_risk)
            .map(|(&class, _)| class)
            .collect()
    }
}

impl Default for SentinelConfig {
    fn default() -> Self {
        let mut cfg = Self::from_file(SentinelConfigFile::default());
        cfg.validate();
        cfg
    }
}

fn read_config_file(path: &Path) -> Result<SentinelConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
