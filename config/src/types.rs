use serde::{Deserialize, Serialize};

use crate::schema::Node;

/// Shape of [`SystemConfig`] as a static schema tree.
///
/// Must stay in step with the struct below; the `schema_matches_defaults`
/// test walks both.
pub const SYSTEM_CONFIG_SCHEMA: Node = crate::schema! {
    ffmpeg: {
        crf: Number,
        threads: Number,
        preset: Text,
        targetVideoCodec: Text,
        acceptedVideoCodecs: TextList,
        targetAudioCodec: Text,
        acceptedAudioCodecs: TextList,
        targetResolution: Text,
        maxBitrate: Text,
        bframes: Number,
        refs: Number,
        gopSize: Number,
        npl: Number,
        temporalAQ: Boolean,
        cqMode: Text,
        twoPass: Boolean,
        preferredHwDevice: Text,
        transcode: Text,
        accel: Text,
        accelDecode: Boolean,
        tonemap: Text,
    },
    job: {
        thumbnailGeneration: { concurrency: Number },
        metadataExtraction: { concurrency: Number },
        videoConversion: { concurrency: Number },
        faceDetection: { concurrency: Number },
        smartSearch: { concurrency: Number },
        backgroundTask: { concurrency: Number },
        search: { concurrency: Number },
        sidecar: { concurrency: Number },
        library: { concurrency: Number },
        migration: { concurrency: Number },
    },
    library: {
        scan: {
            enabled: Boolean,
            cronExpression: Text,
        },
        watch: {
            enabled: Boolean,
            usePolling: Boolean,
        },
    },
    logging: {
        enabled: Boolean,
        level: Text,
    },
    machineLearning: {
        enabled: Boolean,
        url: Text,
        clip: {
            enabled: Boolean,
            modelName: Text,
        },
        facialRecognition: {
            enabled: Boolean,
            modelName: Text,
            minScore: Number,
            maxDistance: Number,
            minFaces: Number,
        },
    },
    map: {
        enabled: Boolean,
        lightStyle: Text,
        darkStyle: Text,
    },
    notifications: {
        smtp: {
            enabled: Boolean,
            from: Text,
            replyTo: Text,
            transport: {
                ignoreCert: Boolean,
                host: Text,
                port: Number,
                username: Text,
                password: Text,
            },
        },
    },
    reverseGeocoding: {
        enabled: Boolean,
    },
    newVersionCheck: {
        enabled: Boolean,
    },
    oauth: {
        autoLaunch: Boolean,
        autoRegister: Boolean,
        buttonText: Text,
        clientId: Text,
        clientSecret: Text,
        defaultStorageQuota: Number | null,
        enabled: Boolean,
        issuerUrl: Text,
        mobileOverrideEnabled: Boolean,
        mobileRedirectUri: Text,
        scope: Text,
        signingAlgorithm: Text,
        storageLabelClaim: Text,
        storageQuotaClaim: Text,
    },
    passwordLogin: {
        enabled: Boolean,
    },
    server: {
        externalDomain: Text,
        loginPageMessage: Text,
    },
    storageTemplate: {
        enabled: Boolean,
        hashVerificationEnabled: Boolean,
        template: Text,
    },
    image: {
        thumbnailFormat: Text,
        thumbnailSize: Number,
        previewFormat: Text,
        previewSize: Number,
        quality: Number,
        colorspace: Text,
        extractEmbedded: Boolean,
    },
    trash: {
        enabled: Boolean,
        days: Number,
    },
    theme: {
        customCss: Text,
    },
    user: {
        deleteDelay: Number,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemConfig {
    pub ffmpeg: FfmpegConfig,
    pub job: JobConfig,
    pub library: LibraryConfig,
    pub logging: LoggingConfig,
    pub machine_learning: MachineLearningConfig,
    pub map: MapConfig,
    pub notifications: NotificationsConfig,
    pub reverse_geocoding: Toggle,
    pub new_version_check: Toggle,
    pub oauth: OAuthConfig,
    pub password_login: Toggle,
    pub server: ServerConfig,
    pub storage_template: StorageTemplateConfig,
    pub image: ImageConfig,
    pub trash: TrashConfig,
    pub theme: ThemeConfig,
    pub user: UserConfig,
}

impl SystemConfig {
    pub fn to_json(&self) -> Result<serde_json::Value, crate::ConfigError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, crate::ConfigError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// A section holding only an `enabled` flag, on by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toggle {
    pub enabled: bool,
}

impl Default for Toggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FfmpegConfig {
    pub crf: u32,
    pub threads: u32,
    pub preset: String,
    pub target_video_codec: String,
    pub accepted_video_codecs: Vec<String>,
    pub target_audio_codec: String,
    pub accepted_audio_codecs: Vec<String>,
    pub target_resolution: String,
    pub max_bitrate: String,
    pub bframes: i32,
    pub refs: u32,
    pub gop_size: u32,
    pub npl: u32,
    #[serde(rename = "temporalAQ")]
    pub temporal_aq: bool,
    pub cq_mode: String,
    pub two_pass: bool,
    pub preferred_hw_device: String,
    pub transcode: String,
    pub accel: String,
    pub accel_decode: bool,
    pub tonemap: String,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            crf: 23,
            threads: 0,
            preset: "ultrafast".to_string(),
            target_video_codec: "h264".to_string(),
            accepted_video_codecs: vec!["h264".to_string()],
            target_audio_codec: "aac".to_string(),
            accepted_audio_codecs: vec!["aac".to_string(), "mp3".to_string(), "libopus".to_string()],
            target_resolution: "720".to_string(),
            max_bitrate: "0".to_string(),
            bframes: -1,
            refs: 0,
            gop_size: 0,
            npl: 0,
            temporal_aq: false,
            cq_mode: "auto".to_string(),
            two_pass: false,
            preferred_hw_device: "auto".to_string(),
            transcode: "required".to_string(),
            accel: "disabled".to_string(),
            accel_decode: false,
            tonemap: "hable".to_string(),
        }
    }
}

/// Worker pool size for one job queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub concurrency: u32,
}

impl QueueConfig {
    const fn with(concurrency: u32) -> Self {
        Self { concurrency }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::with(5)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobConfig {
    pub thumbnail_generation: QueueConfig,
    pub metadata_extraction: QueueConfig,
    pub video_conversion: QueueConfig,
    pub face_detection: QueueConfig,
    pub smart_search: QueueConfig,
    pub background_task: QueueConfig,
    pub search: QueueConfig,
    pub sidecar: QueueConfig,
    pub library: QueueConfig,
    pub migration: QueueConfig,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            thumbnail_generation: QueueConfig::with(3),
            metadata_extraction: QueueConfig::with(5),
            video_conversion: QueueConfig::with(1),
            face_detection: QueueConfig::with(2),
            smart_search: QueueConfig::with(2),
            background_task: QueueConfig::with(5),
            search: QueueConfig::with(5),
            sidecar: QueueConfig::with(5),
            library: QueueConfig::with(5),
            migration: QueueConfig::with(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LibraryConfig {
    pub scan: LibraryScanConfig,
    pub watch: LibraryWatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LibraryScanConfig {
    pub enabled: bool,
    pub cron_expression: String,
}

impl Default for LibraryScanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron_expression: "0 0 * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct LibraryWatchConfig {
    pub enabled: bool,
    /// Not yet overridable at runtime; only settable from a config file.
    pub use_polling: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "log".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MachineLearningConfig {
    pub enabled: bool,
    pub url: String,
    pub clip: ClipConfig,
    pub facial_recognition: FacialRecognitionConfig,
}

impl Default for MachineLearningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://machine-learning:3003".to_string(),
            clip: ClipConfig::default(),
            facial_recognition: FacialRecognitionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClipConfig {
    pub enabled: bool,
    pub model_name: String,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_name: "ViT-B-32__openai".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FacialRecognitionConfig {
    pub enabled: bool,
    pub model_name: String,
    pub min_score: f64,
    pub max_distance: f64,
    pub min_faces: u32,
}

impl Default for FacialRecognitionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_name: "buffalo_l".to_string(),
            min_score: 0.7,
            max_distance: 0.5,
            min_faces: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    pub enabled: bool,
    pub light_style: String,
    pub dark_style: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            light_style: String::new(),
            dark_style: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotificationsConfig {
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SmtpConfig {
    pub enabled: bool,
    pub from: String,
    pub reply_to: String,
    pub transport: SmtpTransportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmtpTransportConfig {
    pub ignore_cert: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Default for SmtpTransportConfig {
    fn default() -> Self {
        Self {
            ignore_cert: false,
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OAuthConfig {
    pub auto_launch: bool,
    pub auto_register: bool,
    pub button_text: String,
    pub client_id: String,
    pub client_secret: String,
    /// Quota in GiB for auto-registered users; `None` means unlimited.
    pub default_storage_quota: Option<u64>,
    pub enabled: bool,
    pub issuer_url: String,
    pub mobile_override_enabled: bool,
    pub mobile_redirect_uri: String,
    pub scope: String,
    pub signing_algorithm: String,
    pub storage_label_claim: String,
    pub storage_quota_claim: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            auto_launch: false,
            auto_register: true,
            button_text: "Login with OAuth".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            default_storage_quota: None,
            enabled: false,
            issuer_url: String::new(),
            mobile_override_enabled: false,
            mobile_redirect_uri: String::new(),
            scope: "openid email profile".to_string(),
            signing_algorithm: "RS256".to_string(),
            storage_label_claim: "preferred_username".to_string(),
            storage_quota_claim: "quota".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub external_domain: String,
    pub login_page_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageTemplateConfig {
    pub enabled: bool,
    pub hash_verification_enabled: bool,
    pub template: String,
}

impl Default for StorageTemplateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hash_verification_enabled: true,
            template: "{{y}}/{{y}}-{{MM}}-{{dd}}/{{filename}}".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageConfig {
    pub thumbnail_format: String,
    pub thumbnail_size: u32,
    pub preview_format: String,
    pub preview_size: u32,
    pub quality: u32,
    pub colorspace: String,
    pub extract_embedded: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            thumbnail_format: "webp".to_string(),
            thumbnail_size: 250,
            preview_format: "jpeg".to_string(),
            preview_size: 1440,
            quality: 80,
            colorspace: "p3".to_string(),
            extract_embedded: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrashConfig {
    pub enabled: bool,
    pub days: u32,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            days: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeConfig {
    pub custom_css: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserConfig {
    /// Days between a deletion request and the purge of a user's data.
    pub delete_delay: u32,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self { delete_delay: 7 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ValueKind, SEPARATOR};
    use serde_json::Value;

    fn kind_of(value: &Value) -> Option<ValueKind> {
        match value {
            Value::String(_) => Some(ValueKind::Text),
            Value::Number(_) => Some(ValueKind::Number),
            Value::Bool(_) => Some(ValueKind::Boolean),
            Value::Array(items) if items.iter().all(Value::is_string) => Some(ValueKind::TextList),
            _ => None,
        }
    }

    fn count_leaves(value: &Value) -> usize {
        match value {
            Value::Object(map) => map.values().map(count_leaves).sum(),
            _ => 1,
        }
    }

    #[test]
    fn schema_matches_defaults() {
        let defaults = SystemConfig::default().to_json().unwrap();
        let paths = SYSTEM_CONFIG_SCHEMA.paths().unwrap();

        for (path, leaf) in &paths {
            let pointer = format!("/{}", path.segments().join("/"));
            let value = defaults
                .pointer(&pointer)
                .unwrap_or_else(|| panic!("{path} missing from SystemConfig"));
            if value.is_null() {
                assert!(leaf.nullable, "{path} defaults to null but is not nullable");
            } else {
                assert_eq!(kind_of(value), Some(leaf.kind), "kind of {path}");
            }
        }

        assert_eq!(count_leaves(&defaults), paths.len());
    }

    #[test]
    fn schema_paths_use_camel_case() {
        let paths = SYSTEM_CONFIG_SCHEMA.paths().unwrap();
        let joined: Vec<_> = paths
            .iter()
            .map(|(p, _)| p.join(SEPARATOR).unwrap())
            .collect();
        assert!(joined.contains(&"ffmpeg.temporalAQ".to_string()));
        assert!(joined.contains(&"notifications.smtp.transport.ignoreCert".to_string()));
        assert!(joined.contains(&"job.smartSearch.concurrency".to_string()));
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config = SystemConfig::from_json(serde_json::json!({
            "ffmpeg": { "crf": 30 },
            "trash": { "days": 5 }
        }))
        .unwrap();
        assert_eq!(config.ffmpeg.crf, 30);
        assert_eq!(config.ffmpeg.preset, "ultrafast");
        assert_eq!(config.trash.days, 5);
        assert!(config.trash.enabled);
        assert_eq!(config.job.video_conversion.concurrency, 1);
    }
}
