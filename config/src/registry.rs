//! Stable key names for every runtime-overridable schema leaf.
//!
//! [`SystemConfigKey`] binds a symbolic name (kept even if the schema's field
//! names change) to a joined path. The table is checked against
//! [`SYSTEM_CONFIG_SCHEMA`] twice: by a `const` assertion that fails the
//! build, and by [`KeyRegistry::build`] at startup.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RegistryError;
use crate::schema::{str_eq, Leaf, Node, SEPARATOR};
use crate::types::SYSTEM_CONFIG_SCHEMA;

macro_rules! system_config_keys {
    ($($variant:ident = $name:literal => $path:literal,)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum SystemConfigKey {
            $($variant,)+
        }

        impl SystemConfigKey {
            /// Every key, in table order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// Joined schema path, used as the storage key.
            pub const fn path(self) -> &'static str {
                match self {
                    $(Self::$variant => $path,)+
                }
            }

            /// Stable symbolic name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn from_path(path: &str) -> Option<Self> {
                match path {
                    $($path => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

system_config_keys! {
    FfmpegCrf = "FFMPEG_CRF" => "ffmpeg.crf",
    FfmpegThreads = "FFMPEG_THREADS" => "ffmpeg.threads",
    FfmpegPreset = "FFMPEG_PRESET" => "ffmpeg.preset",
    FfmpegTargetVideoCodec = "FFMPEG_TARGET_VIDEO_CODEC" => "ffmpeg.targetVideoCodec",
    FfmpegAcceptedVideoCodecs = "FFMPEG_ACCEPTED_VIDEO_CODECS" => "ffmpeg.acceptedVideoCodecs",
    FfmpegTargetAudioCodec = "FFMPEG_TARGET_AUDIO_CODEC" => "ffmpeg.targetAudioCodec",
    FfmpegAcceptedAudioCodecs = "FFMPEG_ACCEPTED_AUDIO_CODECS" => "ffmpeg.acceptedAudioCodecs",
    FfmpegTargetResolution = "FFMPEG_TARGET_RESOLUTION" => "ffmpeg.targetResolution",
    FfmpegMaxBitrate = "FFMPEG_MAX_BITRATE" => "ffmpeg.maxBitrate",
    FfmpegBframes = "FFMPEG_BFRAMES" => "ffmpeg.bframes",
    FfmpegRefs = "FFMPEG_REFS" => "ffmpeg.refs",
    FfmpegGopSize = "FFMPEG_GOP_SIZE" => "ffmpeg.gopSize",
    FfmpegNpl = "FFMPEG_NPL" => "ffmpeg.npl",
    FfmpegTemporalAq = "FFMPEG_TEMPORAL_AQ" => "ffmpeg.temporalAQ",
    FfmpegCqMode = "FFMPEG_CQ_MODE" => "ffmpeg.cqMode",
    FfmpegTwoPass = "FFMPEG_TWO_PASS" => "ffmpeg.twoPass",
    FfmpegPreferredHwDevice = "FFMPEG_PREFERRED_HW_DEVICE" => "ffmpeg.preferredHwDevice",
    FfmpegTranscode = "FFMPEG_TRANSCODE" => "ffmpeg.transcode",
    FfmpegAccel = "FFMPEG_ACCEL" => "ffmpeg.accel",
    FfmpegAccelDecode = "FFMPEG_ACCEL_DECODE" => "ffmpeg.accelDecode",
    FfmpegTonemap = "FFMPEG_TONEMAP" => "ffmpeg.tonemap",

    JobThumbnailGenerationConcurrency = "JOB_THUMBNAIL_GENERATION_CONCURRENCY" => "job.thumbnailGeneration.concurrency",
    JobMetadataExtractionConcurrency = "JOB_METADATA_EXTRACTION_CONCURRENCY" => "job.metadataExtraction.concurrency",
    JobVideoConversionConcurrency = "JOB_VIDEO_CONVERSION_CONCURRENCY" => "job.videoConversion.concurrency",
    JobFaceDetectionConcurrency = "JOB_FACE_DETECTION_CONCURRENCY" => "job.faceDetection.concurrency",
    JobClipEncodingConcurrency = "JOB_CLIP_ENCODING_CONCURRENCY" => "job.smartSearch.concurrency",
    JobBackgroundTaskConcurrency = "JOB_BACKGROUND_TASK_CONCURRENCY" => "job.backgroundTask.concurrency",
    JobSearchConcurrency = "JOB_SEARCH_CONCURRENCY" => "job.search.concurrency",
    JobSidecarConcurrency = "JOB_SIDECAR_CONCURRENCY" => "job.sidecar.concurrency",
    JobLibraryConcurrency = "JOB_LIBRARY_CONCURRENCY" => "job.library.concurrency",
    JobMigrationConcurrency = "JOB_MIGRATION_CONCURRENCY" => "job.migration.concurrency",

    LibraryScanEnabled = "LIBRARY_SCAN_ENABLED" => "library.scan.enabled",
    LibraryScanCronExpression = "LIBRARY_SCAN_CRON_EXPRESSION" => "library.scan.cronExpression",
    LibraryWatchEnabled = "LIBRARY_WATCH_ENABLED" => "library.watch.enabled",

    LoggingEnabled = "LOGGING_ENABLED" => "logging.enabled",
    LoggingLevel = "LOGGING_LEVEL" => "logging.level",

    MachineLearningEnabled = "MACHINE_LEARNING_ENABLED" => "machineLearning.enabled",
    MachineLearningUrl = "MACHINE_LEARNING_URL" => "machineLearning.url",
    MachineLearningClipEnabled = "MACHINE_LEARNING_CLIP_ENABLED" => "machineLearning.clip.enabled",
    MachineLearningClipModelName = "MACHINE_LEARNING_CLIP_MODEL_NAME" => "machineLearning.clip.modelName",
    MachineLearningFacialRecognitionEnabled = "MACHINE_LEARNING_FACIAL_RECOGNITION_ENABLED" => "machineLearning.facialRecognition.enabled",
    MachineLearningFacialRecognitionModelName = "MACHINE_LEARNING_FACIAL_RECOGNITION_MODEL_NAME" => "machineLearning.facialRecognition.modelName",
    MachineLearningFacialRecognitionMinScore = "MACHINE_LEARNING_FACIAL_RECOGNITION_MIN_SCORE" => "machineLearning.facialRecognition.minScore",
    MachineLearningFacialRecognitionMaxDistance = "MACHINE_LEARNING_FACIAL_RECOGNITION_MAX_DISTANCE" => "machineLearning.facialRecognition.maxDistance",
    MachineLearningFacialRecognitionMinFaces = "MACHINE_LEARNING_FACIAL_RECOGNITION_MIN_FACES" => "machineLearning.facialRecognition.minFaces",

    MapEnabled = "MAP_ENABLED" => "map.enabled",
    MapLightStyle = "MAP_LIGHT_STYLE" => "map.lightStyle",
    MapDarkStyle = "MAP_DARK_STYLE" => "map.darkStyle",

    NotificationsSmtpEnabled = "NOTIFICATIONS_SMTP_ENABLED" => "notifications.smtp.enabled",
    NotificationsSmtpFrom = "NOTIFICATIONS_SMTP_FROM" => "notifications.smtp.from",
    NotificationsSmtpReplyTo = "NOTIFICATIONS_SMTP_REPLY_TO" => "notifications.smtp.replyTo",
    NotificationsSmtpTransportIgnoreCert = "NOTIFICATIONS_SMTP_TRANSPORT_IGNORE_CERT" => "notifications.smtp.transport.ignoreCert",
    NotificationsSmtpTransportHost = "NOTIFICATIONS_SMTP_TRANSPORT_HOST" => "notifications.smtp.transport.host",
    NotificationsSmtpTransportPort = "NOTIFICATIONS_SMTP_TRANSPORT_PORT" => "notifications.smtp.transport.port",
    NotificationsSmtpTransportUsername = "NOTIFICATIONS_SMTP_TRANSPORT_USERNAME" => "notifications.smtp.transport.username",
    NotificationsSmtpTransportPassword = "NOTIFICATIONS_SMTP_TRANSPORT_PASSWORD" => "notifications.smtp.transport.password",

    ReverseGeocodingEnabled = "REVERSE_GEOCODING_ENABLED" => "reverseGeocoding.enabled",
    NewVersionCheckEnabled = "NEW_VERSION_CHECK_ENABLED" => "newVersionCheck.enabled",

    OauthAutoLaunch = "OAUTH_AUTO_LAUNCH" => "oauth.autoLaunch",
    OauthAutoRegister = "OAUTH_AUTO_REGISTER" => "oauth.autoRegister",
    OauthButtonText = "OAUTH_BUTTON_TEXT" => "oauth.buttonText",
    OauthClientId = "OAUTH_CLIENT_ID" => "oauth.clientId",
    OauthClientSecret = "OAUTH_CLIENT_SECRET" => "oauth.clientSecret",
    OauthDefaultStorageQuota = "OAUTH_DEFAULT_STORAGE_QUOTA" => "oauth.defaultStorageQuota",
    OauthEnabled = "OAUTH_ENABLED" => "oauth.enabled",
    OauthIssuerUrl = "OAUTH_ISSUER_URL" => "oauth.issuerUrl",
    OauthMobileOverrideEnabled = "OAUTH_MOBILE_OVERRIDE_ENABLED" => "oauth.mobileOverrideEnabled",
    OauthMobileRedirectUri = "OAUTH_MOBILE_REDIRECT_URI" => "oauth.mobileRedirectUri",
    OauthScope = "OAUTH_SCOPE" => "oauth.scope",
    OauthSigningAlgorithm = "OAUTH_SIGNING_ALGORITHM" => "oauth.signingAlgorithm",
    OauthStorageLabelClaim = "OAUTH_STORAGE_LABEL_CLAIM" => "oauth.storageLabelClaim",
    OauthStorageQuotaClaim = "OAUTH_STORAGE_QUOTA_CLAIM" => "oauth.storageQuotaClaim",

    PasswordLoginEnabled = "PASSWORD_LOGIN_ENABLED" => "passwordLogin.enabled",

    ServerExternalDomain = "SERVER_EXTERNAL_DOMAIN" => "server.externalDomain",
    ServerLoginPageMessage = "SERVER_LOGIN_PAGE_MESSAGE" => "server.loginPageMessage",

    StorageTemplateEnabled = "STORAGE_TEMPLATE_ENABLED" => "storageTemplate.enabled",
    StorageTemplateHashVerificationEnabled = "STORAGE_TEMPLATE_HASH_VERIFICATION_ENABLED" => "storageTemplate.hashVerificationEnabled",
    StorageTemplate = "STORAGE_TEMPLATE" => "storageTemplate.template",

    ImageThumbnailFormat = "IMAGE_THUMBNAIL_FORMAT" => "image.thumbnailFormat",
    ImageThumbnailSize = "IMAGE_THUMBNAIL_SIZE" => "image.thumbnailSize",
    ImagePreviewFormat = "IMAGE_PREVIEW_FORMAT" => "image.previewFormat",
    ImagePreviewSize = "IMAGE_PREVIEW_SIZE" => "image.previewSize",
    ImageQuality = "IMAGE_QUALITY" => "image.quality",
    ImageColorspace = "IMAGE_COLORSPACE" => "image.colorspace",
    ImageExtractEmbedded = "IMAGE_EXTRACT_EMBEDDED" => "image.extractEmbedded",

    TrashEnabled = "TRASH_ENABLED" => "trash.enabled",
    TrashDays = "TRASH_DAYS" => "trash.days",

    ThemeCustomCss = "THEME_CUSTOM_CSS" => "theme.customCss",

    UserDeleteDelay = "USER_DELETE_DELAY" => "user.deleteDelay",
}

// A key whose path is not a schema leaf, or two keys sharing a name or path,
// fails compilation here.
const _: () = assert_sound(&SYSTEM_CONFIG_SCHEMA, SystemConfigKey::ALL);

const fn assert_sound(schema: &Node, keys: &[SystemConfigKey]) {
    let mut i = 0;
    while i < keys.len() {
        let key = keys[i];
        if !schema.contains(key.path()) {
            panic!("system config key path is not a schema leaf");
        }
        let mut j = i + 1;
        while j < keys.len() {
            if str_eq(key.path(), keys[j].path()) {
                panic!("two system config keys share a path");
            }
            if str_eq(key.name(), keys[j].name()) {
                panic!("two system config keys share a name");
            }
            j += 1;
        }
        i += 1;
    }
}

impl SystemConfigKey {
    /// The schema leaf this key stores.
    pub const fn leaf(self) -> Option<Leaf> {
        SYSTEM_CONFIG_SCHEMA.lookup(self.path())
    }
}

impl fmt::Display for SystemConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Parses a symbolic name (`TRASH_DAYS`) or a joined path (`trash.days`).
impl FromStr for SystemConfigKey {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .or_else(|| Self::from_path(s))
            .ok_or_else(|| RegistryError::UnknownKey(s.to_string()))
    }
}

impl Serialize for SystemConfigKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

impl<'de> Deserialize<'de> for SystemConfigKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let path = String::deserialize(deserializer)?;
        Self::from_path(&path)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown system config key '{path}'")))
    }
}

/// A registered (symbolic name, joined path) pair and the leaf it stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: &'static str,
    pub path: &'static str,
    pub leaf: Leaf,
}

/// Validated lookup tables over a key table and its schema.
#[derive(Debug)]
pub struct KeyRegistry {
    entries: Vec<RegistryEntry>,
    by_name: HashMap<&'static str, usize>,
    by_path: HashMap<&'static str, usize>,
    leaves: Vec<String>,
}

impl KeyRegistry {
    /// Checks every `(name, path)` pair against `schema` and indexes them.
    ///
    /// Fails on an invalid schema, a path that is not a leaf, or a name or
    /// path that appears twice. Leaves without an entry are allowed.
    pub fn build(
        schema: &Node,
        table: &[(&'static str, &'static str)],
    ) -> Result<Self, RegistryError> {
        let leaves: Vec<(String, Leaf)> = schema
            .paths()?
            .into_iter()
            .filter_map(|(path, leaf)| path.join(SEPARATOR).map(|joined| (joined, leaf)))
            .collect();
        let universe: HashMap<&str, Leaf> = leaves.iter().map(|(p, l)| (p.as_str(), *l)).collect();

        let mut entries: Vec<RegistryEntry> = Vec::with_capacity(table.len());
        let mut by_name = HashMap::with_capacity(table.len());
        let mut by_path = HashMap::with_capacity(table.len());

        for &(name, path) in table {
            let leaf = *universe
                .get(path)
                .ok_or_else(|| RegistryError::DanglingPath {
                    name: name.to_string(),
                    path: path.to_string(),
                })?;

            let index = entries.len();
            if by_name.insert(name, index).is_some() {
                return Err(RegistryError::DuplicateName {
                    name: name.to_string(),
                });
            }
            if let Some(first) = by_path.insert(path, index) {
                let first = &entries[first];
                return Err(RegistryError::DuplicatePath {
                    path: path.to_string(),
                    first: first.name.to_string(),
                    second: name.to_string(),
                });
            }
            entries.push(RegistryEntry { name, path, leaf });
        }

        tracing::debug!(
            keys = entries.len(),
            leaves = leaves.len(),
            "Key registry built"
        );

        Ok(Self {
            entries,
            by_name,
            by_path,
            leaves: leaves.into_iter().map(|(path, _)| path).collect(),
        })
    }

    /// Registry over [`SystemConfigKey`] and [`SYSTEM_CONFIG_SCHEMA`].
    pub fn system() -> Result<Self, RegistryError> {
        let table: Vec<_> = SystemConfigKey::ALL
            .iter()
            .map(|key| (key.name(), key.path()))
            .collect();
        Self::build(&SYSTEM_CONFIG_SCHEMA, &table)
    }

    /// Joined path registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&'static str, RegistryError> {
        self.entry(name)
            .map(|entry| entry.path)
            .ok_or_else(|| RegistryError::UnknownKey(name.to_string()))
    }

    pub fn entry(&self, name: &str) -> Option<&RegistryEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn entry_for_path(&self, path: &str) -> Option<&RegistryEntry> {
        self.by_path.get(path).map(|&i| &self.entries[i])
    }

    pub fn leaf_for_path(&self, path: &str) -> Option<Leaf> {
        self.entry_for_path(path).map(|entry| entry.leaf)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Registered paths in table order. The iterator is cheap to clone, so
    /// callers can walk it more than once.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + Clone + '_ {
        self.entries.iter().map(|entry| entry.path)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Schema leaves with no registry entry, in schema order.
    pub fn unregistered_leaves(&self) -> impl Iterator<Item = &str> + '_ {
        self.leaves
            .iter()
            .map(String::as_str)
            .filter(|path| !self.by_path.contains_key(*path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static SYSTEM_REGISTRY: LazyLock<Result<KeyRegistry, RegistryError>> =
    LazyLock::new(KeyRegistry::system);

/// The process-wide registry, built on first use and never mutated.
pub fn system_registry() -> Result<&'static KeyRegistry, RegistryError> {
    SYSTEM_REGISTRY.as_ref().map_err(Clone::clone)
}
