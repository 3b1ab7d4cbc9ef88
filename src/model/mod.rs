//! Catalog data model.
//!
//! Every type here is a read-only snapshot decoded from the catalog or a
//! per-device detail resource. Field names follow the camelCase keys served
//! by the site's JSON files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a device. Unknown labels are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum LifecycleStatus {
    Stable,
    Beta,
    Other(String),
}

impl LifecycleStatus {
    pub fn label(&self) -> &str {
        match self {
            Self::Stable => "Stable",
            Self::Beta => "Beta",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for LifecycleStatus {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "stable" => Self::Stable,
            "beta" => Self::Beta,
            _ => Self::Other(value),
        }
    }
}

impl From<LifecycleStatus> for String {
    fn from(value: LifecycleStatus) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Build flavour. Unknown labels are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum BuildType {
    Official,
    Unofficial,
    Other(String),
}

impl BuildType {
    pub fn label(&self) -> &str {
        match self {
            Self::Official => "Official",
            Self::Unofficial => "Unofficial",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for BuildType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "official" => Self::Official,
            "unofficial" => Self::Unofficial,
            _ => Self::Other(value),
        }
    }
}

impl From<BuildType> for String {
    fn from(value: BuildType) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lightweight listing entry from the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    pub codename: String,
    pub brand: String,
    pub status: LifecycleStatus,
    #[serde(default)]
    pub android_version: String,
    #[serde(default)]
    pub rom_version: String,
    #[serde(default)]
    pub build_date: String,
    #[serde(default)]
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub version: String,
    #[serde(rename = "type")]
    pub build_type: BuildType,
    pub date: String,
    pub size: String,
    #[serde(default)]
    pub md5: String,
    pub download_url: String,
    #[serde(default)]
    pub changelog: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Maintainer {
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xda: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Hardware specification block shown on the detail page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSpecs {
    pub chipset: Option<String>,
    pub cpu: Option<String>,
    pub gpu: Option<String>,
    pub ram: Option<String>,
    pub storage: Option<String>,
    pub display: Option<String>,
    pub battery: Option<String>,
    pub camera: Option<String>,
}

/// Richer per-device record: the summary fields plus builds and panels.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetail {
    #[serde(flatten)]
    pub summary: DeviceSummary,
    #[serde(default)]
    pub builds: Vec<Build>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<Maintainer>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub known_issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallpaper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceSpecs>,
}

impl DeviceDetail {
    /// The first build in source order, treated as the latest one.
    pub fn latest_build(&self) -> Option<&Build> {
        self.builds.first()
    }
}

impl From<DeviceSummary> for DeviceDetail {
    fn from(summary: DeviceSummary) -> Self {
        Self {
            summary,
            builds: Vec::new(),
            maintainer: None,
            screenshots: Vec::new(),
            known_issues: Vec::new(),
            wallpaper: None,
            device_info: None,
        }
    }
}

/// A per-device detail file as served. Summary fields may be omitted; the
/// catalog entry fills them in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailPayload {
    pub name: Option<String>,
    pub codename: Option<String>,
    pub brand: Option<String>,
    pub status: Option<LifecycleStatus>,
    pub android_version: Option<String>,
    pub rom_version: Option<String>,
    pub build_date: Option<String>,
    pub size: Option<String>,
    pub changelog_url: Option<String>,
    #[serde(default)]
    pub builds: Vec<Build>,
    pub maintainer: Option<Maintainer>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub known_issues: Vec<String>,
    pub wallpaper: Option<String>,
    pub device_info: Option<DeviceSpecs>,
}

impl DetailPayload {
    /// Lays the detail over `summary`. The catalog id and `dataFile`
    /// reference are kept; any id inside the detail file is ignored.
    pub fn merge(self, summary: &DeviceSummary) -> DeviceDetail {
        let pick = |value: Option<String>, fallback: &String| {
            value
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| fallback.clone())
        };
        DeviceDetail {
            summary: DeviceSummary {
                id: summary.id.clone(),
                name: pick(self.name, &summary.name),
                codename: pick(self.codename, &summary.codename),
                brand: pick(self.brand, &summary.brand),
                status: self.status.unwrap_or_else(|| summary.status.clone()),
                android_version: pick(self.android_version, &summary.android_version),
                rom_version: pick(self.rom_version, &summary.rom_version),
                build_date: pick(self.build_date, &summary.build_date),
                size: pick(self.size, &summary.size),
                data_file: summary.data_file.clone(),
                changelog_url: self.changelog_url.or_else(|| summary.changelog_url.clone()),
            },
            builds: self.builds,
            maintainer: self.maintainer,
            screenshots: self.screenshots,
            known_issues: self.known_issues,
            wallpaper: self.wallpaper,
            device_info: self.device_info,
        }
    }
}
