pub mod html;

use colored::Colorize;
use serde::Serialize;

use crate::filter::ViewState;
use crate::loader::LoadError;
use crate::model::{DeviceDetail, DeviceSpecs, DeviceSummary};
use crate::resolver::{RecordOrigin, ResolveError, ResolvedDevice};
use crate::utils;

pub const DEFAULT_LISTING_PAGE: &str = "download.html";
pub const NOT_AVAILABLE: &str = "N/A";
const ROM_NAME: &str = "havocOOS";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub synthesize_history: bool,
    pub listing_page: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            synthesize_history: false,
            listing_page: DEFAULT_LISTING_PAGE.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceCard {
    pub id: String,
    pub name: String,
    pub codename: String,
    pub brand: String,
    pub status: String,
    pub android_version: String,
    pub rom_version: String,
    pub build_date: String,
    pub size: String,
    pub detail_link: String,
    pub changelog_url: Option<String>,
}

impl From<&DeviceSummary> for DeviceCard {
    fn from(d: &DeviceSummary) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            codename: d.codename.clone(),
            brand: d.brand.to_lowercase(),
            status: d.status.label().to_string(),
            android_version: d.android_version.clone(),
            rom_version: d.rom_version.clone(),
            build_date: d.build_date.clone(),
            size: d.size.clone(),
            detail_link: utils::device_link(&d.id),
            changelog_url: d.changelog_url.clone(),
        }
    }
}

/// The list page. No cards means "no matches", which is not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogView {
    pub view: ViewState,
    pub brands: Vec<String>,
    pub cards: Vec<DeviceCard>,
}

impl CatalogView {
    pub fn no_matches(&self) -> bool {
        self.cards.is_empty()
    }
}

pub fn build_catalog_view(visible: &[DeviceSummary], view: &ViewState, brands: Vec<String>) -> CatalogView {
    CatalogView {
        view: view.clone(),
        brands,
        cards: visible.iter().map(DeviceCard::from).collect(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceHeader {
    pub status: String,
    pub name: String,
    pub codename: String,
    pub android_version: String,
    pub rom_version: String,
    pub brand: String,
    pub wallpaper: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildRow {
    pub version: String,
    pub build_type: String,
    pub date: String,
    pub size: String,
    pub android_version: String,
    pub md5: Option<String>,
    pub download_url: Option<String>,
    pub changelog: Vec<String>,
    pub latest: bool,
    pub synthetic: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InfoPanel {
    pub name: String,
    pub codename: String,
    pub brand: String,
    pub status: String,
    pub specs: DeviceSpecs,
    pub rom_version: String,
    pub android_version: String,
    pub latest_build_date: String,
    pub latest_build_size: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContactLink {
    pub label: String,
    pub href: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MaintainerPanel {
    pub name: String,
    pub handle: String,
    pub links: Vec<ContactLink>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceView {
    pub title: String,
    pub origin: RecordOrigin,
    pub header: DeviceHeader,
    pub builds: Vec<BuildRow>,
    pub info: Option<InfoPanel>,
    pub maintainer: Option<MaintainerPanel>,
    pub screenshots: Vec<String>,
    pub known_issues: Vec<String>,
    pub changelog_url: Option<String>,
}

pub fn build_device_view(resolved: &ResolvedDevice, options: &RenderOptions) -> DeviceView {
    let record = &resolved.record;
    let s = &record.summary;

    let mut builds: Vec<BuildRow> = record
        .builds
        .iter()
        .enumerate()
        .map(|(index, b)| BuildRow {
            version: b.version.clone(),
            build_type: b.build_type.label().to_string(),
            date: b.date.clone(),
            size: b.size.clone(),
            android_version: s.android_version.clone(),
            md5: Some(b.md5.clone()).filter(|m| !m.is_empty()),
            download_url: Some(b.download_url.clone()),
            changelog: b.changelog.clone(),
            latest: index == 0,
            synthetic: false,
        })
        .collect();
    if builds.is_empty() && options.synthesize_history {
        builds = synthesize_builds(s);
    }

    let info = record.device_info.as_ref().map(|specs| InfoPanel {
        name: s.name.clone(),
        codename: s.codename.clone(),
        brand: utils::capitalize_first(&s.brand),
        status: s.status.label().to_string(),
        specs: specs.clone(),
        rom_version: s.rom_version.clone(),
        android_version: s.android_version.clone(),
        latest_build_date: record
            .latest_build()
            .map(|b| b.date.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        latest_build_size: record
            .latest_build()
            .map(|b| b.size.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    });

    DeviceView {
        title: format!("{} - {ROM_NAME}", s.name),
        origin: resolved.origin,
        header: build_header(record),
        builds,
        info,
        maintainer: record.maintainer.as_ref().map(|m| {
            let mut links = Vec::new();
            if let Some(tg) = m.telegram.as_deref().filter(|v| !v.is_empty()) {
                links.push(ContactLink {
                    label: "Telegram".to_string(),
                    href: utils::telegram_url(tg),
                });
            }
            if let Some(xda) = m.xda.as_deref().filter(|v| !v.is_empty()) {
                links.push(ContactLink {
                    label: "XDA".to_string(),
                    href: xda.to_string(),
                });
            }
            if let Some(email) = m.email.as_deref().filter(|v| !v.is_empty()) {
                links.push(ContactLink {
                    label: "Email".to_string(),
                    href: utils::mailto_url(email),
                });
            }
            MaintainerPanel {
                name: m.name.clone(),
                handle: format!("@{}", m.username),
                links,
            }
        }),
        screenshots: record.screenshots.clone(),
        known_issues: record.known_issues.clone(),
        changelog_url: s.changelog_url.clone(),
    }
}

fn build_header(record: &DeviceDetail) -> DeviceHeader {
    let s = &record.summary;
    DeviceHeader {
        status: s.status.label().to_string(),
        name: s.name.clone(),
        codename: s.codename.clone(),
        android_version: s.android_version.clone(),
        rom_version: s.rom_version.clone(),
        brand: utils::capitalize_first(&s.brand),
        wallpaper: record
            .wallpaper
            .clone()
            .filter(|w| !w.is_empty())
            .unwrap_or_else(|| format!("images/{}.jpg", s.codename)),
    }
}

const SYNTHETIC_STEPS: [(f64, i64); 2] = [(0.1, 7), (0.2, 14)];

/// Display-only history for devices without a build list: the current
/// build from the summary plus up to two derived prior versions.
pub fn synthesize_builds(s: &DeviceSummary) -> Vec<BuildRow> {
    if s.rom_version.trim().is_empty() {
        return Vec::new();
    }
    let row = |version: String, date: String, latest: bool, synthetic: bool| BuildRow {
        version,
        build_type: crate::model::BuildType::Official.label().to_string(),
        date,
        size: s.size.clone(),
        android_version: s.android_version.clone(),
        md5: None,
        download_url: None,
        changelog: Vec::new(),
        latest,
        synthetic,
    };

    let mut rows = vec![row(s.rom_version.clone(), s.build_date.clone(), true, false)];
    for (delta, days) in SYNTHETIC_STEPS {
        let version = utils::shift_version(&s.rom_version, delta);
        let date = utils::shift_date(&s.build_date, days);
        if let (Some(version), Some(date)) = (version, date) {
            rows.push(row(version, date, false, true));
        }
    }
    rows
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorPanel {
    pub title: String,
    pub message: String,
    pub back_link: String,
}

impl ErrorPanel {
    pub fn for_catalog(_err: &LoadError, listing_page: &str) -> Self {
        Self {
            title: "Failed to load devices".to_string(),
            message: "Please try again later or contact support".to_string(),
            back_link: listing_page.to_string(),
        }
    }

    pub fn for_device(err: &ResolveError, listing_page: &str) -> Self {
        let message = match err {
            ResolveError::MissingId => "Device ID not found in URL",
            ResolveError::NotFound { .. } => "Device not found",
            ResolveError::Catalog(_) => "Failed to load device information",
        };
        Self {
            title: "Error".to_string(),
            message: message.to_string(),
            back_link: listing_page.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum Page {
    Catalog(CatalogView),
    Device(DeviceView),
    Error(ErrorPanel),
}

pub fn render(page: &Page, format: OutputFormat) -> Result<Vec<u8>, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(page)),
        OutputFormat::Json => render_json(page),
        OutputFormat::Html => Ok(html::render_html(page)),
    }
}

pub fn render_json(page: &Page) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = serde_json::to_vec_pretty(page)?;
    out.push(b'\n');
    Ok(out)
}

fn kv_line(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(":: {:<16}: {}\n", label, value));
}

pub fn render_text(page: &Page) -> Vec<u8> {
    let mut out = String::new();
    match page {
        Page::Catalog(view) => render_catalog_text(&mut out, view),
        Page::Device(view) => render_device_text(&mut out, view),
        Page::Error(panel) => {
            out.push_str(&format!(
                "{}{}{} {}\n",
                "[".bold().white(),
                "ERR".bold().red(),
                "]".bold().white(),
                panel.title.bold()
            ));
            out.push_str(&format!("    {}\n", panel.message));
            out.push_str(&format!("    Back to Downloads: {}\n", panel.back_link));
        }
    }
    out.into_bytes()
}

fn render_catalog_text(out: &mut String, view: &CatalogView) {
    kv_line(out, "Filter", &view.view.active_filter);
    if !view.view.query.is_empty() {
        kv_line(out, "Search", &view.view.query);
    }
    out.push('\n');
    if view.no_matches() {
        out.push_str(&format!("{}\n", "No devices found".yellow()));
        return;
    }
    for card in view.cards.iter() {
        out.push_str(&format!(
            "{} ({}) [{}] {}\n",
            card.name.bold(),
            card.codename,
            status_colored(&card.status),
            card.brand.dimmed()
        ));
        out.push_str(&format!(
            "    Android {} | {} {} | {} | {}\n",
            card.android_version, ROM_NAME, card.rom_version, card.build_date, card.size
        ));
        out.push_str(&format!("    {}\n", card.detail_link.cyan()));
    }
    out.push_str(&format!("\n{} device(s)\n", view.cards.len()));
}

fn status_colored(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "stable" => status.green().to_string(),
        "beta" => status.yellow().to_string(),
        _ => status.to_string(),
    }
}

fn render_device_text(out: &mut String, view: &DeviceView) {
    let h = &view.header;
    out.push_str(&format!(
        "{} [{}]\n",
        h.name.bold(),
        status_colored(&h.status)
    ));
    kv_line(out, "Codename", &h.codename);
    kv_line(out, "Brand", &h.brand);
    kv_line(out, "Android", &h.android_version);
    kv_line(out, ROM_NAME, &h.rom_version);
    out.push('\n');

    out.push_str(&format!("{}\n", "Downloads".bold()));
    if view.builds.is_empty() {
        out.push_str("    No downloads available\n");
    }
    for b in view.builds.iter() {
        let mut label = format!("v{} {}", b.version, b.build_type);
        if b.latest {
            label.push_str(&format!(" {}", "Latest".green()));
        }
        out.push_str(&format!("  {}\n", label));
        out.push_str(&format!("    Build Date: {} | File Size: {}\n", b.date, b.size));
        if let Some(md5) = b.md5.as_deref() {
            out.push_str(&format!("    MD5: {}\n", md5));
        }
        if let Some(url) = b.download_url.as_deref() {
            out.push_str(&format!("    {}\n", url.cyan()));
        }
        for item in b.changelog.iter() {
            out.push_str(&format!("      - {}\n", item));
        }
    }

    if let Some(info) = view.info.as_ref() {
        out.push('\n');
        out.push_str(&format!("{}\n", "Device Specifications".bold()));
        for (label, value) in spec_rows(&info.specs) {
            kv_line(out, label, value);
        }
        kv_line(out, "Latest Build", &info.latest_build_date);
        kv_line(out, "File Size", &info.latest_build_size);
    }

    if let Some(m) = view.maintainer.as_ref() {
        out.push('\n');
        out.push_str(&format!("{}\n", "Maintainer".bold()));
        out.push_str(&format!("    {} {}\n", m.name, m.handle.dimmed()));
        for link in m.links.iter() {
            out.push_str(&format!("    {}: {}\n", link.label, link.href));
        }
    }

    if !view.screenshots.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}\n", "Screenshots".bold()));
        for (index, shot) in view.screenshots.iter().enumerate() {
            out.push_str(&format!("    Screenshot {}: {}\n", index + 1, shot));
        }
    }

    if !view.known_issues.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}\n", "Known Issues".bold().yellow()));
        for issue in view.known_issues.iter() {
            out.push_str(&format!("    - {}\n", issue));
        }
    }
}

pub(crate) fn spec_rows(specs: &DeviceSpecs) -> Vec<(&'static str, &str)> {
    [
        ("Chipset", specs.chipset.as_deref()),
        ("CPU", specs.cpu.as_deref()),
        ("GPU", specs.gpu.as_deref()),
        ("RAM", specs.ram.as_deref()),
        ("Storage", specs.storage.as_deref()),
        ("Display", specs.display.as_deref()),
        ("Battery", specs.battery.as_deref()),
        ("Camera", specs.camera.as_deref()),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| (label, v)))
    .collect()
}
