use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::filter::{self, ViewState, ALL_BRANDS};
use crate::loader::{Catalog, CatalogLoader, Fetcher, LoadError, Location};
use crate::model::{DeviceSummary, LifecycleStatus};
use crate::output::{self, OutputFormat, Page, RenderOptions};
use crate::resolver::{self, RecordOrigin, ResolveError, Resolver};
use crate::runner::{CatalogSession, Options, Runner};

fn device(id: &str, brand: &str, name: &str, codename: &str) -> DeviceSummary {
    DeviceSummary {
        id: id.to_string(),
        name: name.to_string(),
        codename: codename.to_string(),
        brand: brand.to_string(),
        status: LifecycleStatus::Stable,
        android_version: "14".to_string(),
        rom_version: "2.0".to_string(),
        build_date: "2024-03-05".to_string(),
        size: "1.5 GB".to_string(),
        data_file: None,
        changelog_url: None,
    }
}

fn scenario_catalog() -> Vec<DeviceSummary> {
    vec![
        device("a", "Acme", "Foo", "foo1"),
        device("b", "Zenith", "Bar", "bar1"),
    ]
}

fn wide_catalog() -> Vec<DeviceSummary> {
    vec![
        device("alioth", "xiaomi", "POCO F3", "alioth"),
        device("sweet", "Xiaomi", "Redmi Note 10 Pro", "sweet"),
        device("lemonadep", "oneplus", "OnePlus 9 Pro", "lemonadep"),
        device("oriole", "Google", "Pixel 6", "oriole"),
        device("raven", "google", "Pixel 6 Pro", "raven"),
        device("x", "Acme", "Foo", "POCOish"),
    ]
}

fn ids(devices: &[DeviceSummary]) -> Vec<&str> {
    devices.iter().map(|d| d.id.as_str()).collect()
}

fn local_catalog(devices: Vec<DeviceSummary>) -> Catalog {
    Catalog::new(devices, Location::Local(PathBuf::from("/nonexistent/devices.json")))
}

fn test_fetcher() -> Fetcher {
    Fetcher::new(
        reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap(),
    )
}

fn write_json(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, body).unwrap();
    path
}

/// Serves canned responses keyed by request path until the test ends.
async fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes: HashMap<&'static str, (u16, &'static str)> = routes
        .into_iter()
        .map(|(path, status, body)| (path, (status, body)))
        .collect();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
            let (status, body) = routes.get(path.as_str()).copied().unwrap_or((404, "{}"));
            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{addr}")
}

const DETAIL_JSON: &str = r#"{
    "id": "alioth",
    "name": "POCO F3",
    "codename": "alioth",
    "brand": "xiaomi",
    "status": "Stable",
    "androidVersion": "14",
    "romVersion": "2.0",
    "buildDate": "2024-03-05",
    "size": "1.5 GB",
    "builds": [
        {"version": "2.0", "type": "Official", "date": "2024-03-05", "size": "1.5 GB",
         "md5": "d41d8cd9", "downloadUrl": "https://dl.example/alioth-2.0.zip",
         "changelog": ["March security patch", "Camera fixes"]},
        {"version": "1.9", "type": "Official", "date": "2024-02-01", "size": "1.4 GB",
         "md5": "aa11bb22", "downloadUrl": "https://dl.example/alioth-1.9.zip",
         "changelog": []}
    ],
    "maintainer": {"name": "Jane", "username": "jane", "telegram": "@jane_dev",
                   "email": "jane@example.com"},
    "screenshots": ["img/1.png"],
    "knownIssues": ["NFC flaky"],
    "deviceInfo": {"chipset": "Snapdragon 870", "ram": "8 GB"}
}"#;

const CATALOG_WITH_DETAIL: &str = r#"{"devices": [
    {"id": "alioth", "name": "POCO F3", "codename": "alioth", "brand": "xiaomi",
     "status": "Stable", "androidVersion": "14", "romVersion": "2.0",
     "buildDate": "2024-03-05", "size": "1.5 GB",
     "dataFile": "devices/alioth.json", "changelogUrl": "https://example.com/changelog"},
    {"id": "oriole", "name": "Pixel 6", "codename": "oriole", "brand": "google",
     "status": "Beta", "androidVersion": "14", "romVersion": "1.0",
     "buildDate": "2024-01-10", "size": "1.2 GB"}
]}"#;

// Laid out like the published site: the catalog under data/, detail
// references relative to the site root.
const SITE_CATALOG: &str = r#"[
    {"id": "alioth", "name": "POCO F3", "codename": "alioth", "brand": "xiaomi",
     "status": "Stable", "androidVersion": "14", "romVersion": "2.0",
     "buildDate": "2024-03-05", "size": "1.5 GB",
     "dataFile": "data/devices/alioth.json"}
]"#;

#[test]
fn scenario_brand_filter_is_case_insensitive() {
    let out = filter::visible(&scenario_catalog(), "acme", "");
    assert_eq!(ids(&out), vec!["a"]);
}

#[test]
fn scenario_query_across_all_brands() {
    let out = filter::visible(&scenario_catalog(), ALL_BRANDS, "bar");
    assert_eq!(ids(&out), vec!["b"]);
}

#[test]
fn brand_filter_without_query_selects_exact_brand() {
    let catalog = wide_catalog();
    for f in ["xiaomi", "GOOGLE", "OnePlus", "acme", "nokia"] {
        let out = filter::visible(&catalog, f, "");
        let expected: Vec<&str> = catalog
            .iter()
            .filter(|d| d.brand.to_lowercase() == f.to_lowercase())
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids(&out), expected, "filter {f}");
    }
    assert_eq!(filter::visible(&catalog, ALL_BRANDS, ""), catalog);
}

#[test]
fn query_results_match_and_nothing_else_does() {
    let catalog = wide_catalog();
    for q in ["poco", "PRO", "6", "ali", "zzz", "o"] {
        let out = filter::visible(&catalog, ALL_BRANDS, q);
        let needle = q.to_lowercase();
        let hit = |d: &DeviceSummary| {
            d.name.to_lowercase().contains(&needle) || d.codename.to_lowercase().contains(&needle)
        };
        assert!(out.iter().all(|d| hit(d)), "query {q}");
        let outside = catalog.iter().filter(|d| !out.contains(*d));
        for d in outside {
            assert!(!hit(d), "query {q} missed {}", d.id);
        }
    }
}

#[test]
fn filtering_is_idempotent_and_order_preserving() {
    let catalog = wide_catalog();
    for (f, q) in [("all", ""), ("xiaomi", "o"), ("google", "pro"), ("all", "poco"), ("acme", "x")] {
        let once = filter::visible(&catalog, f, q);
        let twice = filter::visible(&once, f, q);
        assert_eq!(once, twice);
        let positions: Vec<usize> = once
            .iter()
            .map(|d| catalog.iter().position(|c| c.id == d.id).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn empty_result_is_no_matches_not_error() {
    let catalog = local_catalog(scenario_catalog());
    let view = crate::runner::catalog_view(&catalog, &ViewState::new("acme", "bar"));
    assert!(view.no_matches());
    assert_eq!(view.brands, vec!["acme", "zenith"]);
    let text = String::from_utf8(output::render_text(&Page::Catalog(view))).unwrap();
    assert!(text.contains("No devices found"));
}

#[test]
fn resolve_lookup_reports_missing_and_unknown_ids() {
    let catalog = scenario_catalog();
    assert!(matches!(
        resolver::lookup("c", &catalog),
        Err(ResolveError::NotFound { id }) if id == "c"
    ));
    assert_eq!(resolver::lookup("b", &catalog).unwrap().name, "Bar");
    assert!(matches!(resolver::require_id(None), Err(ResolveError::MissingId)));
    assert!(matches!(resolver::require_id(Some("  ")), Err(ResolveError::MissingId)));
}

#[tokio::test]
async fn ids_are_matched_verbatim() {
    assert_eq!(resolver::require_id(Some(" a ")).unwrap(), " a ");
    let resolver = Resolver::new(test_fetcher(), None);
    let catalog = local_catalog(scenario_catalog());
    let err = resolver.resolve(Some(" a "), &catalog).await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { id } if id == " a "));
    let err = resolver.resolve(Some("A"), &catalog).await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { .. }));
}

#[tokio::test]
async fn scenario_resolve_unknown_id_is_not_found() {
    let resolver = Resolver::new(test_fetcher(), None);
    let catalog = local_catalog(scenario_catalog());
    let err = resolver.resolve(Some("c"), &catalog).await.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { .. }));
}

#[tokio::test]
async fn scenario_missing_id_never_touches_catalog() {
    // The catalog path does not exist, so any load attempt would fail differently.
    let runner = Runner::new(Options {
        catalog: "/nonexistent/romcatalog/devices.json".to_string(),
        ..Options::default()
    })
    .unwrap();
    let err = runner.device(None).await.unwrap_err();
    assert!(matches!(err, ResolveError::MissingId));
}

#[tokio::test]
async fn summary_without_data_file_resolves_to_itself() {
    let resolver = Resolver::new(test_fetcher(), None);
    let catalog = local_catalog(scenario_catalog());
    let resolved = resolver.resolve(Some("a"), &catalog).await.unwrap();
    assert_eq!(resolved.origin, RecordOrigin::Summary);
    assert_eq!(resolved.record.summary, scenario_catalog()[0]);
}

#[tokio::test]
async fn local_catalog_and_detail_resolve_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = write_json(dir.path(), "devices.json", CATALOG_WITH_DETAIL);
    write_json(dir.path(), "devices/alioth.json", DETAIL_JSON);

    let runner = Runner::new(Options {
        catalog: catalog_path.to_string_lossy().to_string(),
        ..Options::default()
    })
    .unwrap();
    let resolved = runner.resolve(Some("alioth")).await.unwrap();
    assert_eq!(resolved.origin, RecordOrigin::Detail);
    assert_eq!(resolved.record.builds.len(), 2);

    let view = output::build_device_view(&resolved, &RenderOptions::default());
    assert_eq!(view.title, "POCO F3 - havocOOS");
    assert_eq!(view.header.brand, "Xiaomi");
    assert_eq!(view.header.wallpaper, "images/alioth.jpg");
    assert!(view.builds[0].latest);
    assert!(!view.builds[1].latest);
    let info = view.info.as_ref().unwrap();
    assert_eq!(info.latest_build_date, "2024-03-05");
    assert_eq!(info.specs.chipset.as_deref(), Some("Snapdragon 870"));
    let maintainer = view.maintainer.as_ref().unwrap();
    assert_eq!(maintainer.handle, "@jane");
    assert_eq!(maintainer.links[0].href, "https://t.me/jane_dev");
    assert_eq!(maintainer.links[1].href, "mailto:jane@example.com");
    assert_eq!(view.known_issues, vec!["NFC flaky".to_string()]);
}

#[tokio::test]
async fn missing_detail_file_falls_back_to_summary() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = write_json(dir.path(), "devices.json", CATALOG_WITH_DETAIL);

    let runner = Runner::new(Options {
        catalog: catalog_path.to_string_lossy().to_string(),
        ..Options::default()
    })
    .unwrap();
    let resolved = runner.resolve(Some("alioth")).await.unwrap();
    assert_eq!(resolved.origin, RecordOrigin::Fallback);
    assert_eq!(resolved.record.summary.name, "POCO F3");
    assert_eq!(
        resolved.record.summary.data_file.as_deref(),
        Some("devices/alioth.json")
    );
    assert!(resolved.record.builds.is_empty());

    let view = output::build_device_view(&resolved, &RenderOptions::default());
    assert!(view.builds.is_empty());
    assert!(view.info.is_none());
    assert!(view.maintainer.is_none());
}

#[tokio::test]
async fn undecodable_detail_file_falls_back_to_summary() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = write_json(dir.path(), "devices.json", CATALOG_WITH_DETAIL);
    write_json(dir.path(), "devices/alioth.json", "<html>not json</html>");

    let catalog = CatalogLoader::new(test_fetcher(), Location::Local(catalog_path))
        .load()
        .await
        .unwrap();
    let resolved = Resolver::new(test_fetcher(), None)
        .resolve(Some("alioth"), &catalog)
        .await
        .unwrap();
    assert_eq!(resolved.origin, RecordOrigin::Fallback);
    assert_eq!(resolved.record.summary, catalog.devices()[0]);
}

#[tokio::test]
async fn site_relative_data_file_resolves_without_site_root() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = write_json(dir.path(), "data/devices.json", SITE_CATALOG);
    write_json(dir.path(), "data/devices/alioth.json", DETAIL_JSON);

    let runner = Runner::new(Options {
        catalog: catalog_path.to_string_lossy().to_string(),
        ..Options::default()
    })
    .unwrap();
    let resolved = runner.resolve(Some("alioth")).await.unwrap();
    assert_eq!(resolved.origin, RecordOrigin::Detail);
    assert_eq!(resolved.record.builds.len(), 2);
}

#[tokio::test]
async fn site_root_overrides_catalog_site() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = write_json(dir.path(), "catalog/data/devices.json", SITE_CATALOG);
    let mirror = dir.path().join("mirror");
    write_json(&mirror, "data/devices/alioth.json", DETAIL_JSON);

    let runner = Runner::new(Options {
        catalog: catalog_path.to_string_lossy().to_string(),
        site_root: Some(mirror.to_string_lossy().to_string()),
        ..Options::default()
    })
    .unwrap();
    let resolved = runner.resolve(Some("alioth")).await.unwrap();
    assert_eq!(resolved.origin, RecordOrigin::Detail);
}

#[tokio::test]
async fn detail_without_summary_fields_is_merged() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = write_json(dir.path(), "data/devices.json", SITE_CATALOG);
    let detail = DETAIL_JSON
        .replace(r#""id": "alioth","#, "")
        .replace(r#""name": "POCO F3","#, "");
    write_json(dir.path(), "data/devices/alioth.json", &detail);

    let runner = Runner::new(Options {
        catalog: catalog_path.to_string_lossy().to_string(),
        ..Options::default()
    })
    .unwrap();
    let resolved = runner.resolve(Some("alioth")).await.unwrap();
    assert_eq!(resolved.origin, RecordOrigin::Detail);
    assert_eq!(resolved.record.summary.id, "alioth");
    assert_eq!(resolved.record.summary.name, "POCO F3");
    assert_eq!(resolved.record.builds.len(), 2);
    assert!(resolved.record.maintainer.is_some());
}

#[tokio::test]
async fn unreachable_detail_host_falls_back() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut summary = device("alioth", "xiaomi", "POCO F3", "alioth");
    summary.data_file = Some(format!("http://{addr}/data/devices/alioth.json"));
    let catalog = local_catalog(vec![summary.clone()]);

    let resolved = Resolver::new(test_fetcher(), None)
        .resolve(Some("alioth"), &catalog)
        .await
        .unwrap();
    assert_eq!(resolved.origin, RecordOrigin::Fallback);
    assert_eq!(resolved.record.summary, summary);
    assert!(resolved.record.builds.is_empty());
}

#[tokio::test]
async fn remote_catalog_and_detail_resolve() {
    let base = serve(vec![
        ("/data/devices.json", 200, SITE_CATALOG),
        ("/data/devices/alioth.json", 200, DETAIL_JSON),
    ])
    .await;
    let source = Location::parse(&format!("{base}/data/devices.json")).unwrap();
    let catalog = CatalogLoader::new(test_fetcher(), source).load().await.unwrap();
    assert_eq!(ids(catalog.devices()), vec!["alioth"]);

    let resolved = Resolver::new(test_fetcher(), None)
        .resolve(Some("alioth"), &catalog)
        .await
        .unwrap();
    assert_eq!(resolved.origin, RecordOrigin::Detail);
    assert_eq!(resolved.record.builds[0].version, "2.0");
}

#[tokio::test]
async fn remote_detail_error_status_falls_back() {
    let base = serve(vec![
        ("/data/devices.json", 200, SITE_CATALOG),
        ("/data/devices/alioth.json", 500, "{}"),
    ])
    .await;
    let source = Location::parse(&format!("{base}/data/devices.json")).unwrap();
    let catalog = CatalogLoader::new(test_fetcher(), source).load().await.unwrap();
    let resolved = Resolver::new(test_fetcher(), None)
        .resolve(Some("alioth"), &catalog)
        .await
        .unwrap();
    assert_eq!(resolved.origin, RecordOrigin::Fallback);
    assert_eq!(resolved.record.summary.rom_version, "2.0");
}

#[tokio::test]
async fn remote_catalog_error_status_is_load_error() {
    let base = serve(vec![("/data/devices.json", 404, "{}")]).await;
    let source = Location::parse(&format!("{base}/data/devices.json")).unwrap();
    let err = CatalogLoader::new(test_fetcher(), source).load().await.unwrap_err();
    let LoadError::NetworkOrParse { source, .. } = err;
    assert!(matches!(
        source,
        crate::loader::FetchError::Status { status: 404, .. }
    ));
}

#[tokio::test]
async fn catalog_failure_surfaces_through_device_page() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = write_json(dir.path(), "devices.json", r#"{"items": []}"#);
    let runner = Runner::new(Options {
        catalog: catalog_path.to_string_lossy().to_string(),
        ..Options::default()
    })
    .unwrap();
    let err = runner.device(Some("alioth")).await.unwrap_err();
    assert!(matches!(err, ResolveError::Catalog(_)));

    let panel = output::ErrorPanel::for_device(&err, "download.html");
    assert_eq!(panel.message, "Failed to load device information");
    let html = String::from_utf8(output::render(&Page::Error(panel), OutputFormat::Html).unwrap()).unwrap();
    assert!(html.contains("Back to Downloads"));
}

#[tokio::test]
async fn list_page_filters_loaded_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = write_json(dir.path(), "devices.json", CATALOG_WITH_DETAIL);
    let runner = Runner::new(Options {
        catalog: catalog_path.to_string_lossy().to_string(),
        ..Options::default()
    })
    .unwrap();
    let view = runner.list(&ViewState::new("Google", "")).await.unwrap();
    assert_eq!(view.cards.len(), 1);
    assert_eq!(view.cards[0].detail_link, "device.html?id=oriole");
    assert_eq!(view.cards[0].brand, "google");

    let json = output::render_json(&Page::Catalog(view)).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value["page"], "catalog");
    assert_eq!(value["cards"][0]["id"], "oriole");
}

#[test]
fn synthesized_history_derives_two_prior_versions() {
    let mut summary = device("alioth", "xiaomi", "POCO F3", "alioth");
    summary.rom_version = "2.0".to_string();
    summary.build_date = "2024-03-05".to_string();
    let resolved = crate::resolver::ResolvedDevice {
        record: summary.into(),
        origin: RecordOrigin::Summary,
    };

    let plain = output::build_device_view(&resolved, &RenderOptions::default());
    assert!(plain.builds.is_empty());

    let options = RenderOptions {
        synthesize_history: true,
        ..RenderOptions::default()
    };
    let view = output::build_device_view(&resolved, &options);
    let rows: Vec<(&str, &str, bool, bool)> = view
        .builds
        .iter()
        .map(|b| (b.version.as_str(), b.date.as_str(), b.latest, b.synthetic))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2.0", "2024-03-05", true, false),
            ("1.9", "2024-02-27", false, true),
            ("1.8", "2024-02-20", false, true),
        ]
    );
}

#[test]
fn synthesized_history_skips_unparseable_dates() {
    let mut summary = device("a", "Acme", "Foo", "foo1");
    summary.build_date = "soon".to_string();
    let rows = output::synthesize_builds(&summary);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].latest);
}

#[tokio::test(start_paused = true)]
async fn session_applies_only_the_last_rapid_query() {
    let catalog = local_catalog(wide_catalog());
    let mut session = CatalogSession::new(catalog, ViewState::default(), Duration::from_millis(300));

    for q in ["p", "pi", "pix", "pixel 6 pro"] {
        session.input_query(q);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(session.has_pending_query());
    assert_eq!(session.view_state().query, "");

    let view = session.next_recompute().await.unwrap();
    assert_eq!(view.view.query, "pixel 6 pro");
    assert_eq!(ids_of_cards(&view), vec!["raven"]);
    assert!(!session.has_pending_query());

    let again = tokio::time::timeout(Duration::from_secs(2), session.next_recompute()).await;
    assert!(again.is_err());
}

#[tokio::test(start_paused = true)]
async fn session_filter_applies_immediately() {
    let catalog = local_catalog(wide_catalog());
    let mut session = CatalogSession::new(catalog, ViewState::default(), Duration::from_millis(300));
    let view = session.set_filter("GOOGLE");
    assert_eq!(ids_of_cards(&view), vec!["oriole", "raven"]);

    session.input_query("  pro ");
    let view = session.next_recompute().await.unwrap();
    assert_eq!(view.view.query, "pro");
    assert_eq!(ids_of_cards(&view), vec!["raven"]);
}

fn ids_of_cards(view: &output::CatalogView) -> Vec<&str> {
    view.cards.iter().map(|c| c.id.as_str()).collect()
}

#[test]
fn device_page_html_marks_latest_build() {
    let detail: crate::model::DeviceDetail = serde_json::from_str(DETAIL_JSON).unwrap();
    let resolved = crate::resolver::ResolvedDevice {
        record: detail,
        origin: RecordOrigin::Detail,
    };
    let view = output::build_device_view(&resolved, &RenderOptions::default());
    let html = String::from_utf8(output::render(&Page::Device(view), OutputFormat::Html).unwrap()).unwrap();
    assert_eq!(html.matches("latest-badge").count(), 1);
    assert!(html.contains("https://dl.example/alioth-1.9.zip"));
    assert!(html.contains("Snapdragon 870"));
    assert!(html.contains("NFC flaky"));
}
