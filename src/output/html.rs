use super::{spec_rows, CatalogView, DeviceView, ErrorPanel, Page};

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_html(page: &Page) -> Vec<u8> {
    let html = match page {
        Page::Catalog(view) => catalog_fragment(view),
        Page::Device(view) => device_fragment(view),
        Page::Error(panel) => error_fragment(panel),
    };
    html.into_bytes()
}

fn catalog_fragment(view: &CatalogView) -> String {
    if view.no_matches() {
        return r#"<div class="no-results"><h3>No devices found</h3></div>
"#
        .to_string();
    }
    let mut out = String::new();
    for card in view.cards.iter() {
        let changelog = card
            .changelog_url
            .as_deref()
            .map(|url| {
                format!(
                    r#"<a href="{}" class="device-btn secondary" target="_blank" rel="noopener noreferrer">Changelog</a>"#,
                    escape_html(url)
                )
            })
            .unwrap_or_default();
        out.push_str(&format!(
            r#"<div class="device-card" data-brand="{brand}">
  <div class="device-header">
    <div>
      <h3 class="device-name">{name}</h3>
      <p class="device-codename">{codename}</p>
    </div>
    <span class="device-badge {status_class}">{status}</span>
  </div>
  <div class="device-info">
    <div class="device-info-item"><span class="device-info-label">Android Version</span><span class="device-info-value">{android}</span></div>
    <div class="device-info-item"><span class="device-info-label">havocOOS Version</span><span class="device-info-value">{rom}</span></div>
    <div class="device-info-item"><span class="device-info-label">Build Date</span><span class="device-info-value">{date}</span></div>
    <div class="device-info-item"><span class="device-info-label">Size</span><span class="device-info-value">{size}</span></div>
  </div>
  <div class="device-actions">
    <a href="{link}" class="device-btn primary">View Downloads</a>
    {changelog}
  </div>
</div>
"#,
            brand = escape_html(&card.brand),
            name = escape_html(&card.name),
            codename = escape_html(&card.codename),
            status_class = escape_html(&card.status.to_lowercase()),
            status = escape_html(&card.status),
            android = escape_html(&card.android_version),
            rom = escape_html(&card.rom_version),
            date = escape_html(&card.build_date),
            size = escape_html(&card.size),
            link = escape_html(&card.detail_link),
            changelog = changelog,
        ));
    }
    out
}

fn device_fragment(view: &DeviceView) -> String {
    let h = &view.header;
    let mut out = format!(
        r#"<div class="device-header-inner">
  <div class="device-wallpaper" style="background-image: url('{wallpaper}')"></div>
  <div class="device-header-content">
    <div class="device-badge {status_class}">{status}</div>
    <h1 class="device-header-title">{name}</h1>
    <p class="device-header-codename">Codename: {codename}</p>
    <div class="device-header-meta">
      <span class="meta-item">Android {android}</span>
      <span class="meta-item">havocOOS {rom}</span>
      <span class="meta-item">{brand}</span>
    </div>
  </div>
</div>
"#,
        wallpaper = escape_html(&h.wallpaper),
        status_class = escape_html(&h.status.to_lowercase()),
        status = escape_html(&h.status),
        name = escape_html(&h.name),
        codename = escape_html(&h.codename),
        android = escape_html(&h.android_version),
        rom = escape_html(&h.rom_version),
        brand = escape_html(&h.brand),
    );

    out.push_str("<div class=\"downloads-list\">\n");
    if view.builds.is_empty() {
        out.push_str(
            "  <div class=\"no-results\"><h3>No downloads available</h3><p>Check back later for updates</p></div>\n",
        );
    }
    for (index, b) in view.builds.iter().enumerate() {
        let latest_class = if b.latest { " latest" } else { "" };
        let latest_badge = if b.latest {
            r#"<span class="latest-badge">Latest</span>"#
        } else {
            ""
        };
        out.push_str(&format!(
            "  <div class=\"download-card{latest_class}\">\n    <div class=\"download-version\"><span class=\"version-number\">v{}</span><span class=\"version-type\">{}</span>{latest_badge}</div>\n",
            escape_html(&b.version),
            escape_html(&b.build_type),
        ));
        out.push_str(&format!(
            "    <div class=\"download-info\"><span>Build Date: {}</span><span>File Size: {}</span><span>Android: {}</span>",
            escape_html(&b.date),
            escape_html(&b.size),
            escape_html(&b.android_version),
        ));
        if let Some(md5) = b.md5.as_deref() {
            out.push_str(&format!(
                "<span class=\"md5-hash\">MD5: {}</span>",
                escape_html(md5)
            ));
        }
        out.push_str("</div>\n");
        if let Some(url) = b.download_url.as_deref() {
            out.push_str(&format!(
                "    <a href=\"{}\" class=\"btn btn-primary\" target=\"_blank\" rel=\"noopener noreferrer\">Download ROM</a>\n",
                escape_html(url)
            ));
        }
        if !b.changelog.is_empty() {
            out.push_str(&format!(
                "    <div id=\"changelog-{index}\" class=\"changelog-content\"><h4>Changelog</h4><ul>"
            ));
            for item in b.changelog.iter() {
                out.push_str(&format!("<li>{}</li>", escape_html(item)));
            }
            out.push_str("</ul></div>\n");
        }
        out.push_str("  </div>\n");
    }
    out.push_str("</div>\n");

    if let Some(info) = view.info.as_ref() {
        out.push_str("<div class=\"info-card\"><h3 class=\"info-card-title\">Device Specifications</h3><div class=\"info-card-content\">\n");
        let rows = [
            ("Device Name", info.name.as_str()),
            ("Codename", info.codename.as_str()),
            ("Brand", info.brand.as_str()),
            ("Status", info.status.as_str()),
        ];
        for (label, value) in rows.into_iter().chain(spec_rows(&info.specs)) {
            out.push_str(&info_row(label, value));
        }
        out.push_str("</div></div>\n");
        out.push_str("<div class=\"info-card\"><h3 class=\"info-card-title\">ROM Information</h3><div class=\"info-card-content\">\n");
        out.push_str(&info_row("havocOOS Version", &info.rom_version));
        out.push_str(&info_row("Android Version", &info.android_version));
        out.push_str(&info_row("Latest Build", &info.latest_build_date));
        out.push_str(&info_row("File Size", &info.latest_build_size));
        out.push_str("</div></div>\n");
    }

    if let Some(m) = view.maintainer.as_ref() {
        out.push_str(&format!(
            "<div class=\"info-card\"><h3 class=\"info-card-title\">Maintainer</h3><h4 class=\"maintainer-name\">{}</h4><p class=\"maintainer-username\">{}</p><div class=\"maintainer-links\">",
            escape_html(&m.name),
            escape_html(&m.handle),
        ));
        for link in m.links.iter() {
            out.push_str(&format!(
                "<a href=\"{}\" class=\"maintainer-link\">{}</a>",
                escape_html(&link.href),
                escape_html(&link.label)
            ));
        }
        out.push_str("</div></div>\n");
    }

    if !view.screenshots.is_empty() {
        out.push_str("<div class=\"info-card\"><h3 class=\"info-card-title\">Screenshots</h3><div class=\"screenshots-grid\">");
        for (index, shot) in view.screenshots.iter().enumerate() {
            out.push_str(&format!(
                "<a class=\"screenshot-item\" href=\"{}\" target=\"_blank\">Screenshot {}</a>",
                escape_html(shot),
                index + 1
            ));
        }
        out.push_str("</div></div>\n");
    }

    if !view.known_issues.is_empty() {
        out.push_str("<div class=\"info-card warning-card\"><h3 class=\"info-card-title\">Known Issues</h3><ul class=\"issues-list\">");
        for issue in view.known_issues.iter() {
            out.push_str(&format!("<li>{}</li>", escape_html(issue)));
        }
        out.push_str("</ul></div>\n");
    }

    out
}

fn info_row(label: &str, value: &str) -> String {
    format!(
        "  <div class=\"info-row\"><span class=\"info-label\">{}:</span><span class=\"info-value\">{}</span></div>\n",
        escape_html(label),
        escape_html(value)
    )
}

fn error_fragment(panel: &ErrorPanel) -> String {
    format!(
        r#"<div class="error-message">
  <h3>{title}</h3>
  <p>{message}</p>
  <a href="{back}" class="btn btn-primary">Back to Downloads</a>
</div>
"#,
        title = escape_html(&panel.title),
        message = escape_html(&panel.message),
        back = escape_html(&panel.back_link),
    )
}
