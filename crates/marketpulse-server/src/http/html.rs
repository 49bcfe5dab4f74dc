// SPDX-License-Identifier: Apache-2.0

use marketpulse_model::Table;
use std::fmt::Write as _;

#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    let title = escape_html(title);
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title} - MarketPulse</title></head>\
<body><h1>{title}</h1>{body}<p><a href=\"/\">MarketPulse</a></p></body></html>"
    )
}

/// One `<th>` per column in query order, one `<tr>` per row. NULL renders as
/// an empty cell.
#[must_use]
pub fn render_table_page(title: &str, table: &Table) -> String {
    let mut body = String::new();
    let _ = write!(body, "<p>{} rows</p><table><thead><tr>", table.len());
    for column in &table.columns {
        let _ = write!(body, "<th>{}</th>", escape_html(column));
    }
    body.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        body.push_str("<tr>");
        for cell in row {
            let _ = write!(body, "<td>{}</td>", escape_html(&cell.to_string()));
        }
        body.push_str("</tr>");
    }
    body.push_str("</tbody></table>");
    page(title, &body)
}

#[must_use]
pub fn render_landing_page(version: &str) -> String {
    let links = [
        ("/companies", "Top companies by market cap"),
        ("/companies?sector=Technology&limit=10", "Technology, top 10"),
        ("/company/AAPL", "One company"),
        ("/sectors", "Sectors"),
        ("/sector/Technology/companies", "Sector companies with aggregates"),
        ("/index?limit=30", "S&P 500 index, last 30 days"),
        ("/health", "Health"),
        ("/metrics", "Metrics"),
        ("/v1/openapi.json", "OpenAPI"),
    ];
    let mut list = String::new();
    for (href, label) in links {
        let sep = if href.contains('?') { "&" } else { "?" };
        let _ = write!(
            list,
            "<li><a href=\"{}\">{}</a> (<a href=\"{}\">html</a>)</li>",
            escape_html(href),
            escape_html(label),
            escape_html(&format!("{href}{sep}format=html"))
        );
    }
    page(
        "MarketPulse",
        &format!(
            "<p>S&amp;P 500 reference data. Version: <code>{}</code></p><ul>{list}</ul>",
            escape_html(version)
        ),
    )
}
