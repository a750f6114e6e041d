use crate::domain::signal::SIGNAL_COLUMNS;
use crate::render::board::{SignalBoard, SignalRow};
use std::time::Duration;

const PAGE_TITLE: &str = "NSE Signals";

const PAGE_STYLE: &str = "<style>body{margin:0;padding:20px;font-family:\"Segoe UI\",sans-serif;background:#f5f6f8;color:#1c2329}h1{margin:0 0 6px;font-size:1.4rem}.meta{color:#5f6a73;font-size:.9rem;margin-bottom:14px}table{border-collapse:collapse;width:100%;background:#fff}th,td{padding:8px 10px;border-bottom:1px solid #dde2e6;text-align:left;white-space:nowrap}thead th{background:#14343f;color:#f2f7f9;font-size:.8rem;text-transform:uppercase;letter-spacing:.04em}tbody tr:nth-child(even){background:#fafcfd}</style>\n";

#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    /// Emits a `<meta http-equiv="refresh">` so a browser picks up the next render.
    pub auto_refresh: Option<Duration>,
}

pub fn render_page(board: &SignalBoard, opts: &PageOptions) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    if let Some(every) = opts.auto_refresh {
        out.push_str(&format!(
            "<meta http-equiv=\"refresh\" content=\"{}\">\n",
            every.as_secs().max(1)
        ));
    }
    out.push_str(&format!("<title>{}</title>\n", escape_html(PAGE_TITLE)));
    out.push_str(PAGE_STYLE);
    out.push_str("</head><body>\n");
    out.push_str(&format!("<h1>{}</h1>\n", escape_html(PAGE_TITLE)));
    out.push_str("<div class=\"meta\">Updated: <span id=\"updated\">");
    out.push_str(&escape_html(&board.updated));
    out.push_str("</span></div>\n");

    out.push_str("<table id=\"signalTable\">\n<thead><tr>");
    for header in SIGNAL_COLUMNS {
        out.push_str("<th>");
        out.push_str(&escape_html(header));
        out.push_str("</th>");
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    out.push_str(&render_rows_html(&board.rows));
    out.push_str("</tbody></table>\n");
    out.push_str("</body></html>\n");
    out
}

pub fn render_rows_html(rows: &[SignalRow]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str("<tr>");
        for cell in row.cells() {
            out.push_str("<td>");
            out.push_str(&escape_html(cell));
            out.push_str("</td>");
        }
        out.push_str("</tr>\n");
    }
    out
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::SignalDocument;
    use chrono::Utc;

    fn board(text: &str) -> SignalBoard {
        let mut b = SignalBoard::default();
        b.render(&SignalDocument::parse(text).unwrap(), Utc::now());
        b
    }

    #[test]
    fn page_carries_dom_contract() {
        let b = board(r#"{"timestamp": "2024-01-01T10:00:00Z", "signals": {"NIFTY": {"trend": "up"}}}"#);
        let html = render_page(&b, &PageOptions::default());
        assert!(html.contains("<span id=\"updated\">2024-01-01T10:00:00Z</span>"));
        assert!(html.contains("<table id=\"signalTable\">"));
        assert!(html.contains("<td>NIFTY</td><td>up</td>"));
        assert!(!html.contains("http-equiv"));
    }

    #[test]
    fn rows_render_one_tr_per_signal() {
        let b = board(r#"{"signals": {"A": {}, "B": {}, "C": {}}}"#);
        let rows = render_rows_html(&b.rows);
        assert_eq!(rows.matches("<tr>").count(), 3);
        assert_eq!(rows.matches("<td>").count(), 21);
    }

    #[test]
    fn escapes_markup_in_values() {
        let b = board(
            r#"{"timestamp": "<b>now</b>", "signals": {"<script>x</script>": {"trend": "a&b \"q\" 'r'"}}}"#,
        );
        let html = render_page(&b, &PageOptions::default());
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>now"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(html.contains("a&amp;b &quot;q&quot; &#39;r&#39;"));
        assert!(html.contains("&lt;b&gt;now&lt;/b&gt;"));
    }

    #[test]
    fn auto_refresh_meta_uses_period_seconds() {
        let opts = PageOptions {
            auto_refresh: Some(Duration::from_secs(300)),
        };
        let html = render_page(&SignalBoard::default(), &opts);
        assert!(html.contains("<meta http-equiv=\"refresh\" content=\"300\">"));
    }
}
