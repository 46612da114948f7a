//! CSV and HTML renderings of an assembled report.
//!
//! Renderers only format; every number comes from the `ReportTable` /
//! `SummaryTable` as built and is rounded to two decimals here.

use std::fmt::Write as _;

use super::{
    calendar::Period,
    labels::legend,
    table::{round2, ReportTable, SummaryTable},
    Report, ReportError,
};

const CELL_STYLE: &str = "border: 1px solid #ddd; padding: 8px; text-align: center;";
const HEADER_ROW_STYLE: &str = "background-color: #f2f2f2;";
const STRIPE_ROW_STYLE: &str = "background-color: #f9f9f9;";
const TOTAL_ROW_STYLE: &str = "background-color: #e0f0ff; font-weight: bold;";

fn fmt2(v: f64) -> String {
    format!("{:.2}", round2(v))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Comma-separated rendering: header row, then one line per row.
pub fn to_csv(table: &ReportTable) -> Result<Vec<u8>, ReportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    wtr.write_record(table.headers())
        .map_err(|e| ReportError::Render(format!("failed to write CSV header: {e}")))?;

    for row in table.all_rows() {
        let record = std::iter::once(row.label.to_string()).chain(row.values.iter().map(|v| fmt2(*v)));
        wtr.write_record(record)
            .map_err(|e| ReportError::Render(format!("failed to write CSV row: {e}")))?;
    }

    wtr.into_inner()
        .map_err(|e| ReportError::Render(format!("failed to flush CSV: {e}")))
}

/// HTML table: styled header, striped day rows, highlighted total row.
pub fn to_html_table(table: &ReportTable) -> String {
    let mut html = String::from("<table style=\"width: 100%; border-collapse: collapse;\">\n");

    let _ = write!(html, "  <tr style=\"{HEADER_ROW_STYLE}\">");
    for header in table.headers() {
        let _ = write!(html, "<th style=\"{CELL_STYLE}\">{}</th>", escape_html(header));
    }
    html.push_str("</tr>\n");

    for (i, row) in table.all_rows().enumerate() {
        if row.is_total() {
            let _ = write!(html, "  <tr style=\"{TOTAL_ROW_STYLE}\">");
        } else if i % 2 == 0 {
            let _ = write!(html, "  <tr style=\"{STRIPE_ROW_STYLE}\">");
        } else {
            html.push_str("  <tr>");
        }

        let _ = write!(html, "<td style=\"{CELL_STYLE}\">{}</td>", row.label);
        for v in &row.values {
            let _ = write!(html, "<td style=\"{CELL_STYLE}\">{}</td>", fmt2(*v));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n");
    html
}

pub fn summary_html_table(summary: &SummaryTable) -> String {
    if summary.is_empty() {
        return "<p>No instantaneous metrics recorded for this period.</p>\n".to_string();
    }

    let mut html = String::from("<table>\n  <tr><th>Metric</th><th>Max</th><th>Min</th><th>Avg</th></tr>\n");
    for row in &summary.rows {
        let s = &row.summary;
        let _ = writeln!(
            html,
            "  <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.label),
            fmt2(s.max),
            fmt2(s.min),
            fmt2(s.avg)
        );
    }
    html.push_str("</table>\n");
    html
}

/// `2024-01-01` for a single day, `2024-01-01 to 2024-01-07` otherwise.
pub fn date_range(report: &Report) -> String {
    let w = &report.window;
    if w.is_single_day() {
        w.last_day.to_string()
    } else {
        format!("{} to {}", w.first_day, w.last_day)
    }
}

pub fn subject(report: &Report, title: &str) -> String {
    format!("{title} - {} ({} Report)", date_range(report), report.period.title())
}

pub fn heading(report: &Report, title: &str) -> String {
    let range = date_range(report);
    let period = report.period.title();
    match report.period {
        Period::Daily => format!("{title} for {range} ({period} Report)"),
        Period::Weekly => format!("{title} for Week of {range} ({period} Report)"),
        Period::Monthly => format!("{title} for Month of {range} ({period} Report)"),
    }
}

/// `solar_report_weekly_2024-01-07.csv` for title "Solar Report".
pub fn attachment_name(report: &Report, title: &str) -> String {
    let slug: String = title
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    let slug = if slug.is_empty() { "report".to_string() } else { slug };

    format!("{slug}_{}_{}.csv", report.period, report.window.last_day)
}

pub fn html_body(report: &Report, title: &str) -> String {
    let mut html = String::from(
        "<html>\n<head>\n<style>\n  table { width: 80%; border-collapse: collapse; }\n  th, td { border: 1px solid #dddddd; text-align: center; padding: 8px; }\n  th { background-color: #f2f2f2; }\n</style>\n</head>\n<body>\n",
    );

    let _ = writeln!(html, "<h2>{}</h2>", escape_html(&heading(report, title)));
    html.push_str(&summary_html_table(&report.summary));

    html.push_str("<h3>Energy</h3>\n");
    html.push_str(&to_html_table(&report.table));

    let legend_items: Vec<String> = report
        .summary
        .rows
        .iter()
        .filter_map(|row| {
            legend(&row.metric)
                .map(|text| format!("  <li><strong>{}:</strong> {}</li>", escape_html(&row.label), text))
        })
        .collect();
    if !legend_items.is_empty() {
        html.push_str("<h4>Legend / Explanation:</h4>\n<ul style=\"font-size:12px;\">\n");
        for item in legend_items {
            html.push_str(&item);
            html.push('\n');
        }
        html.push_str("</ul>\n");
    }

    let _ = writeln!(
        html,
        "<p style=\"font-size:12px;\">{} contains the energy totals for the {} period.</p>",
        escape_html(&attachment_name(report, title)),
        report.period.as_str()
    );
    html.push_str("<p style=\"font-size:12px;color:gray;\">Generated automatically by energy-reporter.</p>\n");
    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{
        calendar::Window,
        rollup::Summary,
        table::{Column, ReportRow, RowLabel, SummaryRow},
    };
    use time::{macros::date, UtcOffset};

    fn weekly_report() -> Report {
        let window = Window::for_period(Period::Weekly, date!(2024 - 01 - 07), UtcOffset::UTC);
        let rows: Vec<ReportRow> = window
            .days()
            .enumerate()
            .map(|(i, d)| ReportRow {
                label: RowLabel::Date(d),
                values: vec![(i + 1) as f64, 0.125],
            })
            .collect();
        let table = ReportTable {
            columns: vec![Column::for_metric("load_energy"), Column::for_metric("pv_energy")],
            rows,
            total: Some(ReportRow {
                label: RowLabel::Total,
                values: vec![28.0, 0.875],
            }),
        };
        let summary = SummaryTable {
            rows: vec![SummaryRow {
                metric: "grid_power".to_string(),
                label: "Grid Power (W)".to_string(),
                summary: Summary {
                    max: 3000.0,
                    min: -150.456,
                    avg: 812.3333,
                    count: 3,
                },
            }],
        };

        Report {
            period: Period::Weekly,
            window,
            table,
            summary,
        }
    }

    #[test]
    fn csv_has_header_day_rows_and_total() {
        let report = weekly_report();
        let csv = String::from_utf8(to_csv(&report.table).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "Date,Load (kWh),Solar PV (kWh)");
        assert_eq!(lines[1], "2024-01-01,1.00,0.13");
        assert_eq!(lines[8], "Total,28.00,0.88");
    }

    #[test]
    fn html_table_styles_total_row_distinctly() {
        let html = to_html_table(&weekly_report().table);

        assert_eq!(html.matches(TOTAL_ROW_STYLE).count(), 1);
        assert_eq!(html.matches(STRIPE_ROW_STYLE).count(), 4);
        assert!(html.contains("<td style=\"border: 1px solid #ddd; padding: 8px; text-align: center;\">Total</td>"));
    }

    #[test]
    fn body_contains_heading_summary_and_legend() {
        let report = weekly_report();
        let body = html_body(&report, "Solar Report");

        assert!(body.contains("Solar Report for Week of 2024-01-01 to 2024-01-07 (Weekly Report)"));
        assert!(body.contains("<td>Grid Power (W)</td><td>3000.00</td><td>-150.46</td><td>812.33</td>"));
        assert!(body.contains("Positive means power drawn from the grid"));
        assert!(body.contains("solar_report_weekly_2024-01-07.csv contains the energy totals for the weekly period."));
    }

    #[test]
    fn subject_and_attachment_name() {
        let report = weekly_report();
        assert_eq!(
            subject(&report, "Solar Report"),
            "Solar Report - 2024-01-01 to 2024-01-07 (Weekly Report)"
        );
        assert_eq!(attachment_name(&report, "Solar Report"), "solar_report_weekly_2024-01-07.csv");
    }
}
