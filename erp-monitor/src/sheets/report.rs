//! Report table layout and formatting.
//!
//! Eleven rows: a header, then one row per report field. Columns are field,
//! value, description and data source.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::{json, Value};

use crate::valuation::{fmt_decimal, fmt_percent, Icon, ValuationReport};

/// Cells written by the report.
pub const TABLE_RANGE: &str = "A1:D11";

pub const HEADER: [&str; 4] = ["Field", "Value", "Description", "Data source"];

const VALUE_COLUMN: i64 = 1;
const COLUMN_COUNT: i64 = 4;

/// Number format applied to a row's value cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// `0.00%`
    Percent,
    /// `0.00`
    Decimal,
    /// Left as entered
    Text,
}

/// Value cell contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Blank,
}

impl Cell {
    fn from_option(value: Option<f64>) -> Self {
        value.map_or(Self::Blank, Self::Number)
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => json!(n),
            Self::Text(s) => json!(s),
            Self::Blank => json!(""),
        }
    }
}

/// One data row of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub field: &'static str,
    pub value: Cell,
    pub description: &'static str,
    pub source: String,
    pub format: ValueFormat,
}

impl ReportRow {
    fn new(
        field: &'static str,
        value: Cell,
        description: &'static str,
        source: impl Into<String>,
        format: ValueFormat,
    ) -> Self {
        Self {
            field,
            value,
            description,
            source: source.into(),
            format,
        }
    }

    fn to_json(&self) -> Vec<Value> {
        vec![
            json!(self.field),
            self.value.to_json(),
            json!(self.description),
            json!(self.source),
        ]
    }

    /// Value as shown in a terminal.
    fn display_value(&self) -> String {
        match (&self.value, self.format) {
            (Cell::Number(n), ValueFormat::Percent) => fmt_percent(Some(*n)),
            (Cell::Number(n), _) => fmt_decimal(Some(*n)),
            (Cell::Text(s), _) => s.clone(),
            (Cell::Blank, _) => String::new(),
        }
    }
}

/// The ten data rows, in table order.
pub fn report_rows(report: &ValuationReport) -> Vec<ReportRow> {
    use ValueFormat::{Decimal, Percent, Text};

    let provenance = &report.provenance;
    vec![
        ReportRow::new(
            "Index",
            Cell::Text(provenance.index_name.clone()),
            "Tracked index",
            "config",
            Text,
        ),
        ReportRow::new(
            "P/E (TTM)",
            Cell::from_option(report.ratio),
            "Trailing twelve-month price-to-earnings",
            provenance.ratio_source.to_string(),
            Decimal,
        ),
        ReportRow::new(
            "Earnings yield",
            Cell::from_option(report.earnings_yield),
            "1 / P/E",
            "derived",
            Percent,
        ),
        ReportRow::new(
            "Risk-free rate",
            Cell::from_option(report.rate),
            "China 10-year government bond yield",
            provenance.rate_source.to_string(),
            Percent,
        ),
        ReportRow::new(
            "Implied ERP",
            Cell::from_option(report.implied_premium),
            "Earnings yield minus risk-free rate",
            "derived",
            Percent,
        ),
        ReportRow::new(
            "Target ERP",
            Cell::Number(report.target_premium),
            "Premium regarded as fair value",
            "config",
            Percent,
        ),
        ReportRow::new(
            "Tolerance",
            Cell::Number(report.tolerance),
            "Band around the target before the signal changes",
            "config",
            Percent,
        ),
        ReportRow::new(
            "P/E ceiling",
            Cell::from_option(report.ratio_ceiling),
            "1 / (risk-free rate + target ERP)",
            "derived",
            Decimal,
        ),
        ReportRow::new(
            "Signal",
            Cell::Text(report.classification.to_string()),
            "Buy at or above target + tolerance, sell at or below target - tolerance",
            "derived",
            Text,
        ),
        ReportRow::new(
            "Icon",
            Cell::Text(report.icon.symbol().to_string()),
            "Signal marker",
            "derived",
            Text,
        ),
    ]
}

/// Header plus data rows as JSON cell values.
pub fn table_values(report: &ValuationReport) -> Vec<Vec<Value>> {
    std::iter::once(HEADER.iter().map(|h| json!(h)).collect::<Vec<Value>>())
        .chain(report_rows(report).iter().map(ReportRow::to_json))
        .collect()
}

/// RGB triple in the 0..1 range the API expects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f64, pub f64, pub f64);

impl Rgb {
    fn to_json(self) -> Value {
        json!({ "red": self.0, "green": self.1, "blue": self.2 })
    }
}

/// Background and foreground colors for the signal rows.
pub fn palette(icon: Icon) -> (Rgb, Rgb) {
    match icon {
        Icon::Green => (Rgb(0.85, 0.94, 0.83), Rgb(0.15, 0.47, 0.18)),
        Icon::Red => (Rgb(0.96, 0.8, 0.8), Rgb(0.6, 0.0, 0.0)),
        Icon::Yellow => (Rgb(1.0, 0.95, 0.8), Rgb(0.5, 0.38, 0.0)),
        Icon::Neutral => (Rgb(0.93, 0.93, 0.93), Rgb(0.26, 0.26, 0.26)),
    }
}

fn grid_range(sheet_id: i64, row: i64, start_column: i64, end_column: i64) -> Value {
    json!({
        "sheetId": sheet_id,
        "startRowIndex": row,
        "endRowIndex": row + 1,
        "startColumnIndex": start_column,
        "endColumnIndex": end_column,
    })
}

/// Every formatting request, in the order they are sent.
pub fn format_requests(report: &ValuationReport, sheet_id: i64) -> Vec<Value> {
    let mut requests = vec![json!({
        "repeatCell": {
            "range": grid_range(sheet_id, 0, 0, COLUMN_COUNT),
            "cell": { "userEnteredFormat": { "textFormat": { "bold": true } } },
            "fields": "userEnteredFormat.textFormat.bold",
        }
    })];

    let rows = report_rows(report);
    for (offset, row) in rows.iter().enumerate() {
        let pattern = match row.format {
            ValueFormat::Percent => ("PERCENT", "0.00%"),
            ValueFormat::Decimal => ("NUMBER", "0.00"),
            ValueFormat::Text => continue,
        };
        requests.push(json!({
            "repeatCell": {
                "range": grid_range(sheet_id, offset as i64 + 1, VALUE_COLUMN, VALUE_COLUMN + 1),
                "cell": { "userEnteredFormat": {
                    "numberFormat": { "type": pattern.0, "pattern": pattern.1 }
                } },
                "fields": "userEnteredFormat.numberFormat",
            }
        }));
    }

    let (background, foreground) = palette(report.icon);
    let signal_rows = [rows.len() as i64 - 1, rows.len() as i64];
    for row in signal_rows {
        requests.push(json!({
            "repeatCell": {
                "range": grid_range(sheet_id, row, 0, COLUMN_COUNT),
                "cell": { "userEnteredFormat": {
                    "backgroundColor": background.to_json(),
                    "textFormat": { "foregroundColor": foreground.to_json(), "bold": true },
                } },
                "fields": "userEnteredFormat(backgroundColor,textFormat)",
            }
        }));
    }

    requests.push(json!({
        "autoResizeDimensions": {
            "dimensions": {
                "sheetId": sheet_id,
                "dimension": "COLUMNS",
                "startIndex": 0,
                "endIndex": COLUMN_COUNT,
            }
        }
    }));

    requests
}

/// Spreadsheet title: index name and the local date in `tz`.
pub fn title_for(now: DateTime<Utc>, tz: Tz, index_name: &str) -> String {
    let date = now.with_timezone(&tz).format("%Y-%m-%d");
    if index_name.is_empty() {
        format!("ERP {}", date)
    } else {
        format!("{} ERP {}", index_name, date)
    }
}

/// Plain-text rendering of the table.
pub fn render_table(report: &ValuationReport) -> String {
    let rows = report_rows(report);
    let cells: Vec<[String; 4]> = std::iter::once(HEADER.map(String::from))
        .chain(rows.iter().map(|r| {
            [
                r.field.to_string(),
                r.display_value(),
                r.description.to_string(),
                r.source.clone(),
            ]
        }))
        .collect();

    let mut widths = [0usize; 4];
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                let pad = width - cell.chars().count();
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect();
        out.push_str(line.join(" | ").trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataSource;
    use crate::valuation::{compute_report, Provenance};
    use chrono::TimeZone;

    fn sample(ratio: Option<f64>, rate: Option<f64>) -> ValuationReport {
        compute_report(ratio, rate, 0.0527, 0.005).with_provenance(Provenance {
            index_name: "沪深300".into(),
            ratio_source: DataSource::Live("lixinger.com (direct-field)".into()),
            rate_source: DataSource::ManualOverride,
        })
    }

    #[test]
    fn test_table_shape() {
        let values = table_values(&sample(Some(15.0), Some(0.03)));
        assert_eq!(values.len(), 11);
        assert!(values.iter().all(|row| row.len() == 4));
        assert_eq!(values[0][0], json!("Field"));
        assert_eq!(values[1][1], json!("沪深300"));
        assert_eq!(values[2][1], json!(15.0));
        assert_eq!(values[2][3], json!("lixinger.com (direct-field)"));
        assert_eq!(values[4][3], json!("manual override"));
        assert_eq!(values[9][1], json!("sell (overvalued)"));
        assert_eq!(values[10][1], json!("🔴"));
    }

    #[test]
    fn test_missing_inputs_leave_blank_cells() {
        let values = table_values(&sample(None, Some(0.018)));
        assert_eq!(values[2][1], json!(""));
        assert_eq!(values[3][1], json!(""));
        assert_eq!(values[5][1], json!(""));
        assert_eq!(values[4][1], json!(0.018));
        assert_eq!(values[9][1], json!("needs manual update"));
        assert_eq!(values[10][1], json!("⚪"));
    }

    #[test]
    fn test_format_requests() {
        let report = sample(Some(10.0), Some(0.02));
        let requests = format_requests(&report, 42);

        // bold header + 5 percent rows + 2 decimal rows + 2 color rows + resize
        assert_eq!(requests.len(), 11);
        assert_eq!(requests[0]["repeatCell"]["range"]["sheetId"], json!(42));

        let number_formats: Vec<(i64, String)> = requests
            .iter()
            .filter_map(|r| {
                let cell = &r["repeatCell"];
                let format = cell["cell"]["userEnteredFormat"]["numberFormat"]["type"].as_str()?;
                Some((cell["range"]["startRowIndex"].as_i64()?, format.to_string()))
            })
            .collect();
        assert_eq!(
            number_formats,
            vec![
                (2, "NUMBER".to_string()),
                (3, "PERCENT".to_string()),
                (4, "PERCENT".to_string()),
                (5, "PERCENT".to_string()),
                (6, "PERCENT".to_string()),
                (7, "PERCENT".to_string()),
                (8, "NUMBER".to_string()),
            ]
        );

        let green = palette(Icon::Green).0.to_json();
        assert_eq!(
            requests[8]["repeatCell"]["cell"]["userEnteredFormat"]["backgroundColor"],
            green
        );
        assert_eq!(requests[8]["repeatCell"]["range"]["startRowIndex"], json!(9));
        assert_eq!(requests[9]["repeatCell"]["range"]["startRowIndex"], json!(10));
        assert!(requests[10].get("autoResizeDimensions").is_some());
    }

    #[test]
    fn test_title_uses_timezone_date() {
        // 2026-10-18 17:30 UTC is already the 19th in Shanghai
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 17, 30, 0).unwrap();
        assert_eq!(
            title_for(now, chrono_tz::Asia::Shanghai, "沪深300"),
            "沪深300 ERP 2026-10-19"
        );
        assert_eq!(title_for(now, chrono_tz::UTC, ""), "ERP 2026-10-18");
    }

    #[test]
    fn test_render_table() {
        let rendered = render_table(&sample(Some(15.0), Some(0.03)));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 11);
        assert!(lines[0].starts_with("Field"));
        assert!(lines[2].contains("15.00"));
        assert!(lines[4].contains("3.00%"));
        assert!(lines[9].contains("sell (overvalued)"));
    }
}
