use clap::ValueEnum;
use color_eyre::eyre::{Context, Result};
use stylestats::{MetricRecord, MetricValue};

/// Output format for the metric record
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Aligned two-column text table
    Table,
    /// Pretty-printed JSON
    Json,
    /// One header row and one data row
    Csv,
    /// Two-column Markdown table
    Markdown,
}

const BYTE_METRICS: &[&str] = &["size", "gzippedSize", "dataUriSize"];
const PERCENT_METRICS: &[&str] = &["simplicity", "ratioOfDataUriSize"];

/// Display label for a metric name
fn label(name: &str) -> &str {
    match name {
        "published" => "Published",
        "paths" => "Paths",
        "stylesheets" => "Style Sheets",
        "styleElements" => "Style Elements",
        "size" => "Size",
        "dataUriSize" => "Data URI Size",
        "ratioOfDataUriSize" => "Ratio of Data URI Size",
        "gzippedSize" => "Gzipped Size",
        "rules" => "Rules",
        "selectors" => "Selectors",
        "simplicity" => "Simplicity",
        "mostIdentifier" => "Most Identifier",
        "mostIdentifierSelector" => "Most Identifier Selector",
        "lowestCohesion" => "Lowest Cohesion",
        "lowestCohesionSelector" => "Lowest Cohesion Selector",
        "totalUniqueFontSizes" => "Total Unique Font Sizes",
        "uniqueFontSizes" => "Unique Font Sizes",
        "totalUniqueFontFamilies" => "Total Unique Font Families",
        "uniqueFontFamilies" => "Unique Font Families",
        "totalUniqueColors" => "Total Unique Colors",
        "uniqueColors" => "Unique Colors",
        "idSelectors" => "ID Selectors",
        "universalSelectors" => "Universal Selectors",
        "unqualifiedAttributeSelectors" => "Unqualified Attribute Selectors",
        "javascriptSpecificSelectors" => "JavaScript Specific Selectors",
        "userSpecifiedSelectors" => "User Specified Selectors",
        "importantKeywords" => "Important Keywords",
        "floatProperties" => "Float Properties",
        "propertiesCount" => "Properties Count",
        "mediaQueries" => "Media Queries",
        other => other,
    }
}

pub fn render(record: &MetricRecord, format: Format, raw_numbers: bool) -> Result<String> {
    match format {
        Format::Json => {
            serde_json::to_string_pretty(record).wrap_err("Failed to serialize metrics")
        }
        Format::Csv => to_csv(record),
        Format::Markdown => Ok(to_markdown(&display_rows(record, raw_numbers))),
        Format::Table => Ok(to_table(&display_rows(record, raw_numbers))),
    }
}

/// Human-readable rows; `published` and `paths` are left out
fn display_rows(record: &MetricRecord, raw_numbers: bool) -> Vec<(&str, String)> {
    record
        .iter()
        .filter(|(name, _)| !matches!(*name, "published" | "paths"))
        .map(|(name, value)| {
            let text = match value {
                MetricValue::Count(bytes) if !raw_numbers && BYTE_METRICS.contains(&name) => {
                    format_bytes(*bytes)
                }
                MetricValue::Ratio(ratio) if !raw_numbers && PERCENT_METRICS.contains(&name) => {
                    format!("{:.1}%", ratio * 100.0)
                }
                MetricValue::Properties(properties) => properties
                    .iter()
                    .map(|p| format!("{}: {}", p.property, p.count))
                    .collect::<Vec<_>>()
                    .join("\n"),
                MetricValue::List(values) => values.join("\n"),
                other => scalar(other),
            };
            let text = if text.is_empty() { "N/A".to_string() } else { text };
            (label(name), text)
        })
        .collect()
}

fn scalar(value: &MetricValue) -> String {
    match value {
        MetricValue::Count(n) => n.to_string(),
        MetricValue::Ratio(r) => r.to_string(),
        MetricValue::Text(s) => s.clone(),
        MetricValue::List(values) => values.join(" "),
        MetricValue::Properties(properties) => properties
            .iter()
            .map(|p| format!("{}:{}", p.property, p.count))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{bytes}B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for &next in &UNITS[1..] {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }
    let text = format!("{size:.1}");
    format!("{}{unit}", text.strip_suffix(".0").unwrap_or(&text))
}

fn to_csv(record: &MetricRecord) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(record.iter().map(|(name, _)| name))
        .wrap_err("Failed to write CSV header")?;
    writer
        .write_record(record.iter().map(|(_, value)| scalar(value)))
        .wrap_err("Failed to write CSV row")?;
    let bytes = writer
        .into_inner()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to flush CSV: {}", e.error()))?;
    String::from_utf8(bytes).wrap_err("CSV output is not UTF-8")
}

fn to_markdown(rows: &[(&str, String)]) -> String {
    let mut out = String::from("|Metric|Value|\n|---|---|\n");
    for (label, value) in rows {
        let value = value.replace('|', "\\|").replace('\n', "<br>");
        out.push_str(&format!("|{label}|{value}|\n"));
    }
    out
}

fn to_table(rows: &[(&str, String)]) -> String {
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (label, value) in rows {
        let mut lines = value.lines();
        let first = lines.next().unwrap_or_default();
        out.push_str(&format!("{label:<width$}  {first}\n"));
        for line in lines {
            out.push_str(&format!("{:<width$}  {line}\n", ""));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use stylestats::Options;

    use super::*;

    async fn record(css: &str) -> MetricRecord {
        let stats = stylestats::StyleStats::new([css], Options::default());
        stats.parse().await.unwrap()
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(1024), "1KB");
        assert_eq!(format_bytes(1536), "1.5KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3MB");
    }

    #[tokio::test]
    async fn test_table_omits_published_and_paths() {
        let record = record(".a { color: red; float: left } .b { color: blue }").await;
        let table = render(&record, Format::Table, false).unwrap();

        assert!(!table.contains("Published"));
        assert!(!table.contains("Paths"));
        assert!(table.contains("Style Sheets"));
        assert!(table.contains("Simplicity"));
        assert!(table.contains("100.0%"));
        assert!(table.lines().any(|line| line.trim_end().ends_with("color: 2")));
    }

    #[tokio::test]
    async fn test_number_flag_keeps_raw_values() {
        let css = ".a { color: red }";
        let record = record(css).await;
        let table = render(&record, Format::Table, true).unwrap();

        let size_line = table
            .lines()
            .find(|line| line.starts_with("Size "))
            .unwrap();
        assert!(size_line.ends_with(&css.len().to_string()));
        assert!(table.lines().any(|line| line.starts_with("Simplicity") && line.ends_with('1')));
    }

    #[tokio::test]
    async fn test_csv_has_header_and_one_row() {
        let record = record(".a { color: red; margin: 0 } .b { color: blue }").await;
        let csv = render(&record, Format::Csv, false).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("published,paths,stylesheets,size,"));
        assert!(lines[0].ends_with("propertiesCount,mediaQueries"));
        assert!(lines[1].contains("color:2 margin:1"));
        assert!(lines[1].contains("BLUE RED"));
    }

    #[tokio::test]
    async fn test_markdown_rows() {
        let record = record(".a { color: red } .b { color: blue }").await;
        let markdown = render(&record, Format::Markdown, false).unwrap();

        assert!(markdown.starts_with("|Metric|Value|\n|---|---|\n"));
        assert!(markdown.contains("|Unique Colors|BLUE<br>RED|"));
        assert!(!markdown.contains("|Style Elements|"));
    }

    #[tokio::test]
    async fn test_json_keeps_every_metric() {
        let record = record(".a { color: red }").await;
        let json: serde_json::Value =
            serde_json::from_str(&render(&record, Format::Json, false).unwrap()).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), record.len());
        assert_eq!(object["rules"], 1);
        assert_eq!(object["uniqueColors"], serde_json::json!(["RED"]));
    }
}
