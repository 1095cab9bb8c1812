//! Text rendering of widget snapshots.

use std::fmt::Write as _;

use console::style;
use location_insight_metrics::SUB_METRICS;
use location_insight_metrics_models::{AggregateResult, MetricCategory, MetricRecord, MetricScale};
use location_insight_widget_models::{QueryState, Theme, WidgetSnapshot};

const BAR_WIDTH: usize = 20;
const LABEL_WIDTH: usize = 28;

/// Renders `snapshot` the way the widget's metric panel lays it out.
#[must_use]
pub fn render_snapshot(snapshot: &WidgetSnapshot, theme: Theme) -> String {
    let mut out = String::new();

    match snapshot.state {
        QueryState::Idle => {
            out.push_str("Enter a location to get started.\n");
        }
        QueryState::Resolving | QueryState::Aggregating => {
            let location = snapshot.location().unwrap_or_default();
            let _ = writeln!(out, "Loading insights for {location}...");
        }
        QueryState::Error => {
            let message = snapshot
                .error
                .as_ref()
                .map_or("Unable to load location data.", |e| e.user_message());
            let _ = writeln!(out, "{} {message}", style("✗").red().bold());
        }
        QueryState::Ready => {
            if let Some(data) = &snapshot.data {
                render_result(&mut out, snapshot.location().unwrap_or_default(), data, theme);
            }
        }
    }

    out
}

fn render_result(out: &mut String, location: &str, data: &AggregateResult, theme: Theme) {
    let _ = writeln!(
        out,
        "{}  {}",
        style(location).bold(),
        style(format!("({})", data.coordinates)).dim()
    );

    for category in MetricCategory::ALL {
        let records: Vec<&MetricRecord> = data.records_for(*category).collect();
        if records.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", style(category.label()).underlined());
        for record in records {
            render_record(out, record, theme);
        }
    }

    if !data.partial_failures.is_empty() {
        let missing = data
            .partial_failures
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", style(format!("Unavailable: {missing}")).dim());
    }
}

fn render_record(out: &mut String, record: &MetricRecord, theme: Theme) {
    let scale = scale_of(record);
    let filled = filled_cells(record.normalized_value, scale);
    let bar = format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled)
    );
    let bar = match theme {
        Theme::Light => style(bar).blue(),
        Theme::Dark => style(bar).cyan(),
    };
    let _ = writeln!(
        out,
        "  {:<LABEL_WIDTH$} {bar} {}",
        record.label,
        format_value(record.normalized_value, scale)
    );
}

fn scale_of(record: &MetricRecord) -> MetricScale {
    SUB_METRICS
        .iter()
        .find(|m| m.key == record.key)
        .map_or(MetricScale::Percentage, |m| m.scale)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn filled_cells(value: f64, scale: MetricScale) -> usize {
    let max = match scale {
        MetricScale::Percentage => 100.0,
        MetricScale::Density => 10.0,
    };
    let fraction = (value / max).clamp(0.0, 1.0);
    (fraction * BAR_WIDTH as f64).round() as usize
}

fn format_value(value: f64, scale: MetricScale) -> String {
    match scale {
        MetricScale::Percentage => format!("{value:.0}/100"),
        MetricScale::Density => format!("{value:.1}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use location_insight_metrics_models::{Coordinates, QueryId};
    use location_insight_widget_models::{PipelineError, PipelineErrorKind, Query};

    use super::*;

    fn record(key: &str, category: MetricCategory, label: &str, value: f64) -> MetricRecord {
        MetricRecord {
            key: key.to_string(),
            category,
            label: label.to_string(),
            score: value,
            description: String::new(),
            normalized_value: value,
        }
    }

    fn ready(records: Vec<MetricRecord>, partial: &[MetricCategory]) -> WidgetSnapshot {
        let id = QueryId::default().next();
        WidgetSnapshot {
            query_id: id,
            query: Some(Query::new(id, "Downtown Dubai")),
            state: QueryState::Ready,
            data: Some(AggregateResult {
                query_id: id,
                coordinates: Coordinates::new(25.0657, 55.1713),
                records,
                features: Vec::new(),
                partial_failures: partial.iter().copied().collect::<BTreeSet<_>>(),
            }),
            error: None,
        }
    }

    #[test]
    fn ready_snapshot_groups_records_by_category() {
        console::set_colors_enabled(false);
        let snapshot = ready(
            vec![
                record("school_density", MetricCategory::Education, "School Density", 8.5),
                record("dining", MetricCategory::Living, "Dining & Entertainment", 72.0),
            ],
            &[MetricCategory::Access],
        );

        let text = render_snapshot(&snapshot, Theme::Light);

        assert!(text.starts_with("Downtown Dubai  (25.0657, 55.1713)\n"), "{text}");
        assert!(text.contains("School Density"));
        assert!(text.contains(" 8.5\n"), "{text}");
        assert!(text.contains(" 72/100\n"), "{text}");
        assert!(text.contains("Unavailable: Access"), "{text}");
        assert!(text.find("School Density") < text.find("Dining"));
    }

    #[test]
    fn error_snapshot_shows_user_message_only() {
        console::set_colors_enabled(false);
        let snapshot = WidgetSnapshot {
            state: QueryState::Error,
            error: Some(PipelineError::new(
                PipelineErrorKind::AllSourcesFailed,
                "All 3 metric sources failed",
            )),
            ..WidgetSnapshot::default()
        };

        let text = render_snapshot(&snapshot, Theme::Dark);

        assert!(text.contains(PipelineErrorKind::AllSourcesFailed.user_message()));
        assert!(!text.contains("All 3 metric sources failed"));
    }

    #[test]
    fn bars_use_each_scale_maximum() {
        assert_eq!(filled_cells(8.5, MetricScale::Density), 17);
        assert_eq!(filled_cells(72.0, MetricScale::Percentage), 14);
        assert_eq!(filled_cells(100.0, MetricScale::Percentage), BAR_WIDTH);
        assert_eq!(filled_cells(0.0, MetricScale::Density), 0);
    }
}
