//! Terminal tables for pipeline output.

use adspend_core::metrics::ParetoSummary;
use adspend_core::{
    ABTestResult, BudgetPlan, BuildReport, MetricsTable, ModelComparison, Recommendation,
};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

fn table_with_header(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

fn money(value: f64) -> String {
    format!("${value:.2}")
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn optional(value: Option<f64>, fmt: fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| "-".to_string())
}

pub fn metrics_table(table: &MetricsTable) -> Table {
    let mut out = table_with_header(&[
        "Channel",
        "Impressions",
        "Clicks",
        "Conversions",
        "Cost",
        "Revenue",
        "CTR",
        "CVR",
        "ROAS",
        "CPC",
        "Efficiency",
    ]);

    for row in table.ranked() {
        out.add_row(vec![
            Cell::new(row.channel.as_str()),
            Cell::new(row.impressions),
            Cell::new(row.clicks),
            Cell::new(format!("{:.2}", row.conversions)),
            Cell::new(money(row.cost)),
            Cell::new(money(row.credited_revenue)),
            Cell::new(pct(row.ctr)),
            Cell::new(pct(row.conversion_rate)),
            Cell::new(optional(row.roas, |r| format!("{r:.2}x"))),
            Cell::new(optional(row.cpc, money)),
            Cell::new(format!("{:.3}", row.efficiency_score)),
        ]);
    }

    let s = &table.summary;
    out.add_row(vec![
        Cell::new("Total").fg(Color::Yellow),
        Cell::new(s.impressions),
        Cell::new(s.clicks),
        Cell::new(format!("{:.2}", s.conversions)),
        Cell::new(money(s.cost)),
        Cell::new(money(s.credited_revenue)),
        Cell::new(pct(s.ctr)),
        Cell::new(pct(s.conversion_rate)),
        Cell::new(optional(s.roas, |r| format!("{r:.2}x"))),
        Cell::new(""),
        Cell::new(""),
    ]);

    out
}

pub fn comparison_table(comparison: &ModelComparison) -> Table {
    let mut headers: Vec<String> = vec!["Channel".to_string()];
    headers.extend(comparison.models.iter().map(|m| m.name().to_string()));
    headers.push("Std dev".to_string());
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let mut out = table_with_header(&header_refs);

    for row in &comparison.rows {
        let mut cells = vec![Cell::new(row.channel.as_str())];
        cells.extend(row.credited.iter().map(|c| Cell::new(money(*c))));
        cells.push(Cell::new(money(row.variance.sqrt())));
        out.add_row(cells);
    }

    out
}

pub fn plan_table(plan: &BudgetPlan) -> Table {
    let mut out = table_with_header(&[
        "Channel",
        "Current",
        "Optimal",
        "Change",
        "Change %",
        "Efficiency",
        "Expected lift",
        "Action",
    ]);

    for a in &plan.allocations {
        let action = Cell::new(a.recommendation.as_str());
        let action = match a.recommendation {
            Recommendation::Increase => action.fg(Color::Green),
            Recommendation::Decrease => action.fg(Color::Red),
            Recommendation::Maintain => action,
        };
        out.add_row(vec![
            Cell::new(a.channel.as_str()),
            Cell::new(money(a.current_budget)),
            Cell::new(money(a.optimal_budget)),
            Cell::new(money(a.change)),
            Cell::new(format!("{:+.1}%", a.change_pct)),
            Cell::new(optional(a.efficiency_score, |s| format!("{s:.3}"))),
            Cell::new(money(a.expected_lift)),
            action,
        ]);
    }

    out
}

pub fn abtest_table(result: &ABTestResult) -> Table {
    let mut out = table_with_header(&["", "Control", "Treatment"]);
    out.add_row(vec![
        Cell::new("Rate"),
        Cell::new(pct(result.control_metric)),
        Cell::new(pct(result.treatment_metric)),
    ]);
    out.add_row(vec![
        Cell::new("Sample size"),
        Cell::new(result.control_sample_size),
        Cell::new(result.treatment_sample_size),
    ]);
    out
}

/// One-paragraph summary of an A/B result
pub fn abtest_summary(result: &ABTestResult) -> String {
    let verdict = if result.significant {
        "significant"
    } else if result.p_value < result.significance_level {
        "not significant (underpowered)"
    } else {
        "not significant"
    };
    format!(
        "z = {:.3}, p = {:.4}, difference = {} [{}, {}], h = {:.3}, required n per arm = {}, lift = {} -> {}",
        result.z_score,
        result.p_value,
        pct(result.difference),
        pct(result.difference_ci.0),
        pct(result.difference_ci.1),
        result.effect_size,
        result.required_sample_size,
        optional(result.relative_lift, pct),
        verdict
    )
}

/// One line per compared model pair
pub fn correlation_lines(comparison: &ModelComparison) -> Vec<String> {
    comparison
        .correlations
        .iter()
        .map(|c| {
            format!(
                "{} vs {}: r = {}",
                c.first.name(),
                c.second.name(),
                optional(c.pearson, |r| format!("{r:.3}"))
            )
        })
        .collect()
}

pub fn build_summary(report: &BuildReport) -> String {
    format!(
        "{} events ({} duplicates dropped): {} converted, {} unconverted, {} rejected journeys",
        report.events_seen,
        report.duplicates_dropped,
        report.converted_journeys,
        report.unconverted_journeys,
        report.rejected_count()
    )
}

pub fn pareto_summary(summary: &ParetoSummary) -> String {
    let names: Vec<&str> = summary.top_channels.iter().map(|c| c.as_str()).collect();
    format!(
        "{} of channels produce {} of credited revenue: {}",
        pct(summary.channel_share),
        pct(summary.value_share),
        names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use adspend_core::{
        AbTestEvaluator, ArmSample, AttributionModel, BudgetAllocation, Channel, ComparisonRow,
        ModelCorrelation,
    };

    #[test]
    fn test_money_and_pct() {
        assert_eq!(money(1234.5), "$1234.50");
        assert_eq!(pct(0.0231), "2.31%");
        assert_eq!(optional(None, money), "-");
    }

    #[test]
    fn test_abtest_summary_verdict() {
        let evaluator = AbTestEvaluator::new().unwrap();
        let result = evaluator
            .evaluate(&ArmSample::new(0.02, 15_000), &ArmSample::new(0.024, 15_000))
            .unwrap();
        let summary = abtest_summary(&result);
        assert!(summary.ends_with("-> significant"));
        assert!(summary.contains("difference = 0.40% [0.07%, 0.73%]"));

        let underpowered = evaluator
            .evaluate(&ArmSample::new(0.02, 2_000), &ArmSample::new(0.04, 2_000))
            .unwrap();
        assert!(abtest_summary(&underpowered).contains("underpowered"));
    }

    #[test]
    fn test_plan_table_actions() {
        let allocation = |name: &str, recommendation| BudgetAllocation {
            channel: Channel::new(name),
            current_budget: 100.0,
            optimal_budget: 100.0,
            change: 0.0,
            change_pct: 0.0,
            efficiency_score: Some(1.0),
            expected_lift: 0.0,
            recommendation,
        };
        let plan = BudgetPlan {
            total_budget: 300.0,
            allocations: vec![
                allocation("email", Recommendation::Increase),
                allocation("paid_search", Recommendation::Maintain),
                allocation("display", Recommendation::Decrease),
            ],
            expected_improvement_pct: 0.0,
            warning: None,
            missing_metrics: Vec::new(),
        };
        let rendered = plan_table(&plan).to_string();
        for action in ["increase", "maintain", "decrease"] {
            assert!(rendered.contains(action), "missing {action}");
        }
    }

    #[test]
    fn test_correlation_lines() {
        let comparison = ModelComparison {
            models: vec![AttributionModel::FirstTouch, AttributionModel::LastTouch],
            rows: Vec::<ComparisonRow>::new(),
            correlations: vec![ModelCorrelation {
                first: AttributionModel::FirstTouch,
                second: AttributionModel::LastTouch,
                pearson: Some(0.5),
            }],
        };
        let lines = correlation_lines(&comparison);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("r = 0.500"), "{}", lines[0]);

        let flat = ModelComparison {
            correlations: vec![ModelCorrelation {
                pearson: None,
                ..comparison.correlations[0].clone()
            }],
            ..comparison
        };
        assert!(correlation_lines(&flat)[0].ends_with("r = -"));
    }

    #[test]
    fn test_build_summary() {
        let report = BuildReport {
            events_seen: 10,
            duplicates_dropped: 1,
            converted_journeys: 2,
            unconverted_journeys: 3,
            ..Default::default()
        };
        assert_eq!(
            build_summary(&report),
            "10 events (1 duplicates dropped): 2 converted, 3 unconverted, 0 rejected journeys"
        );
    }
}
