use crate::analysis::{NormalizedBalance, PowerAnalysisResult, SideMetrics};

fn format_watts(watts: Option<u32>) -> String {
    match watts {
        Some(value) if value > 0 => format!("{value} W"),
        _ => "—".to_string(),
    }
}

fn format_balance(balance: Option<&NormalizedBalance>) -> String {
    match balance {
        Some(split) => format!("L {}% / R {}%", split.left, split.right),
        None => "Not available".to_string(),
    }
}

fn format_sides(metrics: Option<&SideMetrics>) -> String {
    match metrics {
        Some(sides) => format!("L {}% / R {}%", sides.left, sides.right),
        None => "Not available".to_string(),
    }
}

/// Render an analysis as a plain-text report for terminal output.
pub fn render_report(result: &PowerAnalysisResult) -> String {
    let mut body = String::new();

    if !result.has_power_data() {
        body.push_str("No power data found in the FIT file.\n");
        body.push_str("This file may not contain power meter data.\n");
        return body;
    }

    body.push_str("Power Overview\n");
    body.push_str("==============\n");
    body.push_str(&format!(
        "Average Power:        {}\n",
        format_watts(Some(result.average_power))
    ));
    body.push_str(&format!(
        "Threshold Power:      {}\n",
        format_watts(result.threshold_power)
    ));
    body.push_str(&format!(
        "Left/Right Balance:   {}\n",
        format_balance(result.left_right_balance.as_ref())
    ));
    body.push_str(&format!(
        "Torque Effectiveness: {}\n",
        format_sides(result.torque_effectiveness.as_ref())
    ));
    body.push_str(&format!(
        "Pedal Smoothness:     {}\n",
        format_sides(result.pedal_smoothness.as_ref())
    ));

    if result.power_zone_balances.is_empty() {
        let note = if result.threshold_power.is_some() {
            "No power zone data available (no samples with balance data)"
        } else {
            "No threshold power available, cannot calculate power zones"
        };
        body.push_str(&format!("\n{note}\n"));
        return body;
    }

    body.push_str("\nPower Zones\n");
    body.push_str("===========\n");
    for zone in &result.power_zone_balances {
        body.push_str(&format!(
            "\n{} - {} ({})\n",
            zone.zone_id, zone.label, zone.power_range
        ));
        body.push_str(&format!(
            "  Balance:    {}\n",
            format_balance(Some(&zone.balance))
        ));
        if zone.torque_effectiveness.is_some() {
            body.push_str(&format!(
                "  Torque:     {}\n",
                format_sides(zone.torque_effectiveness.as_ref())
            ));
        }
        if zone.pedal_smoothness.is_some() {
            body.push_str(&format!(
                "  Smoothness: {}\n",
                format_sides(zone.pedal_smoothness.as_ref())
            ));
        }
        body.push_str(&format!("  Samples:    {}\n", zone.sample_count));
    }

    body
}
