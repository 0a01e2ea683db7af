//! Text and JSON rendering of run reports.

use std::fmt::Write;

use heatopt_furnace::Report;
use uom::si::{
    energy::{joule, kilowatt_hour},
    f64::Energy,
};

use crate::db::HistoryEntry;

/// Heater energy `P·t` of a successful report, in kWh.
fn energy_kwh(report: &Report) -> Option<f64> {
    let (power, time) = report.optimal_P.zip(report.optimal_t)?;
    Some(Energy::new::<joule>(power * time).get::<kilowatt_hour>())
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| format!("{v:.2}"))
}

/// Renders one report as an aligned two-decimal table.
#[must_use]
pub fn report_text(report: &Report) -> String {
    if let (false, Some(message)) = (report.success, report.error_message.as_deref()) {
        return format!("optimization failed: {message}\n");
    }

    let rows = [
        ("Power P [W]", report.optimal_P),
        ("Velocity v", report.optimal_v),
        ("Time t [s]", report.optimal_t),
        ("Thickness d [m]", report.optimal_d),
        ("Objective", report.min_value),
        ("Max temperature [°C]", report.max_temperature),
        ("Heating rate", report.heating_rate),
        ("Balance error [J]", report.balance_error),
        ("Energy input [kWh]", energy_kwh(report)),
    ];

    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(out, "{label:<22}{:>14}", cell(value));
    }
    out
}

/// Renders history entries, one line each.
#[must_use]
pub fn history_text(entries: &[HistoryEntry]) -> String {
    let mut out = format!(
        "{:>5}  {:<27}  {:<6}  {:>10}  {:>6}  {:>9}  {:>6}  {:>9}  {:>9}\n",
        "id", "created", "status", "P", "v", "t", "d", "objective", "T max"
    );

    for entry in entries {
        let r = &entry.report;
        let status = if r.success { "ok" } else { "failed" };
        let _ = writeln!(
            out,
            "{:>5}  {:<27}  {:<6}  {:>10}  {:>6}  {:>9}  {:>6}  {:>9}  {:>9}",
            entry.id,
            entry.created_at.to_string(),
            status,
            cell(r.optimal_P),
            cell(r.optimal_v),
            cell(r.optimal_t),
            cell(r.optimal_d),
            cell(r.min_value),
            cell(r.max_temperature),
        );
        if let Some(message) = &r.error_message {
            let _ = writeln!(out, "       {message}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn solved() -> Report {
        Report {
            optimal_P: Some(3000.0),
            optimal_v: Some(0.5),
            optimal_t: Some(1200.0),
            optimal_d: Some(0.3),
            min_value: Some(17.456),
            max_temperature: Some(800.0),
            heating_rate: Some(0.67),
            balance_error: Some(0.0),
            success: true,
            error_message: None,
        }
    }

    #[test]
    fn energy_in_kilowatt_hours() {
        // 3.6 MJ
        assert_relative_eq!(energy_kwh(&solved()).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn text_uses_two_decimals() {
        let text = report_text(&solved());

        assert!(text.contains("3000.00"));
        assert!(text.contains("17.46"));
        assert!(text.lines().any(|l| l.starts_with("Energy input") && l.ends_with("1.00")));
    }

    #[test]
    fn text_reports_failure() {
        let report = Report {
            success: false,
            error_message: Some("midpoint power is zero".into()),
            ..solved()
        };

        assert_eq!(
            report_text(&report),
            "optimization failed: midpoint power is zero\n"
        );
    }
}
