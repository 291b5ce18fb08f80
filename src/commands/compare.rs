use anyhow::Result;
use tracing::info;

use crate::cli::CompareArgs;
use crate::model::{Benefit, Policy};
use crate::util::read_json;

const MISSING: &str = "-";

pub fn run(args: CompareArgs) -> Result<()> {
    let left: Policy = read_json(&args.left)?;
    let right: Policy = read_json(&args.right)?;

    info!(
        left = %left.product_name,
        right = %right.product_name,
        "comparing medical benefits"
    );
    print!("{}", compare_medical_markdown(&left, &right));

    Ok(())
}

pub fn compare_medical_markdown(left: &Policy, right: &Policy) -> String {
    let left_medical = left.medical();
    let right_medical = right.medical();

    let row = |label: &str, value: fn(&Benefit) -> String| {
        [
            label.to_string(),
            left_medical.map_or_else(|| MISSING.to_string(), value),
            right_medical.map_or_else(|| MISSING.to_string(), value),
        ]
    };

    let rows = vec![
        row("Medical Coverage", |benefit| {
            format_money(benefit.max_limit, &benefit.currency)
        }),
        row("Per", |benefit| {
            benefit
                .per
                .map_or_else(|| MISSING.to_string(), |unit| unit.as_str().to_string())
        }),
        row("TCM sub-limit", |benefit| {
            format_money(benefit.sublimits.get("tcm").copied(), &benefit.currency)
        }),
        row("Dental sub-limit", |benefit| {
            format_money(benefit.sublimits.get("dental").copied(), &benefit.currency)
        }),
    ];

    let header = [
        "Medical Coverage".to_string(),
        left.product_name.clone(),
        right.product_name.clone(),
    ];
    render_table(&header, &rows)
}

/// `SGD 100,000` style amounts; whole numbers drop the fraction.
pub fn format_money(value: Option<f64>, currency: &str) -> String {
    let Some(value) = value else {
        return MISSING.to_string();
    };

    let rounded = (value * 100.0).round() / 100.0;
    let whole = rounded.trunc();
    let fraction = ((rounded - whole).abs() * 100.0).round() as u64;

    let mut grouped = group_thousands(whole.abs() as u64);
    if rounded < 0.0 {
        grouped.insert(0, '-');
    }
    if fraction > 0 {
        grouped.push_str(&format!(".{fraction:02}"));
    }

    format!("{currency} {grouped}")
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn render_table(header: &[String; 3], rows: &[[String; 3]]) -> String {
    let mut widths = header.clone().map(|cell| cell.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String; 3]| {
        let padded = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<String>>();
        format!("| {} |\n", padded.join(" | "))
    };

    let mut table = line(header);
    let separator = widths
        .iter()
        .map(|width| "-".repeat(width + 2))
        .collect::<Vec<String>>();
    table.push_str(&format!("|{}|\n", separator.join("|")));
    for row in rows {
        table.push_str(&line(row));
    }
    table
}
