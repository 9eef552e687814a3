//! Detect a synthetic flu outbreak and print the ranked patterns, the
//! diagnostics and a report prompt for the best pattern.
//!
//! Run with `cargo run --example outbreak_detection`; set `RUST_LOG=debug`
//! for stage-level logs.

use casepat_rs::{CaseTable, Engine, PatternConfig, PromptTemplate, TableSchema};

const PROMPT: &str = "Pattern {pattern} stands out in {period}.\n\n\
Support per period:\n{time_series}\n\
Co-occurring attributes:\n{attribute_counts}\n\
{instructions}";

fn outbreak_table() -> casepat_rs::Result<CaseTable> {
    let mut t = CaseTable::new(["Year", "Region", "Diagnosis", "AgeGroup"]);
    for year in ["2019", "2020", "2021", "2022"] {
        for i in 0..20 {
            let age = if i % 2 == 0 { "adult" } else { "child" };
            for flu in ["FluA", "FluB", "FluC"] {
                t.push_row([year, "South", flu, age])?;
            }
            for flu in ["FluB", "FluC"] {
                t.push_row([year, "North", flu, age])?;
            }
        }
    }
    for i in 0..100 {
        let age = if i % 5 == 0 { "adult" } else { "child" };
        t.push_row(["2020", "North", "FluA", age])?;
    }
    Ok(t)
}

fn main() -> casepat_rs::Result<()> {
    tracing_subscriber::fmt::init();

    let table = outbreak_table()?;
    let schema = TableSchema::new("Year");
    let engine = Engine::new(PatternConfig::new(5, 4))?;
    let (detection, context) = engine.detect_and_explain(&table, &schema)?;

    println!(
        "{:<6} {:<50} {:>3} {:>6} {:>5} {:>7} {:>4} {:>6}",
        "period", "pattern", "len", "count", "mean", "z", "det", "score"
    );
    for row in detection.patterns.iter().take(10) {
        println!(
            "{:<6} {:<50} {:>3} {:>6} {:>5} {:>7.2} {:>4} {:>6.2}",
            row.period,
            row.pattern,
            row.length,
            row.count,
            row.mean,
            row.z_score,
            row.detections,
            row.overall_score
        );
    }

    let d = &detection.diagnostics;
    println!(
        "\n{} subjects, {} periods, {} nodes; {} of {} (period, pair) combinations converged",
        d.n_subjects, d.n_periods, d.n_nodes, d.close_pairs, d.all_pairs
    );
    for warning in &d.warnings {
        println!("warning: {warning:?}");
    }

    if let Some(context) = context {
        let context = context.with_instructions("Summarize the outbreak in two sentences.");
        println!("\n{}", PromptTemplate::new(PROMPT).render(&context));
    }
    Ok(())
}
