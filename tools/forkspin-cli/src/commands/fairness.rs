//! Check the shuffle for position bias.

use anyhow::{bail, Result};
use forkspin_ads::listing::shuffle;
use serde::Serialize;

use super::{rng_from, FairnessArgs};
use crate::context::Context;
use crate::output::format_percent;

#[derive(Debug, Serialize)]
struct FairnessReport {
    items: usize,
    runs: usize,
    expected: f64,
    /// `counts[item][position]`
    counts: Vec<Vec<usize>>,
    max_deviation: f64,
}

/// Shuffle `items` positions `runs` times and tally where each lands.
fn tally<R: rand::Rng>(items: usize, runs: usize, rng: &mut R) -> FairnessReport {
    let mut counts = vec![vec![0usize; items]; items];
    let mut order: Vec<usize> = (0..items).collect();

    for _ in 0..runs {
        order.sort_unstable();
        shuffle(&mut order, rng);
        for (position, item) in order.iter().enumerate() {
            counts[*item][position] += 1;
        }
    }

    let expected = runs as f64 / items as f64;
    let max_deviation = counts
        .iter()
        .flatten()
        .map(|&count| (count as f64 - expected).abs() / expected)
        .fold(0.0, f64::max);

    FairnessReport {
        items,
        runs,
        expected,
        counts,
        max_deviation,
    }
}

/// Run the fairness command.
pub async fn run(args: FairnessArgs, ctx: &Context) -> Result<()> {
    if args.items < 2 || args.runs == 0 {
        bail!("Need at least 2 items and 1 run");
    }

    let mut rng = rng_from(args.seed);
    let report = tally(args.items, args.runs, &mut rng);

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header(&format!(
        "{} shuffles of {} items (expected {:.0} per cell)",
        report.runs, report.items, report.expected
    ));

    let mut header = vec!["ITEM".to_string()];
    header.extend((1..=report.items).map(|p| format!("P{}", p)));
    let widths = vec![6; header.len()];
    let header: Vec<&str> = header.iter().map(String::as_str).collect();
    ctx.output.table_row(&header, &widths);

    for (item, row) in report.counts.iter().enumerate() {
        let mut cells = vec![item.to_string()];
        cells.extend(row.iter().map(|c| c.to_string()));
        let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
        ctx.output.table_row(&cells, &widths);
    }

    ctx.output
        .kv("max deviation", &format_percent(report.max_deviation));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_tally_is_balanced() {
        let mut rng = StdRng::seed_from_u64(17);
        let report = tally(5, 10_000, &mut rng);
        assert_eq!(report.expected, 2000.0);
        for row in &report.counts {
            assert_eq!(row.iter().sum::<usize>(), 10_000);
        }
        assert!(report.max_deviation < 0.1, "deviation {}", report.max_deviation);
    }
}
