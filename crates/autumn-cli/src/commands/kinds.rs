//! `autumn kinds`: list registered chart kinds.

use std::io::Write;

use anyhow::Result;
use chrono::TimeZone;

use crate::charts::ChartRegistry;

pub fn run<Tz: TimeZone>(registry: &ChartRegistry<Tz>) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write_kinds(registry, &mut stdout)
}

fn write_kinds<Tz: TimeZone>(registry: &ChartRegistry<Tz>, out: &mut impl Write) -> Result<()> {
    for kind in registry.kinds() {
        writeln!(out, "{kind}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use insta::assert_snapshot;

    #[test]
    fn test_lists_standard_kinds() {
        let mut out = Vec::new();
        write_kinds(&ChartRegistry::<Utc>::standard(), &mut out).unwrap();

        assert_snapshot!(String::from_utf8(out).unwrap().trim_end(), @r"
        pie
        bar
        scatter
        scatter_subprojects
        line
        line_subprojects
        stacked_area
        stacked_area_subprojects
        cumulative
        calendar
        heatmap
        histogram
        radar
        status
        context
        bubble
        treemap
        ");
    }
}
