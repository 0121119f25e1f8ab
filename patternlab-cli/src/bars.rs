//! CSV bar files: `date,open,high,low,close,volume`, one file per symbol.

use std::path::Path;

use anyhow::{bail, Context, Result};
use patternlab_core::Bar;

/// Symbol named by the file stem (`data/AAPL.csv` -> `AAPL`).
pub fn symbol_for(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a symbol from {}", path.display()))
}

/// Read a bar file, requiring strictly increasing dates.
pub fn read_bars(path: &Path) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut bars: Vec<Bar> = Vec::new();
    for (i, row) in reader.deserialize::<Bar>().enumerate() {
        let bar = row.with_context(|| format!("{}: bad row {}", path.display(), i + 1))?;
        if let Some(prev) = bars.last() {
            if bar.date <= prev.date {
                bail!(
                    "{}: row {} dated {} does not follow {}",
                    path.display(),
                    i + 1,
                    bar.date,
                    prev.date
                );
            }
        }
        bars.push(bar);
    }
    Ok(bars)
}

pub fn write_bars(path: &Path, bars: &[Bar]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush().context("failed to flush CSV writer")?;
    Ok(())
}
