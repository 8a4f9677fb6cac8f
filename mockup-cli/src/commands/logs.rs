//! `mockup logs`: tail of the task log.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

/// Arguments for `mockup logs`.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Number of trailing lines to show.
    #[arg(long, default_value_t = 50)]
    pub lines: usize,
}

impl LogsArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = super::load_config(config_path)?;
        print_tail(&config.layout.log_path(), self.lines)
    }
}

fn print_tail(path: &Path, lines: usize) -> Result<()> {
    if !path.exists() {
        println!("log file not found: {}", path.display());
        return Ok(());
    }

    let reader = BufReader::new(File::open(path).with_context(|| format!("open {}", path.display()))?);
    let mut tail = VecDeque::with_capacity(lines);
    for line in reader.lines() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if lines == 0 {
            continue;
        }
        if tail.len() == lines {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    for line in tail {
        println!("{line}");
    }
    Ok(())
}
