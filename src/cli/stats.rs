//! Stats command: print or reset the generation counters

use std::path::Path;
use std::process::ExitCode;

use super::session::load_effective_config;
use super::{GlobalOpts, EXIT_ERROR, EXIT_SUCCESS};
use crate::config::loader::CliOverrides;
use crate::rarity::Grade;
use crate::stats::StatsRecord;

/// Run the stats command
pub fn run_stats(global: &GlobalOpts, stats: Option<&Path>, reset: bool, json: bool) -> ExitCode {
    let overrides = CliOverrides {
        stats: stats.map(|p| p.to_path_buf()),
        ..Default::default()
    };
    let config = match load_effective_config(global, &overrides) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let path = &config.project.stats;

    let record = if reset {
        let empty = StatsRecord::new();
        if let Err(e) = empty.save(path) {
            eprintln!("Error: Failed to reset '{}': {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
        empty
    } else {
        match StatsRecord::load(path) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    };

    if json {
        match serde_json::to_string_pretty(&record) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        if reset {
            println!("Stats reset: {}", path.display());
        }
        print_record(&record);
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn print_record(record: &StatsRecord) {
    println!("Total: {}", record.total);
    for grade in Grade::ALL {
        let n = record.count(grade);
        let share = if record.total > 0 {
            n as f64 * 100.0 / record.total as f64
        } else {
            0.0
        };
        println!("  {:<4} {:>6} ({:5.1}%)", grade.label(), n, share);
    }
    println!("Rare (S and above): {}", record.rare_count());
}
