//! Single character generation command

use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use super::session::{default_character_path, Session};
use super::{GlobalOpts, RenderArgs, EXIT_ERROR, EXIT_SUCCESS};
use crate::generator::DrawReport;
use crate::output::{present, save_png, timestamp_slug};

#[derive(Serialize)]
struct GenerateSummary<'a> {
    output: String,
    #[serde(flatten)]
    report: &'a DrawReport,
}

/// Run the generate command
pub fn run_generate(global: &GlobalOpts, render: &RenderArgs, output: Option<&Path>, json: bool) -> ExitCode {
    let mut session = match Session::open(global, render) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let presentation = session.presentation();
    let policy = session.policy;
    let path = match output {
        Some(p) => p.to_path_buf(),
        None => default_character_path(session.out_dir(), &timestamp_slug()),
    };

    let (selector, cache, rng) = session.split();
    let generation = match selector.generate(rng, cache, policy) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let report = selector.report(&generation.draw, &generation.rarity);

    let saved = present(&generation.sprite, &presentation).and_then(|image| save_png(&image, &path));
    if let Err(e) = saved {
        eprintln!("Error: Failed to write '{}': {}", path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    if json {
        let summary = GenerateSummary {
            output: path.display().to_string(),
            report: &report,
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        print_report(&report, &path);
    }

    session.record(&[report.grade]);
    ExitCode::from(EXIT_SUCCESS)
}

fn print_report(report: &DrawReport, path: &Path) {
    println!("Saved: {}", path.display());
    let rare = if report.rare { " - rare!" } else { "" };
    println!("  Grade: {} (score {:.2}){}", report.grade, report.score, rare);
    println!(
        "  Parts: skin {}, face {}, face2 {}, hair {} (hue +{}°)",
        report.keys.skin, report.keys.face, report.keys.face2, report.keys.hair, report.draw.hair_hue
    );
}
