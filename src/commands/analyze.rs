// src/commands/analyze.rs

use crate::analysis::AnalysisService;
use crate::datamodel::ProjectReport;
use std::process::ExitCode;

/// Run the full analysis and print the report to stdout. Warnings and
/// the run summary go to stderr; a fatal error prints a diagnostic and
/// leaves stdout empty.
pub fn run_analysis(path: &str, pretty: bool) -> ExitCode {
    let service = AnalysisService::with_defaults();
    let report = match service.analyze_project(path) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Error: {:?}", miette::Report::new(err));
            return ExitCode::FAILURE;
        }
    };

    let json = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    match json {
        Ok(out) => println!("{}", out),
        Err(err) => {
            eprintln!("error: failed to serialize report: {}", err);
            return ExitCode::FAILURE;
        }
    }

    print_summary(&report);
    ExitCode::SUCCESS
}

fn print_summary(report: &ProjectReport) {
    let interface_count: usize = report.packages.iter().map(|p| p.interfaces.len()).sum();
    let impl_count: usize = report
        .packages
        .iter()
        .flat_map(|p| p.interfaces.iter())
        .map(|i| i.implementations.len())
        .sum();
    let call_count: usize = report.packages.iter().map(|p| p.calls.len()).sum();
    eprintln!(
        "analyzed {} package(s): {} interface(s), {} implementation(s), {} call site(s)",
        report.packages.len(),
        interface_count,
        impl_count,
        call_count
    );
}
