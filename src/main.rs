//! CLV Dashboard: renders the customer lifetime value dashboard
//!
//! This is the main entrypoint that loads the model and customer table once,
//! then renders and draws the dashboard for one or more segment selections.

use anyhow::{Context, Result};
use clap::Parser;
use clv_dashboard::{
    render, viz, Args, DashboardData, RenderConfig, SegmentSelection, ViewModel,
};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = args.render_config()?;

    let load_start = Instant::now();
    let data = DashboardData::load(&args.model, &args.data)
        .context("failed to load dashboard inputs")?;

    if data.customers.is_empty() {
        log::warn!("customer table {} has no rows; every chart will be empty", args.data);
    }

    if args.verbose {
        log::debug!(
            "model artifact: {} ({} bytes)",
            data.model.path().display(),
            data.model.size_bytes()
        );
        log::debug!("available segments: {}", data.customers.segments().join(", "));
        log::debug!("load time: {:.2}s", load_start.elapsed().as_secs_f64());
    }

    if args.interactive {
        run_interactive(&args, &data, &config)
    } else {
        let selection = match args.segments {
            Some(ref raw) => SegmentSelection::parse(raw, &data.customers),
            None => SegmentSelection::all(&data.customers),
        };
        run_pass(&args, &data, &config, &selection)?;
        Ok(())
    }
}

/// One full render-and-draw pass for a selection
fn run_pass(
    args: &Args,
    data: &DashboardData,
    config: &RenderConfig,
    selection: &SegmentSelection,
) -> Result<ViewModel> {
    let start_time = Instant::now();

    for label in selection.unknown_labels(&data.customers) {
        log::warn!("segment '{}' does not occur in the customer table", label);
    }

    let vm = render(&data.customers, selection, config);
    viz::draw_dashboard(&vm, Path::new(&args.output))
        .with_context(|| format!("failed to draw dashboard to {}", args.output))?;

    if let Some(ref json_path) = args.json {
        let json = serde_json::to_string_pretty(&vm)?;
        std::fs::write(json_path, json)
            .with_context(|| format!("failed to write view model to {}", json_path))?;
        log::info!("view model saved to {}", json_path);
    }

    print!("{}", viz::format_metrics(&vm));
    if args.show_table {
        println!("\n=== Filtered Customer Data ===");
        print!("{}", viz::format_table(&vm.table));
    }

    log::debug!("render time: {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(vm)
}

/// Re-render on every selection read from stdin until EOF or `quit`
fn run_interactive(args: &Args, data: &DashboardData, config: &RenderConfig) -> Result<()> {
    println!("Segments: {}", data.customers.segments().join(", "));
    println!(
        "Enter a comma-separated selection, '*' for all, an empty line for none, 'quit' to exit."
    );

    run_pass(args, data, config, &SegmentSelection::all(&data.customers))?;

    let stdin = io::stdin();
    loop {
        print!("segments> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }

        let selection = SegmentSelection::parse(&line, &data.customers);
        run_pass(args, data, config, &selection)?;
    }

    Ok(())
}
