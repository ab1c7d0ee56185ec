use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use voc2yolo::utils::create_output_directory;
use voc2yolo::{process_dataset, strategy_for, Args};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let layout = args.layout();
    if !layout.dataset_dir.exists() {
        error!(
            "The specified dataset_dir does not exist: {}",
            layout.dataset_dir.display()
        );
        return ExitCode::FAILURE;
    }

    if args.clean {
        if let Err(e) = create_output_directory(&layout.output_dir) {
            error!("Failed to set up output directory: {}", e);
            return ExitCode::FAILURE;
        }
    }

    info!("Starting the conversion process...");
    let strategy = strategy_for(args.output_format);
    match process_dataset(&layout, strategy.as_ref()) {
        Ok(_) => {
            info!("Conversion process completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to process dataset: {}", e);
            ExitCode::FAILURE
        }
    }
}
