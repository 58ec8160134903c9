// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use std::{env, sync::Arc};
use stonescan_node::{
    api::{self, ApiConfig},
    cli::Cli,
    config::{ServerConfig, DEFAULT_MODEL_PATH},
    detector::DetectorManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", if cli.debug { "debug" } else { "info" });
    }
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_cli(&cli);

    println!("🚀 Starting StoneScan Node...\n");
    println!("📦 BUILD VERSION: {}", stonescan_node::version::VERSION);
    println!("📅 Build Date: {}", stonescan_node::version::BUILD_DATE);
    println!();

    // Initialize the detector
    println!("🧠 Initializing kidney stone detector...");
    let detector_manager = if config.model_path.exists() {
        let manager = DetectorManager::load(&config).await;
        if manager.is_available() {
            let summary = manager.summary();
            println!("✅ Detection model loaded: {}", summary.path);
            if let Some(sha256) = &summary.sha256 {
                println!("   Checkpoint SHA-256: {}", &sha256[..16]);
            }
            println!("   Classes: {}", summary.labels.join(", "));
            println!("   Input size: {0}x{0}", summary.input_size);
        } else {
            println!("⚠️  Failed to load model from: {}", config.model_path.display());
            println!("   The server will start but detection endpoints will return 503.");
        }
        manager
    } else {
        println!("⚠️  Warning: Model not found at {}", config.model_path.display());
        println!(
            "   Please place the ONNX checkpoint at {} or set MODEL_PATH.",
            DEFAULT_MODEL_PATH
        );
        println!("   The server will start but detection endpoints will return 503.");
        DetectorManager::unavailable(&config)
    };

    // Print service banner
    let separator = "=".repeat(64);
    println!("\n{}", separator);
    println!("🏥 Kidney Stone Detection System");
    println!("   Powered by YOLOv8 with Multi-Level Explainability");
    println!("{}", separator);
    println!("🌐 Local:   http://localhost:{}", config.port);
    println!("🌐 Network: http://{}:{}", config.host, config.port);
    println!("\nAPI Endpoints:");
    println!("  Health:   http://localhost:{}/health", config.port);
    println!("  Status:   http://localhost:{}/api/status", config.port);
    println!("  Detect:   POST http://localhost:{}/api/detect", config.port);
    println!(
        "  Upload:   POST http://localhost:{}/api/detect/upload",
        config.port
    );
    if config.debug {
        println!("\n🔧 Debug mode enabled (verbose logging, error details in responses)");
    }
    println!("\nPress Ctrl+C to shutdown...");
    println!("{}\n", separator);

    // Start the web server; blocks until shutdown
    let api_config = ApiConfig {
        listen_addr: config.bind_addr(),
        enable_error_details: config.debug,
        max_body_bytes: config.max_upload_bytes,
    };

    api::serve(api_config, Arc::new(detector_manager)).await?;

    println!("👋 Goodbye!");
    Ok(())
}
