// twin/src/commands/generate.rs
//
// USE CASE: Generate the twin directory.

use std::path::PathBuf;

use anyhow::Context;
use twin_core::application::generate_twin;
use twin_core::domain::DomainError;
use twin_core::infrastructure::api::StorageApiClient;
use twin_core::infrastructure::config::load_twin_config;
use twin_core::infrastructure::render::GuideRenderer;
use twin_core::infrastructure::scanner::TransformationScanner;
use twin_core::ports::StorageApi;

pub async fn execute(
    project_dir: PathBuf,
    output_dir: Option<String>,
    offline: bool,
) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // A. Load the Config (Infra)
    println!("⚙️  Loading configuration...");
    let mut config = load_twin_config(&project_dir).with_context(|| {
        format!("Failed to load twin configuration from {:?}", project_dir)
    })?;
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    tracing::debug!(output_dir = %config.output_dir, offline, "Configuration loaded");

    // B. Instantiate the API Adapter unless offline
    let client = if offline {
        None
    } else {
        let token = config
            .api
            .token
            .as_deref()
            .ok_or(DomainError::MissingToken)?;
        println!("   API: {}", config.api.base_url);
        Some(StorageApiClient::new(&config.api.base_url, token)?)
    };
    let api = client.as_ref().map(|c| c as &dyn StorageApi);

    // C. Run the Use Case (Application Layer)
    let renderer = GuideRenderer::new()?;
    let summary = generate_twin(&TransformationScanner, &renderer, api, &project_dir, &config)
        .await
        .context("Twin generation failed")?;

    println!("\n📊 Summary:");
    println!("   Tables:          {}", summary.tables);
    println!("   Transformations: {}", summary.transformations);
    println!("   Buckets:         {}", summary.buckets);
    println!("   Sources:         {}", summary.sources);
    println!("   Edges:           {}", summary.edges);
    println!("   Jobs:            {}", summary.jobs);
    println!("   Samples:         {}", summary.samples);

    if !summary.scan_failures.is_empty() {
        eprintln!(
            "\n⚠️  {} configuration(s) skipped:",
            summary.scan_failures.len()
        );
        for failure in &summary.scan_failures {
            eprintln!("   ❌ {}: {}", failure.path.display(), failure.reason);
        }
    }

    println!(
        "\n✨ SUCCESS! {} files written to {} in {:.2?}",
        summary.files_written,
        summary.output_dir.display(),
        start.elapsed()
    );
    Ok(())
}
