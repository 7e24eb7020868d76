use blueprint_store::BlueprintStore;
use rule_engine::{Failure, RuleEngine};
use symbol_detector::{NullSymbolModel, StubSymbolModel, SymbolDetector, SymbolModel};
use text_extractor::{TextExtractor, TextractRecognizer};
use validation_pipeline::{PipelineConfig, ValidationPipeline};
use vectorize_client::{FileVectorCache, HttpVectorSource, VectorizeClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (file_name, owner_id) = match (args.next(), args.next().and_then(|s| s.parse().ok())) {
        (Some(file), Some(owner)) => (file, owner),
        _ => {
            eprintln!("Usage: validation-pipeline <file_name> <owner_id>");
            std::process::exit(2);
        }
    };

    println!("🚀 Floorplan Compliance Validation");
    println!("==================================\n");

    let config = PipelineConfig::from_env()?;
    let store = BlueprintStore::new(&config.data_root);

    let source = HttpVectorSource::new(&config.vectorizer_endpoint, config.request_timeout)?;
    let cache = FileVectorCache::new(store.clone());
    let vectorizer = VectorizeClient::new(source, cache);

    // Without trained weights the detector contributes nothing; zero
    // detections are still a valid pipeline outcome.
    let model: Box<dyn SymbolModel> = match std::env::var("MODEL_PATH") {
        Ok(path) => Box::new(StubSymbolModel::new(path)),
        Err(_) => Box::new(NullSymbolModel::new()),
    };
    println!("🔧 Symbol model: {}", model.model_info());
    let detector = SymbolDetector::new(model, config.detector.clone());

    println!("🔧 Initializing AWS Textract client...");
    let extractor = TextExtractor::new(TextractRecognizer::from_env().await);

    let pipeline = ValidationPipeline::new(
        store,
        vectorizer,
        detector,
        extractor,
        RuleEngine::new(config.rules.clone()),
    );

    println!("🔍 Validating {} (owner {})...\n", file_name, owner_id);

    match pipeline.run_validation(&file_name, owner_id).await {
        Ok(failures) => {
            print_report(&file_name, owner_id, &failures);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Validation did not run to completion: {}", e);
            Err(e.into())
        }
    }
}

fn print_report(file_name: &str, owner_id: u64, failures: &[Failure]) {
    println!("==================================");
    println!("📊 Validation Report");
    println!("==================================\n");
    println!("File:  {} (owner {})", file_name, owner_id);
    println!("Run:   {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));

    if failures.is_empty() {
        println!("\n✅ Compliant: no guideline violations found");
        return;
    }

    println!("\n❌ {} guideline violation(s):\n", failures.len());
    println!("{:<6} {:<28} {}", "Code", "Guideline", "Location");
    println!("{}", "-".repeat(60));

    for failure in failures {
        let info = failure.guideline.info();
        let location = failure
            .location
            .map(|p| format!("({:.1}, {:.1})", p.x, p.y))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<6} {:<28} {}", failure.guideline.code(), info.title, location);
    }
}
