use seating_engine::{
    ApiResponse, AppError, RunRequest, SeatingManager, WeddingData, setup_environment,
};
use shared::models::AssignmentType;

const USAGE: &str = "usage: seating-engine <wedding.json> [real|simulation]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, work dir, logging)
    let config = setup_environment()?;

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };
    let assignment_type = match args.next() {
        Some(arg) => arg
            .parse::<AssignmentType>()
            .map_err(|e| anyhow::anyhow!("{}\n{}", e, USAGE))?,
        None => AssignmentType::Real,
    };

    // 2. Import the wedding snapshot
    let data: WeddingData = serde_json::from_slice(&std::fs::read(&input)?)?;
    let wedding_id = data.wedding.id;

    let manager = SeatingManager::new(config.db_path(), config.event_channel_capacity)?;
    manager.storage().import(&data)?;

    tracing::info!(
        wedding_id,
        assignment_type = %assignment_type,
        db = %config.db_path().display(),
        "Starting seating run"
    );

    // 3. Run and print the outcome
    let request = RunRequest::full(wedding_id, assignment_type);
    let outcome = match manager.run_with_timeout(request, config.run_timeout()).await {
        Ok(result) => manager
            .get_plan(wedding_id, assignment_type)
            .map(|plan| serde_json::json!({ "result": result, "plan": plan })),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&ApiResponse::success(body))?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Seating run failed");
            let err = AppError::from(e);
            println!("{}", serde_json::to_string_pretty(&ApiResponse::<()>::error(&err))?);
            std::process::exit(1);
        }
    }
}
