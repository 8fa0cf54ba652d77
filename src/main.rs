#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = llm_homework::run().await {
        eprintln!("llm-homework fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
