use ramut::runtime::{boot, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let (config, root) = boot::boot().await?;
    run::run(config, root).await
}
