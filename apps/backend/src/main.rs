#[tokio::main]
async fn main() -> anyhow::Result<()> {
    exam_master_backend::run().await
}
