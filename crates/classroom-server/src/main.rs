#[tokio::main]
async fn main() -> anyhow::Result<()> {
    classroom_server::run().await
}
