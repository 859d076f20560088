#[tokio::main]
async fn main() -> anyhow::Result<()> {
    todo_server::start_server().await
}
