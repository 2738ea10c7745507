#[tokio::main]
async fn main() {
    yardbook_backend::run().await;
}
