#[tokio::main]
async fn main() {
    auction_api::start(std::env::args()).await;
}
