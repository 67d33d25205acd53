#[tokio::main]
async fn main() {
    if let Err(e) = invitation_server::run_with_config().await {
        eprintln!("invitation server stopped: {e}");
        std::process::exit(1);
    }
}
