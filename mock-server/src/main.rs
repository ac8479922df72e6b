//! Standalone mock cartes.io API, e.g. for trying the CLI with
//! `CARTES_BASE_URL=http://127.0.0.1:3000/api`.

use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let addr = listener.local_addr()?;
    println!("mock cartes.io API on http://{addr}/api");
    println!("authenticate with --api-key {}", mock_server::API_KEY);
    mock_server::run(listener).await
}
