//! Drives a running wordstat server through one upload.
//!
//! Start the server with an object store that holds `gs://b/a.txt`, then:
//! `cargo run -p wordstat-server --example api_client`

use reqwest::Client;
use serde_json::json;

const SERVER_URL: &str = "http://localhost:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = Client::new();
    let target = json!({"bucket_name": "b", "file_path": "a.txt"});

    println!("1. Health Check:");
    let resp = client.get(format!("{SERVER_URL}/health")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("2. Word Count:");
    let resp = client
        .post(format!("{SERVER_URL}/word-count"))
        .json(&target)
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("3. Top Words:");
    let resp = client
        .post(format!("{SERVER_URL}/top-words"))
        .json(&target)
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("4. Upload Notification:");
    let resp = client
        .post(format!("{SERVER_URL}/events/upload"))
        .json(&json!({"bucket": "b", "name": "a.txt", "generation": "1"}))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("5. Synchronous Workflow Run:");
    let resp = client
        .post(format!("{SERVER_URL}/workflows/run"))
        .json(&target)
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);

    Ok(())
}
