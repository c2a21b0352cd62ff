use reqwest::Client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new();
    let base_url = std::env::var("CHAT_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());

    println!("Testing chat API at {base_url}");

    println!("\nLiveness:");
    let root_response = client.get(format!("{}/", base_url)).send().await?;
    println!("Status: {}", root_response.status());
    let root_json: serde_json::Value = root_response.json().await?;
    println!("Response: {}", serde_json::to_string_pretty(&root_json)?);

    println!("\nDirect question:");
    let chat_response = client
        .post(format!("{}/chat", base_url))
        .form(&[("question", "What is the refund policy?"), ("private", "false")])
        .send()
        .await?;
    println!("Status: {}", chat_response.status());
    let chat_json: serde_json::Value = chat_response.json().await?;
    println!("Response: {}", serde_json::to_string_pretty(&chat_json)?);

    println!("\nPrivate mode without a file:");
    let rejected = client
        .post(format!("{}/chat", base_url))
        .form(&[("question", "What is the refund policy?"), ("private", "true")])
        .send()
        .await?;
    let rejected_json: serde_json::Value = rejected.json().await?;
    println!("Response: {}", serde_json::to_string_pretty(&rejected_json)?);

    println!("\nClient test completed!");
    Ok(())
}
