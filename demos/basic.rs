use deere_http::{DeereClient, Environment};
use serde_json::Value;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let token = std::env::var("DEERE_ACCESS_TOKEN")?;

    let client = DeereClient::new(token).with_environment(Environment::Sandbox);

    let orgs: Value = client.get("/organizations", None).await?;
    println!("{orgs:#}");

    Ok(())
}
