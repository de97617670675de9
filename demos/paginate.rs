use std::time::Duration;

use deere_http::{CancellationToken, ClientOptions, DeereClient, RequestOptions};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Field {
    id: String,
    name: String,
}

/// Resource wrappers own their paths; the client handles paging and retries.
struct FieldsApi<'a> {
    client: &'a DeereClient,
}

impl<'a> FieldsApi<'a> {
    async fn list_all(&self, org_id: &str, options: &RequestOptions) -> deere_http::Result<Vec<Field>> {
        self.client
            .get_all(&format!("/organizations/{org_id}/fields"), Some(options))
            .await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let org_id = std::env::var("DEERE_ORG_ID")?;
    let client = DeereClient::from_env()
        .map_err(anyhow::Error::msg)?
        .with_options(ClientOptions {
            timeout_ms: 10_000,
            max_retries: 5,
            jitter_seed: None,
        });

    let cancel = CancellationToken::new();
    let options = RequestOptions::new()
        .timeout(Duration::from_secs(15))
        .cancel_token(cancel.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(120)).await;
        cancel.cancel();
    });

    let fields = FieldsApi { client: &client }.list_all(&org_id, &options).await?;
    for field in fields {
        println!("{} {}", field.id, field.name);
    }

    let mut pages = client.paginate::<serde_json::Value>(
        &format!("/organizations/{org_id}/farms"),
        Some(&options),
    );
    let mut index = 0;
    while let Some(page) = pages.next_page().await? {
        index += 1;
        println!("farms page {index}: {} items", page.len());
    }

    Ok(())
}
