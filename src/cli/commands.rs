use anyhow::{bail, Context};
use serde_json::{json, Value};

use super::OutputFormat;

/// Thin HTTP client over the dashboard API
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let mut request = self.http.get(format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to {}{} failed", self.base_url, path))?;

        let status = response.status();
        let body: Value = response.json().await.context("response was not JSON")?;

        if !status.is_success() {
            bail!(
                "server returned {}: {}",
                status,
                body.get("message").and_then(Value::as_str).unwrap_or("unknown error")
            );
        }

        Ok(body)
    }

    async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("request to {}{} failed", self.base_url, path))?;

        let status = response.status();
        let body: Value = response.json().await.context("response was not JSON")?;

        if !status.is_success() {
            bail!(
                "server returned {}: {}",
                status,
                body.get("message").and_then(Value::as_str).unwrap_or("unknown error")
            );
        }

        Ok(body)
    }
}

fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()));
}

pub async fn health(client: &ApiClient, format: OutputFormat) -> anyhow::Result<()> {
    let body = client.get("/health").await?;

    match format {
        OutputFormat::Json => print_json(&body),
        OutputFormat::Text => {
            let status = body["data"]["status"].as_str().unwrap_or("unknown");
            println!("status: {}", status);
        }
    }

    Ok(())
}

pub async fn info(client: &ApiClient, format: OutputFormat) -> anyhow::Result<()> {
    let body = client.get("/").await?;

    match format {
        OutputFormat::Json => print_json(&body),
        OutputFormat::Text => {
            let data = &body["data"];
            println!(
                "{} v{}",
                data["name"].as_str().unwrap_or("unknown"),
                data["version"].as_str().unwrap_or("?")
            );
            if let Some(endpoints) = data["endpoints"].as_object() {
                for (name, route) in endpoints {
                    println!("  {:<14} {}", name, route.as_str().unwrap_or(""));
                }
            }
        }
    }

    Ok(())
}

pub async fn login(
    client: &ApiClient,
    email: &str,
    password: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let body = client
        .post("/auth/login", &json!({ "email": email, "password": password }))
        .await?;

    match format {
        OutputFormat::Json => print_json(&body),
        OutputFormat::Text => {
            println!("{}", body["data"]["token"].as_str().unwrap_or(""));
        }
    }

    Ok(())
}

pub async fn plans(client: &ApiClient, format: OutputFormat) -> anyhow::Result<()> {
    let body = client.get("/api/plans").await?;

    match format {
        OutputFormat::Json => print_json(&body),
        OutputFormat::Text => {
            if let Some(plans) = body["data"].as_array() {
                for plan in plans {
                    println!(
                        "{:<10} {:>5} files/month  {:>3} members  ${}/month",
                        plan["name"].as_str().unwrap_or("?"),
                        plan["files_per_month"].as_i64().unwrap_or(0),
                        plan["max_team_members"].as_i64().unwrap_or(0),
                        plan["price_monthly"].as_str().unwrap_or("0"),
                    );
                }
            }
        }
    }

    Ok(())
}

pub async fn usage(client: &ApiClient, format: OutputFormat) -> anyhow::Result<()> {
    let body = client.get("/api/usage").await?;

    match format {
        OutputFormat::Json => print_json(&body),
        OutputFormat::Text => {
            let data = &body["data"];
            println!(
                "{} of {} analyses used this month ({} plan)",
                data["current"].as_i64().unwrap_or(0),
                data["limit"].as_i64().unwrap_or(0),
                data["plan_name"].as_str().unwrap_or("unknown"),
            );
        }
    }

    Ok(())
}
