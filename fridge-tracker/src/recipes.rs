use crate::types::{RecipeConfig, Result, TrackerError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const FALLBACK_RECIPE_NAME: &str = "Recipe Suggestions";

const SYSTEM_PROMPT: &str =
    "You are a helpful cooking assistant. Always respond with valid JSON format when requested.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub recipe_name: String,
    pub brief_description: String,
    pub main_ingredients: Vec<String>,
    pub estimated_cooking_time: String,
    pub difficulty_level: String,
}

/// Source of recipe suggestions for a set of fridge items.
#[async_trait]
pub trait RecipeAdapter: Send + Sync {
    fn adapter_name(&self) -> String;

    async fn suggest(&self, items: &[String]) -> Result<Vec<Recipe>>;
}

/// Chat-completion backed adapter. Makes one request per call, no retries.
pub struct OpenAiRecipeAdapter {
    client: Client,
    config: RecipeConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiRecipeAdapter {
    pub fn new(config: RecipeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    fn build_prompt(items: &[String]) -> String {
        format!(
            "I have the following ingredients in my fridge: {}.\n\n\
             Please suggest 3-5 creative and practical recipes I can make using some or all of these ingredients. \
             For each recipe, provide:\n\
             1. Recipe name\n\
             2. Brief description\n\
             3. Main ingredients needed (from my fridge items)\n\
             4. Estimated cooking time\n\
             5. Difficulty level (Easy/Medium/Hard)\n\n\
             Format your response as a JSON array of recipe objects. Each object should have properties: \
             recipe_name, brief_description, main_ingredients, estimated_cooking_time, difficulty_level.",
            items.join(", ")
        )
    }
}

#[async_trait]
impl RecipeAdapter for OpenAiRecipeAdapter {
    fn adapter_name(&self) -> String {
        format!("OpenAI ({})", self.config.model)
    }

    async fn suggest(&self, items: &[String]) -> Result<Vec<Recipe>> {
        validate_items(items)?;
        let api_key = self.config.api_key.as_deref().ok_or(TrackerError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT.to_string() },
                ChatMessage { role: "user", content: Self::build_prompt(items) },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Requesting recipes for {} items from {}", items.len(), self.config.api_url);

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("Recipe service error: HTTP {}", status);
            return Err(TrackerError::RecipeService { status: status.as_u16() });
        }

        let body: ChatResponse = response.json().await?;
        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(TrackerError::EmptyRecipeResponse)?;

        let recipes = parse_recipe_response(&text, items);
        info!("Received {} recipe suggestions", recipes.len());
        Ok(recipes)
    }
}

/// Offline adapter that builds one simple recipe per item.
pub struct MockRecipeAdapter {
    name: String,
}

impl MockRecipeAdapter {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

#[async_trait]
impl RecipeAdapter for MockRecipeAdapter {
    fn adapter_name(&self) -> String {
        format!("Mock Recipe Adapter ({})", self.name)
    }

    async fn suggest(&self, items: &[String]) -> Result<Vec<Recipe>> {
        validate_items(items)?;

        Ok(items
            .iter()
            .take(5)
            .map(|item| Recipe {
                recipe_name: format!("Simple {}", item),
                brief_description: format!("A quick dish built around {}.", item),
                main_ingredients: vec![item.clone()],
                estimated_cooking_time: "15 minutes".to_string(),
                difficulty_level: "Easy".to_string(),
            })
            .collect())
    }
}

fn validate_items(items: &[String]) -> Result<()> {
    if items.iter().all(|item| item.trim().is_empty()) {
        return Err(TrackerError::InvalidInput(
            "Please provide a non-empty list of fridge items".to_string(),
        ));
    }
    Ok(())
}

/// Turns the model's reply into recipes.
///
/// Tries the whole text as a JSON array, then the first fenced ```json
/// block, and otherwise wraps the raw text in a single catch-all recipe.
pub fn parse_recipe_response(text: &str, items: &[String]) -> Vec<Recipe> {
    if let Ok(recipes) = serde_json::from_str::<Vec<Recipe>>(text.trim()) {
        debug!("Parsed recipe reply as JSON");
        return recipes;
    }

    match extract_fenced_json(text) {
        Some(block) => match serde_json::from_str::<Vec<Recipe>>(block) {
            Ok(recipes) => {
                debug!("Parsed recipe reply from fenced JSON block");
                return recipes;
            }
            Err(e) => warn!("Fenced JSON block did not parse, using fallback: {}", e),
        },
        None => debug!("No fenced JSON in recipe reply, using fallback"),
    }

    vec![Recipe {
        recipe_name: FALLBACK_RECIPE_NAME.to_string(),
        brief_description: text.to_string(),
        main_ingredients: items.to_vec(),
        estimated_cooking_time: "Varies".to_string(),
        difficulty_level: "Varies".to_string(),
    }]
}

fn extract_fenced_json(text: &str) -> Option<&str> {
    const FENCE: &str = "```json";
    let start = text.find(FENCE)? + FENCE.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn items() -> Vec<String> {
        vec!["eggs".to_string(), "spinach".to_string()]
    }

    fn adapter_for(api_url: String) -> OpenAiRecipeAdapter {
        OpenAiRecipeAdapter::new(RecipeConfig {
            api_url,
            api_key: Some("test-key".to_string()),
            timeout_seconds: 5,
            ..RecipeConfig::default()
        })
        .unwrap()
    }

    /// Reads one full HTTP request (headers plus Content-Length body).
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + length {
                    return;
                }
            }
        }
    }

    /// Answers a single request with `status` and `body`, returning the URL to call.
    async fn serve_once(status: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/v1/chat/completions", addr)
    }

    const ONE_RECIPE: &str = r#"[{"recipe_name":"Spinach Omelette","brief_description":"Fluffy eggs with greens","main_ingredients":["eggs","spinach"],"estimated_cooking_time":"10 minutes","difficulty_level":"Easy"}]"#;

    #[test]
    fn parses_plain_json_array() {
        let recipes = parse_recipe_response(ONE_RECIPE, &items());
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].recipe_name, "Spinach Omelette");
        assert_eq!(recipes[0].main_ingredients, items());
    }

    #[test]
    fn parses_fenced_json_block() {
        let reply = format!("Here you go!\n```json\n{}\n```\nEnjoy.", ONE_RECIPE);
        let recipes = parse_recipe_response(&reply, &items());
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].difficulty_level, "Easy");
    }

    #[test]
    fn falls_back_to_raw_text() {
        let reply = "Try an omelette with the spinach.";
        let recipes = parse_recipe_response(reply, &items());
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].recipe_name, FALLBACK_RECIPE_NAME);
        assert_eq!(recipes[0].brief_description, reply);
        assert_eq!(recipes[0].main_ingredients, items());
        assert_eq!(recipes[0].estimated_cooking_time, "Varies");
        assert_eq!(recipes[0].difficulty_level, "Varies");
    }

    #[test]
    fn broken_fenced_block_falls_back() {
        let reply = "```json\n[{\"recipe_name\": \n```";
        let recipes = parse_recipe_response(reply, &items());
        assert_eq!(recipes[0].recipe_name, FALLBACK_RECIPE_NAME);
    }

    #[test]
    fn prompt_lists_every_item() {
        let prompt = OpenAiRecipeAdapter::build_prompt(&items());
        assert!(prompt.contains("eggs, spinach"));
        assert!(prompt.contains("JSON array"));
    }

    #[tokio::test]
    async fn rejects_empty_items_before_any_request() {
        let adapter = OpenAiRecipeAdapter::new(RecipeConfig {
            api_key: Some("test-key".to_string()),
            ..RecipeConfig::default()
        })
        .unwrap();
        let err = adapter.suggest(&[]).await.unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn missing_api_key_is_reported() {
        let adapter = OpenAiRecipeAdapter::new(RecipeConfig::default()).unwrap();
        let err = adapter.suggest(&items()).await.unwrap_err();
        assert!(matches!(err, TrackerError::MissingApiKey));
    }

    #[tokio::test]
    async fn server_error_status_is_reported() {
        let url = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#.to_string()).await;
        let err = adapter_for(url).suggest(&items()).await.unwrap_err();
        assert!(matches!(err, TrackerError::RecipeService { status: 500 }));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = adapter_for(format!("http://{}/v1/chat/completions", addr))
            .suggest(&items())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Http(_)));
    }

    #[tokio::test]
    async fn fenced_reply_from_the_service_is_parsed() {
        let content = format!("Here are some ideas:\n```json\n{}\n```", ONE_RECIPE);
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
        .to_string();
        let url = serve_once("200 OK", body).await;

        let recipes = adapter_for(url).suggest(&items()).await.unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].recipe_name, "Spinach Omelette");
    }

    #[tokio::test]
    async fn mock_adapter_suggests_per_item() {
        let adapter = MockRecipeAdapter::new("test".to_string());
        let recipes = adapter.suggest(&items()).await.unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].recipe_name, "Simple eggs");
    }
}
