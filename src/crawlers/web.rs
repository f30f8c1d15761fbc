use crate::crawlers::crawler::PageFetcher;
use crate::error::FetchError;
use crate::results::RenderedDocument;
use crate::utils::random_user_agent;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::timeout;

/// Fixed browser viewport
pub const VIEWPORT: (u32, u32) = (1920, 1080);

/// Local WebDriver endpoints tried when the configured one is unreachable
const FALLBACK_WEBDRIVER_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// Renders pages through headless Chrome driven over WebDriver.
///
/// Sessions are opened lazily, one per concurrent fetch up to `max_sessions`,
/// and each gets a randomly chosen client identity. Idle sessions are reused.
/// Call [`PageFetcher::shutdown`] to close them.
pub struct Fetcher {
    webdriver_url: String,
    page_timeout: Duration,
    sessions: Semaphore,
    idle: Mutex<Vec<Client>>,
}

impl Fetcher {
    pub fn new(webdriver_url: &str, page_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            page_timeout,
            sessions: Semaphore::new(max_sessions.max(1)),
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Take an idle session or open a new one
    async fn checkout(&self) -> Option<Client> {
        if let Some(client) = self.idle.lock().await.pop() {
            return Some(client);
        }
        ::log::debug!("Opening a new WebDriver session");
        connect_to_webdriver(&self.webdriver_url).await
    }

    async fn checkin(&self, client: Client) {
        self.idle.lock().await.push(client);
    }
}

#[async_trait]
impl PageFetcher for Fetcher {
    async fn fetch(&self, url: &str) -> Result<RenderedDocument, FetchError> {
        let _permit = self
            .sessions
            .acquire()
            .await
            .map_err(|e| FetchError::new(url, e))?;

        let Some(client) = self.checkout().await else {
            return Err(FetchError::new(url, "no WebDriver session available"));
        };

        let started = std::time::Instant::now();
        ::log::debug!("FETCH: {}", url);

        match timeout(self.page_timeout, render(&client, url, self.page_timeout)).await {
            Ok(Ok(doc)) => {
                ::log::debug!(
                    "Rendered {} in {:.2} seconds",
                    url,
                    started.elapsed().as_secs_f64()
                );
                self.checkin(client).await;
                Ok(doc)
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                if is_session_lost(&message) {
                    ::log::warn!("Lost WebDriver session while loading {}", url);
                    if let Err(e) = client.close().await {
                        ::log::warn!("Failed to close lost WebDriver session: {}", e);
                    }
                } else {
                    self.checkin(client).await;
                }
                Err(FetchError::new(url, message))
            }
            Err(_) => {
                self.checkin(client).await;
                Err(FetchError::new(
                    url,
                    format!("page did not settle within {:?}", self.page_timeout),
                ))
            }
        }
    }

    async fn shutdown(&self) {
        let clients = std::mem::take(&mut *self.idle.lock().await);
        ::log::debug!("Closing {} WebDriver session(s)", clients.len());
        for client in clients {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close WebDriver session: {}", e);
            }
        }
    }
}

/// Navigate, wait for the document body, and capture the rendered DOM
async fn render(
    client: &Client,
    url: &str,
    settle: Duration,
) -> Result<RenderedDocument, fantoccini::error::CmdError> {
    client.goto(url).await?;
    client
        .wait()
        .at_most(settle)
        .for_element(Locator::Css("body"))
        .await?;

    let final_url = client
        .current_url()
        .await
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string());
    let html = client.source().await?;

    Ok(RenderedDocument {
        url: url.to_string(),
        final_url,
        html,
    })
}

/// WebDriver capabilities for a headless Chrome session with the given identity
pub fn session_capabilities(user_agent: &str) -> Map<String, Value> {
    let args = vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        format!("--window-size={},{}", VIEWPORT.0, VIEWPORT.1),
        format!("--user-agent={}", user_agent),
    ];

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps.insert("pageLoadStrategy".to_string(), json!("normal"));
    caps
}

async fn connect_at(webdriver_url: &str) -> Result<Client, fantoccini::error::NewSessionError> {
    let user_agent = random_user_agent();
    let mut builder = ClientBuilder::native();
    builder.capabilities(session_capabilities(user_agent));
    let client = builder.connect(webdriver_url).await?;

    if let Err(e) = client.set_window_size(VIEWPORT.0, VIEWPORT.1).await {
        ::log::debug!("Could not resize browser window: {}", e);
    }
    ::log::debug!("Session identity: {}", user_agent);
    Ok(client)
}

/// Connects to the WebDriver instance, falling back to common local endpoints
async fn connect_to_webdriver(webdriver_url: &str) -> Option<Client> {
    match connect_at(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Some(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                webdriver_url,
                e
            );
        }
    }

    for url in FALLBACK_WEBDRIVER_URLS.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = connect_at(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Some(client);
        }
    }

    ::log::error!("Failed to connect to any WebDriver servers");
    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    None
}

fn is_session_lost(message: &str) -> bool {
    message.contains("Unable to find session")
        || message.contains("invalid session id")
        || message.contains("session deleted")
}
