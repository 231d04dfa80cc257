//! CDP implementation of the browser traits via `chromiumoxide`.
//!
//! Each [`BrowserContext`] is a separate CDP browser context with its own
//! proxy. Identity emulation (user agent, viewport, locale, timezone,
//! geolocation and colour scheme) is applied per page as it is opened.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::{
    BrowserContextId, GrantPermissionsParams, PermissionType,
};
use chromiumoxide::cdp::browser_protocol::emulation::{
    MediaFeature, SetDeviceMetricsOverrideParams, SetEmulatedMediaParams,
    SetGeolocationOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    AuthChallengeResponse, AuthChallengeResponseResponse, ContinueRequestParams,
    ContinueWithAuthParams, EnableParams as FetchEnableParams, EventAuthRequired,
    EventRequestPaused,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Element, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::{BrowserContext, BrowserPage, BrowserSession, ElementHandle, NavigationResponse};
use crate::error::FetchError;
use crate::fingerprint::SessionIdentity;
use crate::proxy::Proxy;

const SELECTOR_POLL: Duration = Duration::from_millis(250);

const NAVIGATION_STATUS_JS: &str = r"
    (() => {
        const entry = performance.getEntriesByType('navigation')[0];
        return entry && entry.responseStatus ? entry.responseStatus : 0;
    })()
";

const LOAD_SETTLED_JS: &str = r"
    new Promise((resolve) => {
        const settle = () => setTimeout(() => resolve(document.readyState), 500);
        if (document.readyState === 'complete') {
            settle();
        } else {
            window.addEventListener('load', settle, { once: true });
        }
    })
";

const BODY_TEXT_JS: &str = "document.body ? document.body.innerText : ''";

pub struct ChromiumSession {
    browser: Arc<Mutex<Browser>>,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Connects to a remote browser's DevTools websocket.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::SessionSetup`] when the websocket cannot be opened.
    pub async fn connect(endpoint: &str) -> Result<Self, FetchError> {
        let (browser, mut handler) = Browser::connect(endpoint)
            .await
            .map_err(|e| FetchError::SessionSetup(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "CDP handler stopped");
                    break;
                }
            }
        });

        tracing::info!("connected to remote browser");
        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handler,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn new_context(
        &self,
        identity: &SessionIdentity,
        proxy: Option<&Proxy>,
    ) -> Result<Box<dyn BrowserContext>, FetchError> {
        let browser = self.browser.lock().await;
        let created = browser
            .execute(context_params(proxy))
            .await
            .map_err(|e| FetchError::SessionSetup(e.to_string()))?;
        let id = created.result.browser_context_id.clone();

        if identity.permissions.iter().any(|p| p == "geolocation") {
            browser.execute(geolocation_grant(&id)).await?;
        }

        tracing::debug!(
            proxy = ?proxy.map(Proxy::redacted),
            timezone = %identity.timezone,
            locale = %identity.locale,
            "created browser context"
        );
        Ok(Box::new(ChromiumContext {
            browser: Arc::clone(&self.browser),
            id,
            identity: identity.clone(),
            proxy_auth: proxy.and_then(Proxy::auth),
        }))
    }

    async fn close(&self) -> Result<(), FetchError> {
        let result = self.browser.lock().await.close().await;
        self.handler.abort();
        result.map(|_| ()).map_err(FetchError::from)
    }
}

/// Proxy userinfo is stripped here and answered through the Fetch domain.
fn context_params(proxy: Option<&Proxy>) -> CreateBrowserContextParams {
    let mut params = CreateBrowserContextParams::builder().dispose_on_detach(true);
    if let Some(proxy) = proxy {
        params = params.proxy_server(proxy.server());
    }
    params.build()
}

fn geolocation_grant(id: &BrowserContextId) -> GrantPermissionsParams {
    let mut grant = GrantPermissionsParams::new(vec![PermissionType::Geolocation]);
    grant.browser_context_id = Some(id.clone());
    grant
}

struct ChromiumContext {
    browser: Arc<Mutex<Browser>>,
    id: BrowserContextId,
    identity: SessionIdentity,
    proxy_auth: Option<(String, String)>,
}

#[async_trait]
impl BrowserContext for ChromiumContext {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, FetchError> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(self.id.clone())
            .build()
            .map_err(FetchError::Browser)?;
        let page = self.browser.lock().await.new_page(params).await?;

        apply_identity(&page, &self.identity).await?;
        if let Some((username, password)) = &self.proxy_auth {
            answer_proxy_auth(&page, username.clone(), password.clone()).await?;
        }
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(&self) -> Result<(), FetchError> {
        self.browser
            .lock()
            .await
            .execute(DisposeBrowserContextParams::new(self.id.clone()))
            .await?;
        Ok(())
    }
}

async fn apply_identity(page: &Page, identity: &SessionIdentity) -> Result<(), FetchError> {
    let mut user_agent = SetUserAgentOverrideParams::new(identity.user_agent.clone());
    user_agent.accept_language = Some(identity.languages().join(","));
    user_agent.platform = Some(identity.navigator_platform().to_string());
    page.execute(user_agent).await?;

    let mut metrics = SetDeviceMetricsOverrideParams::new(
        i64::from(identity.viewport.width),
        i64::from(identity.viewport.height),
        1.0,
        false,
    );
    metrics.screen_width = Some(i64::from(identity.window.width));
    metrics.screen_height = Some(i64::from(identity.window.height));
    page.execute(metrics).await?;

    page.execute(SetTimezoneOverrideParams::new(identity.timezone.clone()))
        .await?;
    page.execute(
        SetLocaleOverrideParams::builder()
            .locale(identity.locale.replace('-', "_"))
            .build(),
    )
    .await?;
    page.execute(
        SetGeolocationOverrideParams::builder()
            .latitude(identity.geolocation.latitude)
            .longitude(identity.geolocation.longitude)
            .accuracy(100.0)
            .build(),
    )
    .await?;
    page.execute(
        SetEmulatedMediaParams::builder()
            .features(vec![MediaFeature::new(
                "prefers-color-scheme",
                identity.color_scheme.to_string(),
            )])
            .build(),
    )
    .await?;
    Ok(())
}

/// Chrome cannot take proxy credentials on the command line or per context,
/// so the page intercepts requests and answers proxy auth challenges itself.
async fn answer_proxy_auth(page: &Page, username: String, password: String) -> Result<(), FetchError> {
    let mut paused = page.event_listener::<EventRequestPaused>().await?;
    let mut challenges = page.event_listener::<EventAuthRequired>().await?;
    page.execute(FetchEnableParams::builder().handle_auth_requests(true).build())
        .await?;

    let tab = page.clone();
    tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            if tab
                .execute(ContinueRequestParams::new(event.request_id.clone()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let tab = page.clone();
    tokio::spawn(async move {
        while let Some(event) = challenges.next().await {
            let mut answer =
                AuthChallengeResponse::new(AuthChallengeResponseResponse::ProvideCredentials);
            answer.username = Some(username.clone());
            answer.password = Some(password.clone());
            if tab
                .execute(ContinueWithAuthParams::new(event.request_id.clone(), answer))
                .await
                .is_err()
            {
                break;
            }
        }
    });
    Ok(())
}

struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn add_init_script(&self, script: &str) -> Result<(), FetchError> {
        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await?;
        Ok(())
    }

    async fn goto(&self, url: &str, timeout: Duration) -> Result<NavigationResponse, FetchError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Err(_) => Err(FetchError::Timeout {
                what: format!("navigation to {url}"),
                secs: timeout.as_secs(),
            }),
            Ok(Err(e)) => Err(FetchError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Ok(Ok(_)) => {
                let status = self
                    .page
                    .evaluate(NAVIGATION_STATUS_JS)
                    .await
                    .ok()
                    .and_then(|r| r.into_value::<u16>().ok())
                    .filter(|s| *s > 0);
                Ok(NavigationResponse { status })
            }
        }
    }

    async fn wait_for_load(&self, timeout: Duration) -> Result<(), FetchError> {
        match tokio::time::timeout(timeout, self.page.evaluate(LOAD_SETTLED_JS)).await {
            Ok(result) => result.map(|_| ()).map_err(FetchError::from),
            Err(_) => Err(FetchError::Timeout {
                what: "page load".to_string(),
                secs: timeout.as_secs(),
            }),
        }
    }

    async fn locate(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>, FetchError> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(Some(Box::new(ChromiumElement { element }))),
            Err(e) => {
                tracing::trace!(selector, error = %e, "selector did not match");
                Ok(None)
            }
        }
    }

    async fn locate_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>, FetchError> {
        let elements = self.page.find_elements(selector).await.unwrap_or_default();
        Ok(elements
            .into_iter()
            .map(|element| Box::new(ChromiumElement { element }) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool, FetchError> {
        let poll = async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(SELECTOR_POLL).await;
            }
        };
        Ok(tokio::time::timeout(timeout, poll).await.is_ok())
    }

    async fn body_text(&self) -> Result<String, FetchError> {
        let result = self.page.evaluate(BODY_TEXT_JS).await?;
        Ok(result.into_value::<String>().unwrap_or_default())
    }

    async fn press_escape(&self) -> Result<(), FetchError> {
        self.page.find_element("body").await?.press_key("Escape").await?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<(), FetchError> {
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), FetchError> {
        self.page.clone().close().await?;
        Ok(())
    }
}

struct ChromiumElement {
    element: Element,
}

#[async_trait]
impl ElementHandle for ChromiumElement {
    async fn text_content(&self) -> Result<Option<String>, FetchError> {
        Ok(self.element.inner_text().await?)
    }

    async fn get_attribute(&self, name: &str) -> Result<Option<String>, FetchError> {
        Ok(self.element.attribute(name).await?)
    }

    async fn click(&self) -> Result<(), FetchError> {
        self.element.click().await?;
        Ok(())
    }

    async fn fill(&self, value: &str) -> Result<(), FetchError> {
        self.element.click().await?;
        self.element.type_str(value).await?;
        Ok(())
    }
}
