use crate::browser::BrowserPage;
use crate::error::FetchError;
use crate::extract::{self, BIO_STRATEGIES, FOLLOWER_STRATEGIES};
use crate::fingerprint;
use crate::proxy::ProxyRotation;
use crate::types::ProfileRecord;

use super::FetchEngine;

const LOGIN_USERNAME: &str = r#"input[name="username"]"#;
const LOGIN_PASSWORD: &str = r#"input[name="password"]"#;
const LOGIN_SUBMIT: &str = r#"button[type="submit"]"#;

impl<R: ProxyRotation> FetchEngine<'_, R> {
    /// Opens a page on the current context, building one first if the last
    /// rotation left none.
    pub(super) async fn open_page(&mut self) -> Result<Box<dyn BrowserPage>, FetchError> {
        if self.active.is_none() {
            let proxy = self.proxy_in_use.take();
            self.build_context(proxy).await?;
        }
        let Some(active) = self.active.as_ref() else {
            return Err(FetchError::SessionSetup("no browser context".to_string()));
        };
        let page = active.context.new_page().await?;
        page.add_init_script(&fingerprint::stealth_script(&active.identity))
            .await?;
        Ok(page)
    }

    pub(super) async fn run_attempt(
        &mut self,
        handle: &str,
        attempt_number: u32,
    ) -> Result<ProfileRecord, FetchError> {
        let page = self.open_page().await?;
        let result = self.scrape_profile(page.as_ref(), handle, attempt_number).await;
        if let Err(e) = page.close().await {
            tracing::debug!(handle, error = %e, "page close failed");
        }
        result
    }

    async fn scrape_profile(
        &self,
        page: &dyn BrowserPage,
        handle: &str,
        attempt_number: u32,
    ) -> Result<ProfileRecord, FetchError> {
        let settings = &self.settings;

        self.navigate(page, &settings.landing_url).await?;
        self.answer_login(page, handle).await?;

        let profile_url = format!("{}{handle}/", settings.profile_base);
        self.navigate(page, &profile_url).await?;

        extract::wait_for_main_content(page, handle, settings.selector_timeout).await?;

        if let Some(dir) = &settings.screenshot_dir {
            let path = dir.join(format!("debug_{handle}_{attempt_number}.png"));
            if let Err(e) = page.screenshot(&path).await {
                tracing::warn!(handle, path = %path.display(), error = %e, "debug screenshot failed");
            }
        }

        let followers = extract::first_match(page, FOLLOWER_STRATEGIES).await;
        let bio = extract::first_match(page, BIO_STRATEGIES)
            .await
            .unwrap_or_default();
        let posts = extract::extract_posts(page, settings.selector_timeout).await;

        Ok(ProfileRecord {
            followers,
            bio,
            posts,
        })
    }

    async fn navigate(&self, page: &dyn BrowserPage, url: &str) -> Result<(), FetchError> {
        let response = page.goto(url, self.settings.nav_timeout).await?;
        if response.is_error() {
            return Err(FetchError::HttpStatus {
                status: response.status.unwrap_or_default(),
                url: url.to_string(),
            });
        }
        page.wait_for_load(self.settings.nav_timeout).await
    }

    async fn answer_login(&self, page: &dyn BrowserPage, handle: &str) -> Result<(), FetchError> {
        let Some(username_field) = page.locate(LOGIN_USERNAME).await? else {
            return Ok(());
        };
        let unresolved = || FetchError::ChallengeUnresolved {
            handle: handle.to_string(),
        };
        let Some(login) = &self.settings.login else {
            tracing::warn!(handle, "login challenge shown and no credentials configured");
            return Err(unresolved());
        };

        tracing::info!(handle, "answering login challenge");
        username_field.fill(&login.username).await?;
        let Some(password_field) = page.locate(LOGIN_PASSWORD).await? else {
            return Err(unresolved());
        };
        password_field.fill(&login.password).await?;
        let Some(submit) = page.locate(LOGIN_SUBMIT).await? else {
            return Err(unresolved());
        };
        submit.click().await?;
        page.wait_for_load(self.settings.nav_timeout).await?;

        if page.locate(LOGIN_USERNAME).await?.is_some() {
            return Err(unresolved());
        }
        Ok(())
    }
}
