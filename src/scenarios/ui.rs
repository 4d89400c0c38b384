use anyhow::Result;
use std::sync::Arc;

use crate::driver::selector::TolerantSelector;
use crate::driver::traits::BrowserPage;
use crate::error::E2eError;
use crate::pages::form::FormSpec;
use crate::pages::{BasePage, FormPage, LoginPage, MessageBoxPage};
use crate::runner::context::ScenarioContext;
use crate::scenarios::unique_name;

const MESSAGE: &str = "Hello from the end-to-end suite";
const SAMPLE_FILE: &str = "sample.txt";
const TEXTBOX_LABEL: &str = "Comment";
const UPLOAD_LABEL: &str = "Upload Document";

/// Open the app and sign in with the configured credentials
pub async fn login(ctx: &ScenarioContext) -> Result<Arc<dyn BrowserPage>> {
    let page = ctx.require_page()?;
    let config = &ctx.config;
    if !config.has_ui_credentials() {
        return Err(E2eError::Config("UI_USERNAME and UI_PASSWORD must be set".to_string()).into());
    }

    let login = LoginPage::new(page.clone(), config.clone());
    login.goto("/").await?;
    login.login(&config.ui_username, &config.ui_password).await?;
    let evidence = login.expect_logged_in().await?;
    log::info!("Logged in as {} ({:?})", config.ui_username, evidence);
    Ok(page)
}

fn message_box_page(ctx: &ScenarioContext, page: Arc<dyn BrowserPage>) -> MessageBoxPage {
    let flow = MessageBoxPage::new(page, ctx.config.clone());
    match &ctx.progress {
        Some(sink) => flow.with_progress(sink.clone()),
        None => flow,
    }
}

fn form_page(ctx: &ScenarioContext, page: Arc<dyn BrowserPage>) -> FormPage {
    let flow = FormPage::new(page, ctx.config.clone());
    match &ctx.progress {
        Some(sink) => flow.with_progress(sink.clone()),
        None => flow,
    }
}

/// The new object's name shows up in the listing or designer header
async fn expect_created<P: BasePage>(page: &P, name: &str) -> Result<()> {
    let created = TolerantSelector::new("created name").text(name);
    page.expect_visible_within(&created, page.config().timeouts.confirmation_ms)
        .await?;
    Ok(())
}

pub async fn message_box_task(ctx: &ScenarioContext) -> Result<()> {
    let page = login(ctx).await?;
    let flow = message_box_page(ctx, page);

    let name = unique_name("e2e-message");
    flow.create_message_box_task(&name, MESSAGE, Some("Created by the end-to-end suite"))
        .await?;
    expect_created(&flow, &name).await
}

pub async fn message_box_elements(ctx: &ScenarioContext) -> Result<()> {
    let page = login(ctx).await?;
    let flow = message_box_page(ctx, page);
    let timeouts = &ctx.config.timeouts;

    flow.navigate_to_automation().await?;
    flow.expect_url_matches("automation", timeouts.confirmation_ms)
        .await?;
    flow.open_create_task_bot().await?;
    flow.expect_visible(&MessageBoxPage::task_name_selector())
        .await?;

    flow.fill_task_details(&unique_name("test-task"), None)
        .await?;
    flow.add_message_box_action().await?;
    flow.verify_right_panel_elements().await?;
    flow.configure_message_box("Test message", None).await?;
    flow.save_configuration().await
}

pub async fn form_upload(ctx: &ScenarioContext) -> Result<()> {
    let page = login(ctx).await?;
    let flow = form_page(ctx, page);

    let name = unique_name("e2e-form");
    let file_path = ctx.asset(SAMPLE_FILE);
    let spec = FormSpec {
        form_name: &name,
        textbox_label: TEXTBOX_LABEL,
        file_upload_label: UPLOAD_LABEL,
        text_value: "Text entered by the end-to-end suite",
        file_path: &file_path,
    };
    flow.create_form_with_upload(&spec).await?;
    expect_created(&flow, &name).await
}

pub async fn form_elements(ctx: &ScenarioContext) -> Result<()> {
    let page = login(ctx).await?;
    let flow = form_page(ctx, page);
    let timeouts = &ctx.config.timeouts;

    flow.navigate_to_automation().await?;
    flow.expect_url_matches("automation", timeouts.confirmation_ms)
        .await?;
    flow.open_create_form().await?;

    flow.fill_form_details(&unique_name("test-form"), None)
        .await?;
    flow.expect_visible(flow.canvas()).await?;

    flow.drag_drop_textbox().await?;
    flow.click_element_and_verify_right_panel(flow.textbox_element(), TEXTBOX_LABEL)
        .await?;
    flow.drag_drop_select_file().await?;
    flow.click_element_and_verify_right_panel(flow.select_file_element(), UPLOAD_LABEL)
        .await?;

    flow.enter_text_in_textbox("Step by step text").await?;
    flow.upload_document(&ctx.asset(SAMPLE_FILE)).await?;
    flow.save_form().await?;
    flow.verify_document_uploaded(SAMPLE_FILE).await
}
