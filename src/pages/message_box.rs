//! Task bot flow: create a task, insert a Message Box action, configure it
//! and save.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::{
    create_button, description_input, navigate_to_automation, open_create_menu, report,
    right_panel, save_button, BasePage, FlowStage, ProgressSink,
};
use crate::driver::selector::TolerantSelector;
use crate::driver::traits::BrowserPage;
use crate::utils::config::Config;

const MESSAGE_BOX: &str = "Message Box";

pub struct MessageBoxPage {
    page: Arc<dyn BrowserPage>,
    config: Arc<Config>,
    progress: Option<ProgressSink>,
    task_bot_option: TolerantSelector,
    task_name_input: TolerantSelector,
    actions_panel: TolerantSelector,
    search_input: TolerantSelector,
    message_box_action: TolerantSelector,
    message_input: TolerantSelector,
    title_input: TolerantSelector,
    success_toast: TolerantSelector,
    confirmation_message: TolerantSelector,
}

impl MessageBoxPage {
    pub fn new(page: Arc<dyn BrowserPage>, config: Arc<Config>) -> Self {
        let mut task_bot_option = TolerantSelector::new("Task Bot option");
        for text in ["Task Bot", "TaskBot", "Task bot"] {
            task_bot_option = task_bot_option.has_text("a", text);
        }
        for text in ["Task Bot", "TaskBot"] {
            task_bot_option = task_bot_option.has_text("[role=\"menuitem\"]", text);
        }
        for text in ["Task Bot", "TaskBot"] {
            task_bot_option = task_bot_option.has_text("li", text);
        }
        let task_bot_option = task_bot_option
            .css("[data-testid*=\"task-bot\" i]")
            .css("[data-qa*=\"task-bot\" i]")
            .css("[class*=\"task-bot\" i]");

        Self {
            page,
            config,
            progress: None,
            task_bot_option,
            task_name_input: Self::task_name_selector(),
            actions_panel: TolerantSelector::new("actions panel")
                .css("[class*=\"actions-panel\"]")
                .css("[class*=\"action-panel\"]")
                .css("aside")
                .css("[class*=\"sidebar\"]"),
            search_input: TolerantSelector::new("actions search")
                .css("input[placeholder*=\"search\" i]")
                .css("input[type=\"search\"]")
                .css("input[name=\"search\"]"),
            message_box_action: TolerantSelector::new("Message Box action")
                .text(MESSAGE_BOX)
                .css(&format!("[title=\"{}\"]", MESSAGE_BOX))
                .has_text("div", MESSAGE_BOX),
            message_input: TolerantSelector::new("message field")
                .css("textarea[name=\"message\"]")
                .css("textarea[placeholder*=\"message\" i]")
                .css("input[name=\"message\"]"),
            title_input: TolerantSelector::new("title field")
                .css("input[name=\"title\"]")
                .css("input[placeholder*=\"title\" i]"),
            success_toast: TolerantSelector::new("save toast")
                .pattern("saved successfully")
                .pattern("created successfully")
                .css("[class*=\"toast\"][class*=\"success\"]"),
            confirmation_message: TolerantSelector::new("confirmation message")
                .pattern("task.*created")
                .pattern("successfully"),
        }
    }

    /// Name field of the task creation dialog
    pub fn task_name_selector() -> TolerantSelector {
        TolerantSelector::new("task name input")
            .css("input[name=\"taskName\"]")
            .css("input[placeholder*=\"task name\" i]")
            .css("input[placeholder*=\"name\" i]")
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn navigate_to_automation(&self) -> Result<()> {
        navigate_to_automation(self).await?;
        report(&self.progress, FlowStage::Navigated);
        Ok(())
    }

    /// Create dropdown, then Task Bot
    pub async fn open_create_task_bot(&self) -> Result<()> {
        open_create_menu(self, &self.task_bot_option).await?;
        report(&self.progress, FlowStage::DialogOpen);
        Ok(())
    }

    pub async fn fill_task_details(&self, name: &str, description: Option<&str>) -> Result<()> {
        self.fill(&self.task_name_input, name).await?;
        if let Some(description) = description {
            self.fill(&description_input(), description).await?;
        }
        self.click(&create_button()).await?;
        self.wait_for_network_idle().await?;
        report(&self.progress, FlowStage::ObjectCreated);
        Ok(())
    }

    /// Search the actions palette and double-click Message Box to insert it
    pub async fn add_message_box_action(&self) -> Result<()> {
        self.expect_visible_within(&self.actions_panel, self.config.timeouts.action_ms)
            .await?;
        self.fill(&self.search_input, MESSAGE_BOX).await?;
        self.pause(500).await;

        let action = self
            .expect_visible_within(&self.message_box_action, self.config.timeouts.action_ms)
            .await?;
        self.page.double_click(&action).await?;
        self.pause(500).await;
        report(&self.progress, FlowStage::ElementsPlaced);
        Ok(())
    }

    /// Message field must be usable; the title field is optional
    pub async fn verify_right_panel_elements(&self) -> Result<()> {
        let panel = right_panel();
        self.expect_visible_within(&panel, self.config.timeouts.action_ms)
            .await?;

        let message = self.expect_visible(&self.message_input).await?;
        self.expect_enabled(&message, self.message_input.name())
            .await?;

        if self.title_input.exists(self.page()).await? {
            self.expect_visible(&self.title_input).await?;
        }

        self.expect_visible(&panel).await?;
        Ok(())
    }

    pub async fn configure_message_box(&self, message: &str, title: Option<&str>) -> Result<()> {
        self.fill(&self.message_input, message).await?;

        if let Some(title) = title {
            if let Some(field) = self.title_input.resolve(self.page()).await? {
                self.page.fill(&field, title).await?;
            }
        }
        report(&self.progress, FlowStage::ElementConfigured(1));
        Ok(())
    }

    pub async fn save_configuration(&self) -> Result<()> {
        let confirmation = self.success_toast.or(&self.confirmation_message);
        self.save_and_confirm(&save_button(), &confirmation).await?;
        report(&self.progress, FlowStage::Saved);
        report(&self.progress, FlowStage::Confirmed);
        Ok(())
    }

    /// Complete flow: create the task, insert and configure a Message Box, save
    pub async fn create_message_box_task(
        &self,
        name: &str,
        message: &str,
        description: Option<&str>,
    ) -> Result<()> {
        self.navigate_to_automation().await?;
        self.open_create_task_bot().await?;
        self.fill_task_details(name, description).await?;
        self.add_message_box_action().await?;
        self.verify_right_panel_elements().await?;
        self.configure_message_box(message, None).await?;
        self.save_configuration().await
    }
}

#[async_trait]
impl BasePage for MessageBoxPage {
    fn page(&self) -> &dyn BrowserPage {
        self.page.as_ref()
    }

    fn config(&self) -> &Config {
        &self.config
    }
}
