//! Form builder flow: create a form, place a textbox and a file upload,
//! configure both, upload a document and save.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{
    create_button, description_input, navigate_to_automation, open_create_menu, report,
    right_panel, save_button, BasePage, FlowStage, ProgressSink,
};
use crate::driver::common::file_name_of;
use crate::driver::selector::TolerantSelector;
use crate::driver::traits::BrowserPage;
use crate::utils::config::Config;

/// Inputs of a complete form-with-upload run
#[derive(Debug, Clone)]
pub struct FormSpec<'a> {
    pub form_name: &'a str,
    pub textbox_label: &'a str,
    pub file_upload_label: &'a str,
    pub text_value: &'a str,
    pub file_path: &'a Path,
}

pub struct FormPage {
    page: Arc<dyn BrowserPage>,
    config: Arc<Config>,
    progress: Option<ProgressSink>,
    configured: AtomicUsize,
    form_option: TolerantSelector,
    form_name_input: TolerantSelector,
    palette: TolerantSelector,
    textbox_element: TolerantSelector,
    select_file_element: TolerantSelector,
    canvas: TolerantSelector,
    label_input: TolerantSelector,
    required_checkbox: TolerantSelector,
    placeholder_input: TolerantSelector,
    text_input: TolerantSelector,
    file_input: TolerantSelector,
    upload_button: TolerantSelector,
    success_toast: TolerantSelector,
    confirmation_message: TolerantSelector,
}

impl FormPage {
    pub fn new(page: Arc<dyn BrowserPage>, config: Arc<Config>) -> Self {
        Self {
            page,
            config,
            progress: None,
            configured: AtomicUsize::new(0),
            form_option: TolerantSelector::new("Form option")
                .has_text("a", "Form")
                .has_text("[role=\"menuitem\"]", "Form")
                .has_text("li", "Form")
                .css("[data-testid*=\"form\" i]")
                .css("[data-qa*=\"form\" i]")
                .css("[class*=\"form\" i]"),
            form_name_input: TolerantSelector::new("form name input")
                .css("input[name=\"formName\"]")
                .css("input[placeholder*=\"form name\" i]")
                .css("input[placeholder*=\"name\" i]"),
            palette: TolerantSelector::new("element palette")
                .css("[class*=\"left-menu\"]")
                .css("[class*=\"toolbox\"]")
                .css("[class*=\"elements\"]")
                .css("[class*=\"components\"]")
                .css("aside")
                .css("[class*=\"sidebar\"]"),
            textbox_element: TolerantSelector::new("Textbox element")
                .text("Textbox")
                .css("[title=\"Textbox\"]")
                .has_text("div", "Textbox")
                .css("[data-element=\"textbox\"]"),
            select_file_element: TolerantSelector::new("Select File element")
                .text("Select File")
                .text("File Upload")
                .css("[title=\"Select File\"]")
                .css("[title=\"File Upload\"]")
                .has_text("div", "Select File")
                .has_text("div", "File Upload")
                .css("[data-element=\"file-upload\"]"),
            canvas: TolerantSelector::new("form canvas")
                .css("[class*=\"canvas\"]")
                .css("[class*=\"form-canvas\"]")
                .css("[class*=\"workspace\"]")
                .css("[class*=\"designer\"]")
                .css("main [class*=\"content\"]"),
            label_input: TolerantSelector::new("label input")
                .css("input[name=\"label\"]")
                .css("input[placeholder*=\"label\" i]"),
            required_checkbox: TolerantSelector::new("required checkbox")
                .css("input[type=\"checkbox\"][name*=\"required\" i]")
                .css("input[type=\"checkbox\"]"),
            placeholder_input: TolerantSelector::new("placeholder input")
                .css("input[name=\"placeholder\"]")
                .css("input[placeholder*=\"placeholder\" i]"),
            text_input: TolerantSelector::new("textbox input")
                .css("input[type=\"text\"]")
                .css("textarea"),
            file_input: TolerantSelector::new("file input")
                .css("input[type=\"file\"]")
                .css("input[accept]"),
            upload_button: TolerantSelector::new("Upload button")
                .has_text("button", "Upload")
                .has_text("button[type=\"button\"]", "Upload"),
            success_toast: TolerantSelector::new("save toast")
                .pattern("saved successfully")
                .pattern("uploaded successfully")
                .css("[class*=\"toast\"][class*=\"success\"]"),
            confirmation_message: TolerantSelector::new("confirmation message")
                .pattern("form.*saved")
                .pattern("successfully"),
        }
    }

    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Palette entry for the textbox element
    pub fn textbox_element(&self) -> &TolerantSelector {
        &self.textbox_element
    }

    pub fn select_file_element(&self) -> &TolerantSelector {
        &self.select_file_element
    }

    pub fn canvas(&self) -> &TolerantSelector {
        &self.canvas
    }

    pub async fn navigate_to_automation(&self) -> Result<()> {
        navigate_to_automation(self).await?;
        report(&self.progress, FlowStage::Navigated);
        Ok(())
    }

    /// Create dropdown, then Form
    pub async fn open_create_form(&self) -> Result<()> {
        open_create_menu(self, &self.form_option).await?;
        report(&self.progress, FlowStage::DialogOpen);
        Ok(())
    }

    /// Fill mandatory details, create, and wait for the designer canvas
    pub async fn fill_form_details(&self, name: &str, description: Option<&str>) -> Result<()> {
        self.fill(&self.form_name_input, name).await?;
        if let Some(description) = description {
            self.fill(&description_input(), description).await?;
        }
        self.click(&create_button()).await?;
        self.wait_for_network_idle().await?;
        self.expect_visible_within(&self.canvas, self.config.timeouts.action_ms)
            .await?;
        report(&self.progress, FlowStage::ObjectCreated);
        Ok(())
    }

    pub async fn drag_drop_textbox(&self) -> Result<()> {
        self.drag_to_canvas(&self.textbox_element).await
    }

    pub async fn drag_drop_select_file(&self) -> Result<()> {
        self.drag_to_canvas(&self.select_file_element).await
    }

    async fn drag_to_canvas(&self, source: &TolerantSelector) -> Result<()> {
        let action_ms = self.config.timeouts.action_ms;
        self.expect_visible_within(&self.palette, action_ms).await?;
        let source = self.expect_visible(source).await?;
        let target = self.expect_visible(&self.canvas).await?;

        self.page.drag_to(&source, &target).await?;
        self.pause(500).await;
        report(&self.progress, FlowStage::ElementsPlaced);
        Ok(())
    }

    /// Select a placed element and check its configuration panel
    ///
    /// The label is filled only when empty. Placeholder and required controls
    /// are optional: absent is fine, present-but-hidden fails.
    pub async fn click_element_and_verify_right_panel(
        &self,
        element: &TolerantSelector,
        label: &str,
    ) -> Result<()> {
        self.click(element).await?;
        self.pause(300).await;

        let panel = right_panel();
        self.expect_visible_within(&panel, self.config.timeouts.action_ms)
            .await?;
        self.expect_visible(&panel).await?;

        let label_field = self.expect_visible(&self.label_input).await?;
        self.expect_enabled(&label_field, self.label_input.name())
            .await?;
        if self.page.input_value(&label_field).await?.is_empty() {
            self.page.fill(&label_field, label).await?;
        }

        for optional in [&self.placeholder_input, &self.required_checkbox] {
            if optional.exists(self.page()).await? {
                self.expect_visible(optional).await?;
            }
        }

        let n = self.configured.fetch_add(1, Ordering::SeqCst) + 1;
        report(&self.progress, FlowStage::ElementConfigured(n));
        Ok(())
    }

    /// Type into the first text input on the canvas preview
    pub async fn enter_text_in_textbox(&self, text: &str) -> Result<()> {
        let input = self.expect_visible(&self.text_input).await?;
        self.page.fill(&input, text).await
    }

    /// Attach a file, confirming with the Upload button when the form has one
    pub async fn upload_document(&self, file_path: &Path) -> Result<()> {
        let input = self.expect_visible(&self.file_input).await?;
        self.page.set_input_files(&input, file_path).await?;
        self.pause(1000).await;

        if let Some(button) = self.upload_button.resolve(self.page()).await? {
            self.page.click(&button).await?;
            self.pause(1000).await;
        }
        Ok(())
    }

    /// Save behind a 2xx response, then require a success message
    pub async fn save_form(&self) -> Result<()> {
        let confirmation = self.success_toast.or(&self.confirmation_message);
        self.save_and_confirm(&save_button(), &confirmation).await?;
        report(&self.progress, FlowStage::Saved);
        report(&self.progress, FlowStage::Confirmed);
        Ok(())
    }

    pub async fn verify_document_uploaded(&self, file_name: &str) -> Result<()> {
        let indicator = TolerantSelector::new("uploaded file name")
            .text(file_name)
            .css(&format!("[title=\"{}\"]", file_name));
        if indicator.exists(self.page()).await? {
            self.expect_visible(&indicator).await?;
        }

        let confirmation = self.success_toast.or(&self.confirmation_message);
        self.expect_visible(&confirmation).await?;
        Ok(())
    }

    /// Complete flow, in the order the builder expects
    pub async fn create_form_with_upload(&self, spec: &FormSpec<'_>) -> Result<()> {
        self.navigate_to_automation().await?;
        self.open_create_form().await?;
        self.fill_form_details(spec.form_name, None).await?;

        self.drag_drop_textbox().await?;
        self.click_element_and_verify_right_panel(&self.textbox_element, spec.textbox_label)
            .await?;

        self.drag_drop_select_file().await?;
        self.click_element_and_verify_right_panel(
            &self.select_file_element,
            spec.file_upload_label,
        )
        .await?;

        self.enter_text_in_textbox(spec.text_value).await?;
        self.upload_document(spec.file_path).await?;
        self.save_form().await?;

        let file_name = file_name_of(&spec.file_path.to_string_lossy());
        self.verify_document_uploaded(&file_name).await
    }
}

#[async_trait]
impl BasePage for FormPage {
    fn page(&self) -> &dyn BrowserPage {
        self.page.as_ref()
    }

    fn config(&self) -> &Config {
        &self.config
    }
}
