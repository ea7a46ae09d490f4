//! Image selection providers
//!
//! When a device shows up the control loop asks an [`ImageSelector`] which
//! image folder to push. Selectors either return a fixed or remembered folder
//! or ask the user on the terminal.

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use crate::config::Settings;
use crate::errors::Result;
use crate::models::device::DeviceVariant;
use crate::models::image::ImageSelection;
use crate::services::image_catalog::{ImageCatalog, validate_image_dir};

/// Resolves the image folder for a detected device
#[async_trait]
pub trait ImageSelector: Send {
    /// Image to push, or `None` when the user declined to choose one
    async fn select_image(&mut self, variant: DeviceVariant) -> Result<Option<ImageSelection>>;
}

/// Always answers with the same folder
#[derive(Debug, Clone)]
pub struct FixedImageSelector {
    path: PathBuf,
}

impl FixedImageSelector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ImageSelector for FixedImageSelector {
    async fn select_image(&mut self, _variant: DeviceVariant) -> Result<Option<ImageSelection>> {
        validate_image_dir(&self.path)?;
        Ok(Some(ImageSelection::once(self.path.clone())))
    }
}

/// Uses the remembered image from the settings, otherwise asks `fallback`.
/// A selection the user asked to remember is written back to the settings.
pub struct SettingsSelector<S> {
    settings: Settings,
    fallback: S,
    use_remembered: bool,
}

impl<S: ImageSelector> SettingsSelector<S> {
    pub fn new(settings: Settings, fallback: S) -> Self {
        Self {
            settings,
            fallback,
            use_remembered: true,
        }
    }

    /// Always ask `fallback`, but still persist a choice the user wants remembered
    pub fn asking(settings: Settings, fallback: S) -> Self {
        Self {
            settings,
            fallback,
            use_remembered: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[async_trait]
impl<S: ImageSelector> ImageSelector for SettingsSelector<S> {
    async fn select_image(&mut self, variant: DeviceVariant) -> Result<Option<ImageSelection>> {
        if let Some(image) = self
            .settings
            .always_use_image()
            .filter(|_| self.use_remembered)
        {
            let path = PathBuf::from(image);
            validate_image_dir(&path)?;
            log::debug!("Using remembered image {}", path.display());
            return Ok(Some(ImageSelection::once(path)));
        }

        let selection = self.fallback.select_image(variant).await?;
        if let Some(selection) = &selection {
            if selection.remember {
                let image = selection.path.to_string_lossy();
                self.settings.set_always_use_image(Some(&image))?;
                log::info!("Remembering image {} for the next devices", image);
            }
        }
        Ok(selection)
    }
}

/// Asks the user on the terminal which catalog image (or custom folder) to use
pub struct PromptSelector<R, W> {
    catalog: ImageCatalog,
    input: R,
    output: W,
}

impl PromptSelector<BufReader<Stdin>, std::io::Stdout> {
    pub fn stdio(catalog: ImageCatalog) -> Self {
        Self::new(catalog, BufReader::new(tokio::io::stdin()), std::io::stdout())
    }
}

impl<R, W> PromptSelector<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    pub fn new(catalog: ImageCatalog, input: R, output: W) -> Self {
        Self {
            catalog,
            input,
            output,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    async fn prompt(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn print_choices(&mut self) -> Result<usize> {
        writeln!(self.output, "Available images:")?;
        for (index, image) in self.catalog.images().iter().enumerate() {
            writeln!(
                self.output,
                "  {}) {} [{}]",
                index + 1,
                image.description,
                image.path.display()
            )?;
        }
        let custom_choice = self.catalog.len() + 1;
        writeln!(self.output, "  {}) Custom image folder", custom_choice)?;
        Ok(custom_choice)
    }
}

#[async_trait]
impl<R, W> ImageSelector for PromptSelector<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    async fn select_image(&mut self, variant: DeviceVariant) -> Result<Option<ImageSelection>> {
        writeln!(self.output, "Raspberry Pi model detected: {}", variant)?;

        loop {
            let custom_choice = self.print_choices()?;
            let Some(answer) = self.prompt("Select image [1] (q to cancel): ").await? else {
                return Ok(None);
            };
            if answer.eq_ignore_ascii_case("q") {
                return Ok(None);
            }

            let choice = if answer.is_empty() {
                1
            } else {
                match answer.parse::<usize>() {
                    Ok(choice) if (1..=custom_choice).contains(&choice) => choice,
                    _ => {
                        writeln!(self.output, "Invalid choice: {}", answer)?;
                        continue;
                    }
                }
            };

            let path = if choice == custom_choice {
                let Some(folder) = self.prompt("Image folder: ").await? else {
                    return Ok(None);
                };
                if folder.is_empty() {
                    continue;
                }
                PathBuf::from(folder)
            } else {
                self.catalog.images()[choice - 1].path.clone()
            };

            if let Err(e) = validate_image_dir(&path) {
                writeln!(self.output, "{}", e)?;
                continue;
            }

            let answer = self
                .prompt("Always use this image for the next Pi plugged in? [y/N]: ")
                .await?
                .unwrap_or_default();
            let remember = matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes");

            return Ok(Some(ImageSelection { path, remember }));
        }
    }
}
