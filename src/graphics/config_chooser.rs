//! Pixel format selection for a window's device context

use thiserror::Error;

use crate::domain::pixel_format::{
    PIXEL_FORMAT_ATTRIBUTE_IDS, PixelFormatAttributes, choose_best,
};
use crate::error::{ErrorCode, fatal};
use crate::graphics::extensions::GraphicsExtensions;
use crate::platform::{DeviceContext, ExtensionFunctions, OsError, Platform};

const COMPONENT: &str = "[graphics::config_chooser]";

#[derive(Debug, Error)]
pub enum ConfigChooserError {
    #[error("Failed to query the number of pixel formats")]
    FormatCountFailed(#[source] OsError),

    #[error("Failed to query the attributes of pixel format {format}")]
    AttributeQueryFailed {
        format: i32,
        #[source]
        source: OsError,
    },

    #[error("None of {candidates} pixel formats is hardware accelerated and double buffered")]
    NoAcceptableFormat { candidates: u32 },
}

impl ErrorCode for ConfigChooserError {
    fn code(&self) -> u32 {
        match self {
            ConfigChooserError::FormatCountFailed(_) => 0x000500,
            ConfigChooserError::AttributeQueryFailed { .. } => 0x000501,
            ConfigChooserError::NoAcceptableFormat { .. } => 0x000502,
        }
    }
}

/// A chosen pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsConfig {
    pixel_format: i32,
    attributes: PixelFormatAttributes,
}

impl GraphicsConfig {
    /// One-based OS pixel format index
    pub fn pixel_format(&self) -> i32 {
        self.pixel_format
    }

    pub fn attributes(&self) -> &PixelFormatAttributes {
        &self.attributes
    }
}

/// Scores every pixel format of a device context and picks the best one
pub struct GraphicsConfigChooser<'a> {
    platform: &'a dyn Platform,
    functions: ExtensionFunctions,
    device_context: DeviceContext,
}

impl<'a> GraphicsConfigChooser<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        extensions: &GraphicsExtensions,
        device_context: DeviceContext,
    ) -> Self {
        Self {
            platform,
            functions: *extensions.functions(),
            device_context,
        }
    }

    /// Picks the best accelerated, double-buffered format. Among equally
    /// ranked formats the lowest index wins.
    ///
    /// # Returns
    /// The chosen format with its attributes, or an error when no format
    /// qualifies or the attribute queries fail
    pub fn choose_config(&self) -> Result<GraphicsConfig, ConfigChooserError> {
        let count = self
            .platform
            .pixel_format_count(&self.functions, self.device_context)
            .map_err(|source| fatal(COMPONENT, ConfigChooserError::FormatCountFailed(source)))?;

        let mut candidates = Vec::with_capacity(count as usize);
        for format in 1..=count as i32 {
            let raw = self
                .platform
                .pixel_format_attributes(
                    &self.functions,
                    self.device_context,
                    format,
                    &PIXEL_FORMAT_ATTRIBUTE_IDS,
                )
                .map_err(|source| {
                    fatal(COMPONENT, ConfigChooserError::AttributeQueryFailed { format, source })
                })?;

            let attributes = PixelFormatAttributes::from_raw(&raw);
            log::trace!("{COMPONENT} Pixel format {format}: {attributes:?}");
            candidates.push((format, attributes));
        }

        let acceptable = candidates
            .into_iter()
            .filter(|(_, attributes)| attributes.is_acceptable());

        let Some((pixel_format, attributes)) = choose_best(acceptable) else {
            return Err(fatal(
                COMPONENT,
                ConfigChooserError::NoAcceptableFormat { candidates: count },
            ));
        };

        log::info!(
            "{COMPONENT} Chose pixel format {pixel_format} of {count}: {} colour, {} depth, {} stencil bits",
            attributes.colour_bits,
            attributes.depth_bits,
            attributes.stencil_bits
        );

        Ok(GraphicsConfig {
            pixel_format,
            attributes,
        })
    }
}
