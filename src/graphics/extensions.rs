//! Extension function discovery
//!
//! WGL only resolves extension functions while a context is current, and the
//! real context can only be created through one of those functions. The
//! window manager therefore runs [`GraphicsExtensionManager`] once against a
//! temporary context and keeps the resulting [`GraphicsExtensions`] table for
//! every window it creates afterwards.

use thiserror::Error;

use crate::error::{ErrorCode, fatal};
use crate::graphics::context::GraphicsContextBase;
use crate::platform::{ExtensionFunctions, OsError, ProcAddress};

const COMPONENT: &str = "[graphics::extensions]";

pub const GET_EXTENSIONS_STRING: &str = "wglGetExtensionsStringARB";
pub const GET_PIXEL_FORMAT_ATTRIBIV: &str = "wglGetPixelFormatAttribivARB";
pub const CREATE_CONTEXT_ATTRIBS: &str = "wglCreateContextAttribsARB";
pub const SWAP_INTERVAL: &str = "wglSwapIntervalEXT";

/// Extensions every context must report
pub const REQUIRED_EXTENSIONS: [&str; 3] = [
    "WGL_ARB_pixel_format",
    "WGL_ARB_create_context",
    "WGL_ARB_create_context_profile",
];

/// Optional extension behind [`SWAP_INTERVAL`]
pub const SWAP_CONTROL_EXTENSION: &str = "WGL_EXT_swap_control";

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("Extensions can only be initialised against a current context")]
    ContextNotCurrent,

    #[error("Required extension function {name} could not be resolved")]
    FunctionNotFound { name: &'static str },

    #[error("Failed to query the supported extensions")]
    QueryFailed(#[source] OsError),

    #[error("Required extension {name} is not supported")]
    UnsupportedExtension { name: &'static str },
}

impl ErrorCode for ExtensionError {
    fn code(&self) -> u32 {
        match self {
            ExtensionError::ContextNotCurrent => 0x000600,
            ExtensionError::FunctionNotFound { .. } => 0x000601,
            ExtensionError::QueryFailed(_) => 0x000602,
            ExtensionError::UnsupportedExtension { .. } => 0x000603,
        }
    }
}

/// Resolved extension functions and the extension names a context reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsExtensions {
    functions: ExtensionFunctions,
    supported: Vec<String>,
}

impl GraphicsExtensions {
    pub fn functions(&self) -> &ExtensionFunctions {
        &self.functions
    }

    pub fn supported_extensions(&self) -> &[String] {
        &self.supported
    }

    pub fn is_supported(&self, extension: &str) -> bool {
        self.supported.iter().any(|name| name == extension)
    }

    /// Whether the swap interval can be changed
    pub fn has_swap_control(&self) -> bool {
        self.functions.swap_interval.is_some()
    }
}

pub struct GraphicsExtensionManager;

impl GraphicsExtensionManager {
    /// Resolves the extension functions through `context`, which must be
    /// current on the calling thread
    ///
    /// # Arguments
    /// * `context` - Current bootstrap context whose device context is queried
    ///
    /// # Returns
    /// The resolved function table, or an error when `context` is not current
    /// or a required entry point is missing
    pub fn initialise_extensions(
        context: &dyn GraphicsContextBase,
    ) -> Result<GraphicsExtensions, ExtensionError> {
        let device_context = match context.device_context() {
            Some(device_context) if context.is_current() => device_context,
            _ => return Err(fatal(COMPONENT, ExtensionError::ContextNotCurrent)),
        };

        let platform = context.platform();
        let resolve = |name: &'static str| -> Result<ProcAddress, ExtensionError> {
            platform
                .proc_address(name)
                .ok_or_else(|| fatal(COMPONENT, ExtensionError::FunctionNotFound { name }))
        };

        let get_extensions_string = resolve(GET_EXTENSIONS_STRING)?;
        let get_pixel_format_attribiv = resolve(GET_PIXEL_FORMAT_ATTRIBIV)?;
        let create_context_attribs = resolve(CREATE_CONTEXT_ATTRIBS)?;

        let reported = platform
            .extensions_string(get_extensions_string, device_context)
            .map_err(|source| fatal(COMPONENT, ExtensionError::QueryFailed(source)))?;

        let supported: Vec<String> = reported.split_whitespace().map(str::to_owned).collect();
        for extension in &supported {
            log::debug!("{COMPONENT} Supported: {extension}");
        }
        log::info!("{COMPONENT} Context reports {} extensions", supported.len());

        if let Some(name) = REQUIRED_EXTENSIONS
            .into_iter()
            .find(|required| !supported.iter().any(|name| name == *required))
        {
            return Err(fatal(COMPONENT, ExtensionError::UnsupportedExtension { name }));
        }

        let swap_interval = if supported.iter().any(|name| name == SWAP_CONTROL_EXTENSION) {
            platform.proc_address(SWAP_INTERVAL)
        } else {
            None
        };
        if swap_interval.is_none() {
            log::warn!("{COMPONENT} {SWAP_CONTROL_EXTENSION} is unavailable, vsync cannot be changed");
        }

        Ok(GraphicsExtensions {
            functions: ExtensionFunctions {
                get_extensions_string,
                get_pixel_format_attribiv,
                create_context_attribs,
                swap_interval,
            },
            supported,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::graphics::context::TemporaryGraphicsContext;
    use crate::graphics::test_support::create_window;
    use crate::platform::HeadlessPlatform;

    fn initialised(platform: &Rc<HeadlessPlatform>) -> TemporaryGraphicsContext {
        let scratch = create_window(platform);
        let mut context = TemporaryGraphicsContext::new(platform.clone(), scratch);
        context.initialise().unwrap();
        context
    }

    #[test]
    fn resolves_all_functions_against_a_current_context() {
        let platform = Rc::new(HeadlessPlatform::new());
        let context = initialised(&platform);

        let extensions = GraphicsExtensionManager::initialise_extensions(&context).unwrap();

        assert!(extensions.has_swap_control());
        assert_eq!(extensions.supported_extensions().len(), 5);
        assert!(extensions.is_supported("WGL_ARB_create_context"));
        assert!(!extensions.is_supported("WGL_ARB_create"));
    }

    #[test]
    fn non_current_context_is_rejected() {
        let platform = Rc::new(HeadlessPlatform::new());
        let mut context = initialised(&platform);
        context.make_non_current().unwrap();

        let error = GraphicsExtensionManager::initialise_extensions(&context).unwrap_err();
        assert!(matches!(error, ExtensionError::ContextNotCurrent));
        assert_eq!(error.code(), 0x000600);
    }

    #[test]
    fn uninitialised_context_is_rejected() {
        let platform = Rc::new(HeadlessPlatform::new());
        let scratch = create_window(&platform);
        let context = TemporaryGraphicsContext::new(platform.clone(), scratch);

        assert!(GraphicsExtensionManager::initialise_extensions(&context).is_err());
    }

    #[test]
    fn missing_required_function_is_fatal() {
        let platform = Rc::new(HeadlessPlatform::new().without_function(CREATE_CONTEXT_ATTRIBS));
        let context = initialised(&platform);

        let error = GraphicsExtensionManager::initialise_extensions(&context).unwrap_err();
        assert!(matches!(
            error,
            ExtensionError::FunctionNotFound { name: CREATE_CONTEXT_ATTRIBS }
        ));
    }

    #[test]
    fn missing_required_extension_is_fatal() {
        let platform = Rc::new(
            HeadlessPlatform::new()
                .with_extensions("WGL_ARB_extensions_string WGL_ARB_pixel_format"),
        );
        let context = initialised(&platform);

        let error = GraphicsExtensionManager::initialise_extensions(&context).unwrap_err();
        assert!(matches!(
            error,
            ExtensionError::UnsupportedExtension { name: "WGL_ARB_create_context" }
        ));
    }

    #[test]
    fn swap_control_is_optional() {
        let platform = Rc::new(HeadlessPlatform::new().with_extensions(
            "WGL_ARB_pixel_format WGL_ARB_create_context WGL_ARB_create_context_profile",
        ));
        let context = initialised(&platform);

        let extensions = GraphicsExtensionManager::initialise_extensions(&context).unwrap();

        assert!(!extensions.has_swap_control());
        assert_eq!(extensions.functions().swap_interval, None);
    }
}
