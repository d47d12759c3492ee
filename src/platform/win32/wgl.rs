//! WGL pixel formats and OpenGL contexts
//!
//! Extension entry points arrive as raw addresses resolved during the
//! bootstrap and are cast back to their C signatures here.

use std::ffi::{CStr, CString, c_char};

use windows::Win32::Foundation::{BOOL, HWND};
use windows::Win32::Graphics::Gdi::{GetDC, HDC, ReleaseDC};
use windows::Win32::Graphics::OpenGL::{
    ChoosePixelFormat, DescribePixelFormat, HGLRC, PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW,
    PFD_MAIN_PLANE, PFD_SUPPORT_OPENGL, PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR, SetPixelFormat,
    SwapBuffers, wglCreateContext, wglDeleteContext, wglGetCurrentContext, wglGetProcAddress,
    wglMakeCurrent,
};
use windows::core::PCSTR;

use super::{Win32Platform, last_error, os_error};
use crate::domain::pixel_format::{PixelFormatAttributeList, WGL_NUMBER_PIXEL_FORMATS_ARB};
use crate::platform::backend::{
    ContextAttributes, DeviceContext, ExtensionFunctions, GlBackend, NativeContext, NativeWindow,
    OsError, ProcAddress,
};

const WGL_CONTEXT_MAJOR_VERSION_ARB: i32 = 0x2091;
const WGL_CONTEXT_MINOR_VERSION_ARB: i32 = 0x2092;
const WGL_CONTEXT_FLAGS_ARB: i32 = 0x2094;
const WGL_CONTEXT_PROFILE_MASK_ARB: i32 = 0x9126;
const WGL_CONTEXT_DEBUG_BIT_ARB: i32 = 0x0001;
const WGL_CONTEXT_CORE_PROFILE_BIT_ARB: i32 = 0x0001;
const WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: i32 = 0x0002;

type GetExtensionsStringArb = unsafe extern "system" fn(HDC) -> *const c_char;
type GetPixelFormatAttribivArb =
    unsafe extern "system" fn(HDC, i32, i32, u32, *const i32, *mut i32) -> BOOL;
type CreateContextAttribsArb = unsafe extern "system" fn(HDC, HGLRC, *const i32) -> HGLRC;
type SwapIntervalExt = unsafe extern "system" fn(i32) -> BOOL;

fn hdc(device_context: DeviceContext) -> HDC {
    HDC(device_context.0)
}

fn basic_descriptor() -> PIXELFORMATDESCRIPTOR {
    PIXELFORMATDESCRIPTOR {
        nSize: std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16,
        nVersion: 1,
        dwFlags: PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_DOUBLEBUFFER,
        iPixelType: PFD_TYPE_RGBA,
        cColorBits: 32,
        cDepthBits: 24,
        cStencilBits: 8,
        iLayerType: PFD_MAIN_PLANE.0 as u8,
        ..Default::default()
    }
}

impl GlBackend for Win32Platform {
    fn device_context(&self, window: NativeWindow) -> Result<DeviceContext, OsError> {
        let handle = unsafe { GetDC(HWND(window.0)) };
        if handle.0 == 0 {
            return Err(last_error("GetDC"));
        }

        Ok(DeviceContext(handle.0))
    }

    fn release_device_context(&self, window: NativeWindow, device_context: DeviceContext) {
        // Own-DC windows keep their context, releasing is a formality
        unsafe {
            ReleaseDC(HWND(window.0), hdc(device_context));
        }
    }

    fn choose_default_pixel_format(&self, device_context: DeviceContext) -> Result<i32, OsError> {
        let descriptor = basic_descriptor();
        let format = unsafe { ChoosePixelFormat(hdc(device_context), &descriptor) };

        if format == 0 {
            return Err(last_error("ChoosePixelFormat"));
        }

        Ok(format)
    }

    fn set_pixel_format(&self, device_context: DeviceContext, format: i32) -> Result<(), OsError> {
        let mut descriptor = PIXELFORMATDESCRIPTOR::default();

        let described = unsafe {
            DescribePixelFormat(
                hdc(device_context),
                format,
                std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u32,
                Some(&mut descriptor),
            )
        };

        if described == 0 {
            return Err(last_error("DescribePixelFormat"));
        }

        unsafe { SetPixelFormat(hdc(device_context), format, &descriptor) }
            .map_err(|error| os_error("SetPixelFormat", &error))
    }

    fn pixel_format_count(
        &self,
        functions: &ExtensionFunctions,
        device_context: DeviceContext,
    ) -> Result<u32, OsError> {
        let get_attributes: GetPixelFormatAttribivArb =
            unsafe { std::mem::transmute(functions.get_pixel_format_attribiv.0) };

        let attribute = WGL_NUMBER_PIXEL_FORMATS_ARB;
        let mut count = 0;
        let result = unsafe { get_attributes(hdc(device_context), 0, 0, 1, &attribute, &mut count) };

        if !result.as_bool() {
            return Err(last_error("wglGetPixelFormatAttribivARB"));
        }

        Ok(count.max(0) as u32)
    }

    fn pixel_format_attributes(
        &self,
        functions: &ExtensionFunctions,
        device_context: DeviceContext,
        format: i32,
        attribute_ids: &PixelFormatAttributeList,
    ) -> Result<PixelFormatAttributeList, OsError> {
        let get_attributes: GetPixelFormatAttribivArb =
            unsafe { std::mem::transmute(functions.get_pixel_format_attribiv.0) };

        let mut values = PixelFormatAttributeList::default();
        let result = unsafe {
            get_attributes(
                hdc(device_context),
                format,
                0,
                attribute_ids.len() as u32,
                attribute_ids.as_ptr(),
                values.as_mut_ptr(),
            )
        };

        if !result.as_bool() {
            return Err(last_error("wglGetPixelFormatAttribivARB"));
        }

        Ok(values)
    }

    fn create_basic_context(
        &self,
        device_context: DeviceContext,
    ) -> Result<NativeContext, OsError> {
        let context = unsafe { wglCreateContext(hdc(device_context)) }
            .map_err(|error| os_error("wglCreateContext", &error))?;

        Ok(NativeContext(context.0))
    }

    fn create_context(
        &self,
        functions: &ExtensionFunctions,
        device_context: DeviceContext,
        attributes: &ContextAttributes,
    ) -> Result<NativeContext, OsError> {
        let create: CreateContextAttribsArb =
            unsafe { std::mem::transmute(functions.create_context_attribs.0) };

        let profile = if attributes.core_profile {
            WGL_CONTEXT_CORE_PROFILE_BIT_ARB
        } else {
            WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB
        };
        let flags = if attributes.debug { WGL_CONTEXT_DEBUG_BIT_ARB } else { 0 };

        let attribute_list = [
            WGL_CONTEXT_MAJOR_VERSION_ARB,
            attributes.major_version as i32,
            WGL_CONTEXT_MINOR_VERSION_ARB,
            attributes.minor_version as i32,
            WGL_CONTEXT_PROFILE_MASK_ARB,
            profile,
            WGL_CONTEXT_FLAGS_ARB,
            flags,
            0,
        ];

        let context = unsafe { create(hdc(device_context), HGLRC(0), attribute_list.as_ptr()) };
        if context.0 == 0 {
            return Err(last_error("wglCreateContextAttribsARB"));
        }

        Ok(NativeContext(context.0))
    }

    fn delete_context(&self, context: NativeContext) -> Result<(), OsError> {
        unsafe { wglDeleteContext(HGLRC(context.0)) }
            .map_err(|error| os_error("wglDeleteContext", &error))
    }

    fn make_current(
        &self,
        binding: Option<(DeviceContext, NativeContext)>,
    ) -> Result<(), OsError> {
        let (device_context, context) = match binding {
            Some((device_context, context)) => (hdc(device_context), HGLRC(context.0)),
            None => (HDC(0), HGLRC(0)),
        };

        unsafe { wglMakeCurrent(device_context, context) }
            .map_err(|error| os_error("wglMakeCurrent", &error))
    }

    fn current_context(&self) -> Option<NativeContext> {
        let context = unsafe { wglGetCurrentContext() };
        (context.0 != 0).then_some(NativeContext(context.0))
    }

    fn proc_address(&self, name: &str) -> Option<ProcAddress> {
        let name = CString::new(name).ok()?;
        let function = unsafe { wglGetProcAddress(PCSTR(name.as_ptr().cast())) }?;
        let address = function as usize;

        // Some drivers signal failure with small sentinel values instead of null
        match address as isize {
            -1 | 1 | 2 | 3 => None,
            _ => Some(ProcAddress(address)),
        }
    }

    fn extensions_string(
        &self,
        get_extensions_string: ProcAddress,
        device_context: DeviceContext,
    ) -> Result<String, OsError> {
        let get_extensions: GetExtensionsStringArb =
            unsafe { std::mem::transmute(get_extensions_string.0) };

        let extensions = unsafe { get_extensions(hdc(device_context)) };
        if extensions.is_null() {
            return Err(last_error("wglGetExtensionsStringARB"));
        }

        Ok(unsafe { CStr::from_ptr(extensions) }.to_string_lossy().into_owned())
    }

    fn swap_buffers(&self, device_context: DeviceContext) -> Result<(), OsError> {
        unsafe { SwapBuffers(hdc(device_context)) }.map_err(|error| os_error("SwapBuffers", &error))
    }

    fn set_swap_interval(&self, swap_interval: ProcAddress, interval: i32) -> Result<(), OsError> {
        let set_interval: SwapIntervalExt = unsafe { std::mem::transmute(swap_interval.0) };

        if !unsafe { set_interval(interval) }.as_bool() {
            return Err(last_error("wglSwapIntervalEXT"));
        }

        Ok(())
    }
}
