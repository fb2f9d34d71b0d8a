//! Real Windows screen capture and focused-window lookup via Win32 APIs.
//!
//! On Windows, captures the configured monitor with BitBlt into a top-down
//! 32-bit BGRA buffer, and reads the foreground window title with
//! GetForegroundWindow + GetWindowTextW. On other platforms both return
//! errors.

#[cfg(target_os = "windows")]
use chrono::Utc;
#[cfg(not(target_os = "windows"))]
use tracing::warn;
#[cfg(target_os = "windows")]
use uuid::Uuid;

use framebot_core::error::{FramebotError, Result};
use framebot_core::types::ScreenFrame;

use crate::window::ActiveWindow;
use crate::CaptureService;

/// Windows screen capture service using Win32 GDI.
pub struct WindowsCaptureService {
    monitor_index: usize,
}

impl WindowsCaptureService {
    pub fn new(monitor_index: usize) -> Self {
        Self { monitor_index }
    }

    pub fn monitor_index(&self) -> usize {
        self.monitor_index
    }
}

/// Position and size of one display in virtual-screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
struct MonitorBounds {
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    primary: bool,
}

/// Pick the display for `index`. Index 0 is the primary display, the rest
/// follow in enumeration order.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn select_monitor(mut monitors: Vec<MonitorBounds>, index: usize) -> Result<MonitorBounds> {
    monitors.sort_by_key(|m| !m.primary);
    let count = monitors.len();
    let bounds = monitors.into_iter().nth(index).ok_or_else(|| {
        FramebotError::Capture(format!(
            "monitor_index {} out of range, {} monitor(s) attached",
            index, count
        ))
    })?;
    if bounds.width <= 0 || bounds.height <= 0 {
        return Err(FramebotError::Capture(format!(
            "monitor {} has an empty area",
            index
        )));
    }
    Ok(bounds)
}

/// Foreground-window title source backed by `GetForegroundWindow`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsActiveWindow;

// =============================================================================
// Windows implementation
// =============================================================================

#[cfg(target_os = "windows")]
impl CaptureService for WindowsCaptureService {
    async fn capture_frame(&self) -> Result<ScreenFrame> {
        let bounds = select_monitor(unsafe { enumerate_monitors() }, self.monitor_index)?;
        let (width, height, pixels) = unsafe { capture_bgra(bounds)? };
        tracing::trace!(monitor = self.monitor_index, width, height, "Screen captured");
        Ok(ScreenFrame {
            id: Uuid::new_v4(),
            captured_at: Utc::now(),
            monitor_id: format!("monitor_{}", self.monitor_index),
            width,
            height,
            pixels,
        })
    }
}

#[cfg(target_os = "windows")]
impl ActiveWindow for WindowsActiveWindow {
    fn active_window_title(&self) -> Result<String> {
        Ok(unsafe { foreground_window_title() })
    }
}

#[cfg(target_os = "windows")]
unsafe fn foreground_window_title() -> String {
    use windows_sys::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

    let hwnd = GetForegroundWindow();
    if hwnd == 0 {
        return String::new();
    }

    let mut title_buf = [0u16; 512];
    let title_len = GetWindowTextW(hwnd, title_buf.as_mut_ptr(), 512);
    if title_len > 0 {
        String::from_utf16_lossy(&title_buf[..title_len as usize])
    } else {
        String::new()
    }
}

#[cfg(target_os = "windows")]
unsafe fn enumerate_monitors() -> Vec<MonitorBounds> {
    use windows_sys::Win32::Foundation::{BOOL, LPARAM, RECT};
    use windows_sys::Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOF_PRIMARY,
    };

    unsafe extern "system" fn collect(
        monitor: HMONITOR,
        _hdc: HDC,
        _clip: *mut RECT,
        data: LPARAM,
    ) -> BOOL {
        let monitors = &mut *(data as *mut Vec<MonitorBounds>);
        let mut info: MONITORINFO = std::mem::zeroed();
        info.cbSize = std::mem::size_of::<MONITORINFO>() as u32;
        if GetMonitorInfoW(monitor, &mut info) != 0 {
            let rect = info.rcMonitor;
            monitors.push(MonitorBounds {
                left: rect.left,
                top: rect.top,
                width: rect.right - rect.left,
                height: rect.bottom - rect.top,
                primary: info.dwFlags & MONITORINFOF_PRIMARY != 0,
            });
        }
        1 // keep enumerating
    }

    let mut monitors: Vec<MonitorBounds> = Vec::new();
    EnumDisplayMonitors(
        0,
        std::ptr::null(),
        Some(collect),
        &mut monitors as *mut Vec<MonitorBounds> as LPARAM,
    );
    monitors
}

#[cfg(target_os = "windows")]
unsafe fn capture_bgra(bounds: MonitorBounds) -> Result<(u32, u32, Vec<u8>)> {
    use windows_sys::Win32::Graphics::Gdi::*;

    // The desktop DC spans the whole virtual screen.
    let hdc_screen = GetDC(0);
    if hdc_screen == 0 {
        return Err(FramebotError::Capture("Failed to get screen DC".into()));
    }

    let MonitorBounds {
        left,
        top,
        width,
        height,
        ..
    } = bounds;

    let hdc_mem = CreateCompatibleDC(hdc_screen);
    let hbm = CreateCompatibleBitmap(hdc_screen, width, height);
    let old_bm = SelectObject(hdc_mem, hbm);

    if BitBlt(hdc_mem, 0, 0, width, height, hdc_screen, left, top, SRCCOPY) == 0 {
        release_gdi(hdc_screen, hdc_mem, hbm, old_bm);
        return Err(FramebotError::Capture("BitBlt failed".into()));
    }

    let mut info: BITMAPINFO = std::mem::zeroed();
    info.bmiHeader.biSize = std::mem::size_of::<BITMAPINFOHEADER>() as u32;
    info.bmiHeader.biWidth = width;
    info.bmiHeader.biHeight = -height; // negative = top-down
    info.bmiHeader.biPlanes = 1;
    info.bmiHeader.biBitCount = 32;
    info.bmiHeader.biCompression = BI_RGB;

    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    let lines = GetDIBits(
        hdc_mem,
        hbm,
        0,
        height as u32,
        pixels.as_mut_ptr() as *mut _,
        &mut info,
        DIB_RGB_COLORS,
    );
    release_gdi(hdc_screen, hdc_mem, hbm, old_bm);

    if lines == 0 {
        return Err(FramebotError::Capture("GetDIBits returned no lines".into()));
    }

    Ok((width as u32, height as u32, pixels))
}

#[cfg(target_os = "windows")]
unsafe fn release_gdi(
    hdc_screen: windows_sys::Win32::Graphics::Gdi::HDC,
    hdc_mem: windows_sys::Win32::Graphics::Gdi::HDC,
    hbm: windows_sys::Win32::Graphics::Gdi::HBITMAP,
    old_bm: windows_sys::Win32::Graphics::Gdi::HGDIOBJ,
) {
    use windows_sys::Win32::Graphics::Gdi::{DeleteDC, DeleteObject, ReleaseDC, SelectObject};

    SelectObject(hdc_mem, old_bm);
    DeleteObject(hbm);
    DeleteDC(hdc_mem);
    ReleaseDC(0, hdc_screen);
}

// =============================================================================
// Non-Windows stub
// =============================================================================

#[cfg(not(target_os = "windows"))]
impl CaptureService for WindowsCaptureService {
    async fn capture_frame(&self) -> Result<ScreenFrame> {
        warn!("WindowsCaptureService called on non-Windows platform");
        Err(FramebotError::Capture(
            "Windows screen capture is only available on Windows".into(),
        ))
    }
}

#[cfg(not(target_os = "windows"))]
impl ActiveWindow for WindowsActiveWindow {
    fn active_window_title(&self) -> Result<String> {
        Err(FramebotError::Focus(
            "Foreground window lookup is only available on Windows".into(),
        ))
    }
}
