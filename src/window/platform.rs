//! Raw OS windowing, input, and capture surface.
//!
//! The [`Platform`] trait is the seam between the watchdog and the winapi:
//! everything above it is testable with a mock. [`NativePlatform`] is the
//! Win32 implementation; on non-Windows platforms it compiles but every
//! operation reports [`PlatformError::Unsupported`].

use std::path::Path;

use regex::Regex;

use super::error::PlatformError;

/// Opaque reference to a located top-level window.
///
/// Handles are not durable: the target window may close and reopen, so
/// callers re-resolve before every activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHandle(pub(crate) isize);

/// A screen coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// A screen-space rectangle (client area translated to screen coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// A simulated keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character key (keybinds, chat key).
    Char(char),
    Escape,
    Enter,
}

/// Raw windowing, input, and capture operations.
pub trait Platform: Send + Sync {
    /// Scan all top-level windows and return the handle of the last one
    /// whose title matches `title`, or `None` when nothing matches.
    fn find_window(&self, title: &Regex) -> Result<Option<WindowHandle>, PlatformError>;

    /// Bring `window` to the foreground, maximized.
    fn activate(&self, window: WindowHandle) -> Result<(), PlatformError>;

    /// The window's client area in screen coordinates.
    fn client_area(&self, window: WindowHandle) -> Result<Rect, PlatformError>;

    /// Capture `area` of the screen and write it to `save_path` as a bitmap.
    fn capture_area(&self, area: Rect, save_path: &Path) -> Result<(), PlatformError>;

    /// Press and release a single key.
    fn press_key(&self, key: Key) -> Result<(), PlatformError>;

    /// Type a string of text.
    fn type_text(&self, text: &str) -> Result<(), PlatformError>;

    /// Left-click a screen position.
    fn click(&self, position: Point) -> Result<(), PlatformError>;
}

/// The OS-native [`Platform`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePlatform;

impl NativePlatform {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
impl Platform for NativePlatform {
    fn find_window(&self, title: &Regex) -> Result<Option<WindowHandle>, PlatformError> {
        imp::find_window(title)
    }

    fn activate(&self, window: WindowHandle) -> Result<(), PlatformError> {
        imp::activate(window)
    }

    fn client_area(&self, window: WindowHandle) -> Result<Rect, PlatformError> {
        imp::client_area(window)
    }

    fn capture_area(&self, area: Rect, save_path: &Path) -> Result<(), PlatformError> {
        imp::capture_area(area, save_path)
    }

    fn press_key(&self, key: Key) -> Result<(), PlatformError> {
        imp::press_key(key);
        Ok(())
    }

    fn type_text(&self, text: &str) -> Result<(), PlatformError> {
        imp::type_text(text);
        Ok(())
    }

    fn click(&self, position: Point) -> Result<(), PlatformError> {
        imp::click(position)
    }
}

#[cfg(not(windows))]
impl Platform for NativePlatform {
    fn find_window(&self, _title: &Regex) -> Result<Option<WindowHandle>, PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn activate(&self, _window: WindowHandle) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn client_area(&self, _window: WindowHandle) -> Result<Rect, PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn capture_area(&self, _area: Rect, _save_path: &Path) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn press_key(&self, _key: Key) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn type_text(&self, _text: &str) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }

    fn click(&self, _position: Point) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }
}

// ── Windows implementation ────────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use std::path::Path;
    use std::time::Duration;

    use regex::Regex;

    use super::{Key, Point, Rect, WindowHandle};
    use crate::window::error::PlatformError;

    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, POINT, RECT, TRUE};
    use windows::Win32::Graphics::Gdi::{
        BitBlt, ClientToScreen, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC,
        DeleteObject, GetDC, GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER,
        BI_RGB, DIB_RGB_COLORS, SRCCOPY,
    };
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
        KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEINPUT,
        VIRTUAL_KEY, VK_ESCAPE, VK_MENU, VK_RETURN,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetClientRect, GetWindowTextW, SetCursorPos, SetForegroundWindow, ShowWindow,
        SW_MAXIMIZE,
    };

    /// Settle time after foreground activation.
    const FOCUS_DELAY: Duration = Duration::from_millis(300);
    /// Settle time around cursor movement during a click.
    const CURSOR_MOVE_DELAY: Duration = Duration::from_millis(100);

    struct EnumState<'a> {
        pattern: &'a Regex,
        found: Option<isize>,
    }

    unsafe extern "system" fn enum_windows_cb(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let state = &mut *(lparam.0 as *mut EnumState);
        let mut buf = [0u16; 512];
        let len = GetWindowTextW(hwnd, &mut buf);
        if len > 0 {
            let title = String::from_utf16_lossy(&buf[..len as usize]);
            if state.pattern.is_match(&title) {
                state.found = Some(hwnd.0);
            }
        }
        TRUE
    }

    pub fn find_window(title: &Regex) -> Result<Option<WindowHandle>, PlatformError> {
        let mut state = EnumState {
            pattern: title,
            found: None,
        };
        unsafe {
            EnumWindows(
                Some(enum_windows_cb),
                LPARAM(std::ptr::addr_of_mut!(state) as isize),
            )
            .map_err(|e| PlatformError::Api(format!("EnumWindows failed: {e}")))?;
        }
        Ok(state.found.map(WindowHandle))
    }

    pub fn activate(window: WindowHandle) -> Result<(), PlatformError> {
        let hwnd = HWND(window.0);
        unsafe {
            // Tapping Alt releases the foreground lock so
            // SetForegroundWindow is allowed to steal focus.
            send_vk(VK_MENU);
            let _ = ShowWindow(hwnd, SW_MAXIMIZE);
            if !SetForegroundWindow(hwnd).as_bool() {
                return Err(PlatformError::Api(
                    "SetForegroundWindow refused to activate window".to_string(),
                ));
            }
        }
        std::thread::sleep(FOCUS_DELAY);
        Ok(())
    }

    pub fn client_area(window: WindowHandle) -> Result<Rect, PlatformError> {
        let hwnd = HWND(window.0);
        let mut rect = RECT::default();
        unsafe {
            GetClientRect(hwnd, &mut rect)
                .map_err(|e| PlatformError::Api(format!("GetClientRect failed: {e}")))?;
        }

        let mut origin = POINT { x: rect.left, y: rect.top };
        unsafe {
            if !ClientToScreen(hwnd, &mut origin).as_bool() {
                return Err(PlatformError::Api("ClientToScreen failed".to_string()));
            }
        }

        Ok(Rect {
            left: origin.x,
            top: origin.y,
            width: rect.right - rect.left,
            height: rect.bottom - rect.top,
        })
    }

    pub fn capture_area(area: Rect, save_path: &Path) -> Result<(), PlatformError> {
        let width = area.width.max(1);
        let height = area.height.max(1);
        let mut pixels = vec![0u8; (width as usize) * (height as usize) * 4];

        unsafe {
            let screen_dc = GetDC(HWND::default());
            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let old_bitmap = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(
                mem_dc, 0, 0, width, height, screen_dc, area.left, area.top, SRCCOPY,
            );

            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // Positive height requests bottom-up rows, which is
                    // exactly the layout the BMP container stores.
                    biHeight: height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let scanned = GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(pixels.as_mut_ptr().cast()),
                &mut info,
                DIB_RGB_COLORS,
            );

            SelectObject(mem_dc, old_bitmap);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);

            blit.map_err(|e| PlatformError::Api(format!("BitBlt failed: {e}")))?;
            if scanned == 0 {
                return Err(PlatformError::Api("GetDIBits returned no scanlines".to_string()));
            }
        }

        write_bmp(save_path, width, height, &pixels)?;
        Ok(())
    }

    /// Write bottom-up BGRA pixels as a 32-bit BMP file.
    fn write_bmp(path: &Path, width: i32, height: i32, pixels: &[u8]) -> std::io::Result<()> {
        const FILE_HEADER_LEN: u32 = 14;
        const INFO_HEADER_LEN: u32 = 40;

        let data_len = pixels.len() as u32;
        let mut out = Vec::with_capacity((FILE_HEADER_LEN + INFO_HEADER_LEN) as usize + pixels.len());

        // BITMAPFILEHEADER
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&(FILE_HEADER_LEN + INFO_HEADER_LEN + data_len).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(FILE_HEADER_LEN + INFO_HEADER_LEN).to_le_bytes());

        // BITMAPINFOHEADER
        out.extend_from_slice(&INFO_HEADER_LEN.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&32u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());

        out.extend_from_slice(pixels);
        std::fs::write(path, out)
    }

    /// Send a single VK key down+up via SendInput.
    unsafe fn send_vk(vk: VIRTUAL_KEY) {
        let inputs = [key_input(vk, KEYBD_EVENT_FLAGS(0)), key_input(vk, KEYEVENTF_KEYUP)];
        SendInput(&inputs, std::mem::size_of::<INPUT>() as i32);
    }

    fn key_input(vk: VIRTUAL_KEY, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: vk,
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn unicode_input(code: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(0),
                    wScan: code,
                    dwFlags: flags | KEYEVENTF_UNICODE,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    pub fn press_key(key: Key) {
        match key {
            // ASCII alphanumerics map directly onto their VK values.
            Key::Char(c) if c.is_ascii_alphanumeric() => unsafe {
                send_vk(VIRTUAL_KEY(c.to_ascii_uppercase() as u16));
            },
            Key::Char(c) => {
                let mut buf = [0u16; 2];
                for &code in c.encode_utf16(&mut buf).iter() {
                    let inputs = [
                        unicode_input(code, KEYBD_EVENT_FLAGS(0)),
                        unicode_input(code, KEYEVENTF_KEYUP),
                    ];
                    unsafe {
                        SendInput(&inputs, std::mem::size_of::<INPUT>() as i32);
                    }
                }
            }
            Key::Escape => unsafe { send_vk(VK_ESCAPE) },
            Key::Enter => unsafe { send_vk(VK_RETURN) },
        }
    }

    pub fn type_text(text: &str) {
        for code in text.encode_utf16() {
            let inputs = [
                unicode_input(code, KEYBD_EVENT_FLAGS(0)),
                unicode_input(code, KEYEVENTF_KEYUP),
            ];
            unsafe {
                SendInput(&inputs, std::mem::size_of::<INPUT>() as i32);
            }
        }
    }

    pub fn click(position: Point) -> Result<(), PlatformError> {
        unsafe {
            SetCursorPos(position.x, position.y)
                .map_err(|e| PlatformError::Api(format!("SetCursorPos failed: {e}")))?;
        }
        std::thread::sleep(CURSOR_MOVE_DELAY);

        let press = mouse_input(MOUSEEVENTF_LEFTDOWN);
        let release = mouse_input(MOUSEEVENTF_LEFTUP);
        unsafe {
            SendInput(&[press, release], std::mem::size_of::<INPUT>() as i32);
        }
        std::thread::sleep(CURSOR_MOVE_DELAY);
        Ok(())
    }

    fn mouse_input(flags: windows::Win32::UI::Input::KeyboardAndMouse::MOUSE_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx: 0,
                    dy: 0,
                    mouseData: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_fields() {
        let rect = Rect {
            left: 10,
            top: 20,
            width: 640,
            height: 480,
        };
        assert_eq!(rect.left, 10);
        assert_eq!(rect.width, 640);
    }

    #[test]
    fn test_key_variants() {
        assert_eq!(Key::Char('r'), Key::Char('r'));
        assert_ne!(Key::Escape, Key::Enter);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_native_platform_unsupported_off_windows() {
        let platform = NativePlatform::new();
        let pattern = regex::Regex::new("Minecraft").unwrap();
        assert!(matches!(
            platform.find_window(&pattern),
            Err(PlatformError::Unsupported)
        ));
        assert!(matches!(
            platform.press_key(Key::Escape),
            Err(PlatformError::Unsupported)
        ));
    }
}
