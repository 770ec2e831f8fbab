use super::utils::{self, from_hwnd, to_hwnd};
use crate::{
    TrackerError, TrackerResult, WindowHandle, WindowRect,
    system::{ModifierKey, MouseButton, WindowSystem},
};
use std::path::PathBuf;
use windows_sys::Win32::{
    Foundation::POINT,
    System::Threading::{AttachThreadInput, GetCurrentThreadId},
    UI::{
        Input::KeyboardAndMouse::{
            INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYEVENTF_KEYUP,
            MOUSE_EVENT_FLAGS, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_RIGHTDOWN,
            MOUSEEVENTF_RIGHTUP, MOUSEINPUT, SendInput, VIRTUAL_KEY, VK_CONTROL, VK_MENU, VK_SHIFT,
        },
        WindowsAndMessaging::{
            BringWindowToTop, GetCursorPos, HWND_TOP, IsIconic, PostMessageW, SW_MAXIMIZE,
            SW_MINIMIZE, SW_RESTORE, SWP_NOMOVE, SWP_NOSIZE, SWP_SHOWWINDOW, SetCursorPos,
            SetForegroundWindow, SetWindowPos, ShowWindow, WM_CLOSE,
        },
    },
};

/// [`WindowSystem`] over the Win32 user32/kernel32 APIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32System;

impl Win32System {
    /// # Errors
    ///
    /// Returns [`TrackerError::NotInteractiveSession`] for services and other
    /// sessions without a visible window station.
    pub fn new() -> TrackerResult<Self> {
        if !utils::is_interactive_session()? {
            return Err(TrackerError::NotInteractiveSession);
        }
        Ok(Self)
    }
}

fn virtual_key(key: ModifierKey) -> VIRTUAL_KEY {
    match key {
        ModifierKey::Alt => VK_MENU,
        ModifierKey::Shift => VK_SHIFT,
        ModifierKey::Control => VK_CONTROL,
    }
}

fn send_inputs(inputs: &[INPUT]) -> TrackerResult<()> {
    let sent = unsafe {
        SendInput(
            inputs.len() as u32,
            inputs.as_ptr(),
            std::mem::size_of::<INPUT>() as i32,
        )
    };

    if sent as usize != inputs.len() {
        return Err(TrackerError::platform(format!(
            "SendInput injected {sent} of {} events",
            inputs.len()
        )));
    }
    Ok(())
}

fn keyboard_input(key: ModifierKey, release: bool) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: virtual_key(key),
                wScan: 0,
                dwFlags: if release { KEYEVENTF_KEYUP } else { 0 },
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS) -> INPUT {
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

impl WindowSystem for Win32System {
    fn foreground_window(&self) -> TrackerResult<Option<WindowHandle>> {
        Ok(utils::get_foreground_window().map(from_hwnd))
    }

    fn enumerate_windows(&self) -> TrackerResult<Vec<WindowHandle>> {
        utils::enumerate_visible()
    }

    fn window_title(&self, window: WindowHandle) -> TrackerResult<String> {
        utils::get_window_title(to_hwnd(window))
    }

    fn window_process_id(&self, window: WindowHandle) -> TrackerResult<u32> {
        Ok(utils::get_window_thread_process_id(to_hwnd(window))?.1)
    }

    fn window_thread_id(&self, window: WindowHandle) -> TrackerResult<u32> {
        Ok(utils::get_window_thread_process_id(to_hwnd(window))?.0)
    }

    fn window_rect(&self, window: WindowHandle) -> TrackerResult<WindowRect> {
        utils::get_window_rect(to_hwnd(window))
    }

    fn process_name(&self, process_id: u32) -> TrackerResult<String> {
        utils::get_process_name(process_id)
    }

    fn process_executable(&self, process_id: u32) -> TrackerResult<PathBuf> {
        utils::get_process_exe_path(process_id)
    }

    fn current_thread_id(&self) -> TrackerResult<u32> {
        Ok(unsafe { GetCurrentThreadId() })
    }

    fn attach_thread_input(&self, from: u32, to: u32, attach: bool) -> TrackerResult<bool> {
        Ok(unsafe { AttachThreadInput(from, to, i32::from(attach)) } != 0)
    }

    fn restore_window(&self, window: WindowHandle) -> TrackerResult<()> {
        let hwnd = to_hwnd(window);
        if unsafe { IsIconic(hwnd) } != 0 {
            // Return value is the previous visibility, not success.
            unsafe { ShowWindow(hwnd, SW_RESTORE) };
        }
        Ok(())
    }

    fn raise_window(&self, window: WindowHandle) -> TrackerResult<()> {
        let hwnd = to_hwnd(window);
        let ok = unsafe {
            SetWindowPos(
                hwnd,
                HWND_TOP,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_SHOWWINDOW,
            )
        };
        if ok == 0 {
            return Err(TrackerError::platform(format!(
                "SetWindowPos failed for window {window}"
            )));
        }
        Ok(())
    }

    fn request_foreground(&self, window: WindowHandle) -> TrackerResult<bool> {
        let hwnd = to_hwnd(window);
        unsafe {
            BringWindowToTop(hwnd);
            SetForegroundWindow(hwnd);
        }
        // SetForegroundWindow may flash the taskbar instead; only the
        // resulting foreground window tells whether it worked.
        Ok(utils::get_foreground_window() == Some(hwnd))
    }

    fn set_foreground_raw(&self, window: WindowHandle) -> TrackerResult<bool> {
        Ok(unsafe { SetForegroundWindow(to_hwnd(window)) } != 0)
    }

    fn key_down(&self, key: ModifierKey) -> TrackerResult<()> {
        send_inputs(&[keyboard_input(key, false)])
    }

    fn key_up(&self, key: ModifierKey) -> TrackerResult<()> {
        send_inputs(&[keyboard_input(key, true)])
    }

    fn cursor_position(&self) -> TrackerResult<(i32, i32)> {
        let mut point = POINT { x: 0, y: 0 };
        if unsafe { GetCursorPos(&mut point) } == 0 {
            return Err(TrackerError::platform("GetCursorPos failed"));
        }
        Ok((point.x, point.y))
    }

    fn set_cursor_position(&self, x: i32, y: i32) -> TrackerResult<()> {
        if unsafe { SetCursorPos(x, y) } == 0 {
            return Err(TrackerError::platform(format!(
                "SetCursorPos({x}, {y}) failed"
            )));
        }
        Ok(())
    }

    fn click(&self, button: MouseButton) -> TrackerResult<()> {
        let (down, up) = match button {
            MouseButton::Left => (MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP),
            MouseButton::Right => (MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP),
        };
        send_inputs(&[mouse_input(down), mouse_input(up)])
    }

    fn minimize_window(&self, window: WindowHandle) -> TrackerResult<bool> {
        unsafe { ShowWindow(to_hwnd(window), SW_MINIMIZE) };
        Ok(true)
    }

    fn maximize_window(&self, window: WindowHandle) -> TrackerResult<bool> {
        unsafe { ShowWindow(to_hwnd(window), SW_MAXIMIZE) };
        Ok(true)
    }

    fn close_window(&self, window: WindowHandle) -> TrackerResult<bool> {
        Ok(unsafe { PostMessageW(to_hwnd(window), WM_CLOSE, 0, 0) } != 0)
    }
}
