use crate::{TrackerError, TrackerResult, WindowHandle, WindowRect};
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;
use windows_sys::Win32::{
    Foundation::{CloseHandle, ERROR_ACCESS_DENIED, GetLastError, HANDLE, HWND, LPARAM, RECT},
    System::{
        ProcessStatus::GetModuleBaseNameW,
        Threading::{
            OpenProcess, PROCESS_ACCESS_RIGHTS, PROCESS_NAME_WIN32,
            PROCESS_QUERY_INFORMATION, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_VM_READ,
            QueryFullProcessImageNameW,
        },
    },
    UI::WindowsAndMessaging::{
        EnumWindows, GetForegroundWindow, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
        GetWindowThreadProcessId, IsWindow, IsWindowVisible,
    },
};

pub(crate) fn to_hwnd(window: WindowHandle) -> HWND {
    window.0 as usize as HWND
}

pub(crate) fn from_hwnd(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd as usize as u64)
}

pub fn get_foreground_window() -> Option<HWND> {
    let hwnd = unsafe { GetForegroundWindow() };
    if hwnd.is_null() || unsafe { IsWindow(hwnd) } == 0 {
        None
    } else {
        Some(hwnd)
    }
}

pub fn is_interactive_session() -> TrackerResult<bool> {
    use windows_sys::Win32::System::StationsAndDesktops::{
        GetProcessWindowStation, GetUserObjectInformationW, UOI_FLAGS, USEROBJECTFLAGS,
    };

    let station = unsafe { GetProcessWindowStation() };
    if station.is_null() {
        return Err(TrackerError::platform("failed to get process window station"));
    }

    let mut flags: USEROBJECTFLAGS = unsafe { std::mem::zeroed() };
    let mut needed: u32 = 0;
    let ok = unsafe {
        GetUserObjectInformationW(
            station as _,
            UOI_FLAGS,
            &mut flags as *mut _ as *mut _,
            std::mem::size_of::<USEROBJECTFLAGS>() as u32,
            &mut needed,
        )
    };

    if ok == 0 {
        return Err(TrackerError::platform("failed to get window station flags"));
    }

    // WSF_VISIBLE
    Ok(flags.dwFlags & 1 != 0)
}

unsafe extern "system" fn collect_visible(hwnd: HWND, lparam: LPARAM) -> i32 {
    let handles = unsafe { &mut *(lparam as *mut Vec<WindowHandle>) };
    if unsafe { IsWindowVisible(hwnd) } != 0 {
        handles.push(from_hwnd(hwnd));
    }
    1
}

/// Visible top-level windows in Z-order, topmost first.
pub(crate) fn enumerate_visible() -> TrackerResult<Vec<WindowHandle>> {
    let mut handles: Vec<WindowHandle> = Vec::new();
    let ok = unsafe {
        EnumWindows(
            Some(collect_visible),
            &mut handles as *mut Vec<WindowHandle> as LPARAM,
        )
    };

    if ok == 0 {
        return Err(TrackerError::platform("EnumWindows failed"));
    }

    Ok(handles)
}

pub(crate) fn get_window_title(hwnd: HWND) -> TrackerResult<String> {
    let len = unsafe { GetWindowTextLengthW(hwnd) };
    if len <= 0 {
        return Ok(String::new());
    }

    let mut buffer = vec![0u16; len as usize + 1];
    let copied = unsafe { GetWindowTextW(hwnd, buffer.as_mut_ptr(), buffer.len() as i32) };
    if copied <= 0 {
        return Ok(String::new());
    }

    Ok(OsString::from_wide(&buffer[..copied as usize])
        .to_string_lossy()
        .into_owned())
}

/// Owning `(thread_id, process_id)` of a window.
pub(crate) fn get_window_thread_process_id(hwnd: HWND) -> TrackerResult<(u32, u32)> {
    let mut process_id = 0u32;
    let thread_id = unsafe { GetWindowThreadProcessId(hwnd, &mut process_id) };

    if thread_id == 0 || process_id == 0 {
        return Err(TrackerError::not_found(format!(
            "owner of window {}",
            from_hwnd(hwnd)
        )));
    }

    Ok((thread_id, process_id))
}

pub(crate) fn get_window_rect(hwnd: HWND) -> TrackerResult<WindowRect> {
    let mut rect: RECT = unsafe { std::mem::zeroed() };
    if unsafe { GetWindowRect(hwnd, &mut rect) } == 0 {
        return Err(TrackerError::platform(format!(
            "failed to get rect of window {}",
            from_hwnd(hwnd)
        )));
    }

    Ok(WindowRect {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    })
}

struct HandleGuard(HANDLE);

impl Drop for HandleGuard {
    fn drop(&mut self) {
        unsafe { CloseHandle(self.0) };
    }
}

fn open_process(process_id: u32, access: PROCESS_ACCESS_RIGHTS) -> TrackerResult<HandleGuard> {
    let handle = unsafe { OpenProcess(access, 0, process_id) };
    if handle.is_null() {
        return Err(match unsafe { GetLastError() } {
            ERROR_ACCESS_DENIED => TrackerError::AccessDenied,
            code => TrackerError::platform(format!(
                "failed to open process {process_id} (error {code})"
            )),
        });
    }
    Ok(HandleGuard(handle))
}

pub(crate) fn get_process_exe_path(process_id: u32) -> TrackerResult<PathBuf> {
    let process = open_process(process_id, PROCESS_QUERY_LIMITED_INFORMATION)?;

    let mut buffer = vec![0u16; 32768];
    let mut len = buffer.len() as u32;
    let ok = unsafe {
        QueryFullProcessImageNameW(process.0, PROCESS_NAME_WIN32, buffer.as_mut_ptr(), &mut len)
    };

    if ok == 0 || len == 0 {
        return Err(TrackerError::platform(
            "failed to query process image name",
        ));
    }

    buffer.truncate(len as usize);
    Ok(PathBuf::from(OsString::from_wide(&buffer)))
}

fn get_module_base_name(process_id: u32) -> TrackerResult<String> {
    let process = open_process(process_id, PROCESS_QUERY_INFORMATION | PROCESS_VM_READ)?;

    let mut buffer = [0u16; 512];
    let len = unsafe {
        GetModuleBaseNameW(
            process.0,
            std::ptr::null_mut(),
            buffer.as_mut_ptr(),
            buffer.len() as u32,
        )
    };

    if len == 0 {
        return Err(TrackerError::platform("failed to get module name"));
    }

    Ok(OsString::from_wide(&buffer[..len as usize])
        .to_string_lossy()
        .into_owned())
}

/// Lower-cased executable file name.
///
/// The image path needs only limited query rights, so it also works for
/// most elevated processes; the module name is the fallback.
pub(crate) fn get_process_name(process_id: u32) -> TrackerResult<String> {
    let from_path = get_process_exe_path(process_id).ok().and_then(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
    });

    let name = match from_path {
        Some(name) => name,
        None => get_module_base_name(process_id)?,
    };

    Ok(name.to_lowercase())
}
