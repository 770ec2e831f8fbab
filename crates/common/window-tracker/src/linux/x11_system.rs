use super::utils::{poll_until, process_name_from};
use crate::{
    TrackerError, TrackerResult, WindowHandle, WindowRect,
    system::{ModifierKey, MouseButton, WindowSystem},
};
use std::path::PathBuf;
use std::time::Duration;
use x11rb::{
    CURRENT_TIME, NONE,
    connection::Connection,
    protocol::{
        xproto::{
            AtomEnum, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT, ClientMessageEvent,
            ConfigureWindowAux, ConnectionExt, EventMask, InputFocus, KEY_PRESS_EVENT,
            KEY_RELEASE_EVENT, StackMode, Window,
        },
        xtest::ConnectionExt as _,
    },
    rust_connection::RustConnection,
};

const MAX_STRING_PROPERTY_LEN: u32 = 4096;
const MAX_CLIENT_LIST_LEN: u32 = 4096;

// ICCCM / EWMH message arguments.
const ICONIC_STATE: u32 = 3;
const NET_WM_STATE_ADD: u32 = 1;
const SOURCE_PAGER: u32 = 2;

const ACTIVATION_POLL_TIMEOUT: Duration = Duration::from_millis(250);
const ACTIVATION_POLL_INTERVAL: Duration = Duration::from_millis(10);

const XK_ALT_L: u32 = 0xffe9;
const XK_SHIFT_L: u32 = 0xffe1;
const XK_CONTROL_L: u32 = 0xffe3;

#[derive(Debug, Clone, Copy)]
struct X11Atoms {
    net_active_window: u32,
    net_client_list: u32,
    net_client_list_stacking: u32,
    net_wm_name: u32,
    net_wm_pid: u32,
    net_wm_state: u32,
    net_wm_state_maximized_vert: u32,
    net_wm_state_maximized_horz: u32,
    net_close_window: u32,
    wm_change_state: u32,
    utf8_string: u32,
}

/// [`WindowSystem`] over an X11 connection with EWMH and XTEST.
///
/// X11 has no per-thread input queues, so the thread primitives report
/// [`TrackerError::Unsupported`] and input attachment is skipped.
pub struct X11System {
    conn: RustConnection,
    root: Window,
    atoms: X11Atoms,
}

impl X11System {
    /// # Errors
    ///
    /// Returns [`TrackerError::NoDisplay`] when no X server is reachable.
    pub fn connect() -> TrackerResult<Self> {
        let (conn, screen_num) = connect_to_x11()?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| TrackerError::platform(format!("no X11 screen {screen_num}")))?
            .root;
        let atoms = setup_atoms(&conn)?;

        Ok(Self { conn, root, atoms })
    }

    fn flush(&self) -> TrackerResult<()> {
        self.conn
            .flush()
            .map_err(|e| TrackerError::platform_with_source("failed to flush X11 connection", e))
    }

    fn window_list(&self, property: u32) -> TrackerResult<Vec<Window>> {
        let reply = self
            .conn
            .get_property(false, self.root, property, AtomEnum::WINDOW, 0, MAX_CLIENT_LIST_LEN)
            .map_err(|e| TrackerError::platform_with_source("failed to get client list", e))?
            .reply()
            .map_err(|e| {
                TrackerError::platform_with_source("failed to get client list reply", e)
            })?;

        Ok(reply
            .value32()
            .map(|values| values.collect())
            .unwrap_or_default())
    }

    /// Sends an EWMH client message about `window` to the root window.
    fn send_root_message(&self, window: Window, message_type: u32, data: [u32; 5]) -> TrackerResult<()> {
        let event = ClientMessageEvent::new(32, window, message_type, data);
        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
                event,
            )
            .map_err(|e| TrackerError::platform_with_source("failed to send client message", e))?;
        self.flush()
    }

    fn keycode_for(&self, keysym: u32) -> TrackerResult<u8> {
        let setup = self.conn.setup();
        let min = setup.min_keycode;
        let count = setup.max_keycode - min + 1;

        let mapping = self
            .conn
            .get_keyboard_mapping(min, count)
            .map_err(|e| TrackerError::platform_with_source("failed to get keyboard mapping", e))?
            .reply()
            .map_err(|e| {
                TrackerError::platform_with_source("failed to get keyboard mapping reply", e)
            })?;

        let per_keycode = usize::from(mapping.keysyms_per_keycode.max(1));
        mapping
            .keysyms
            .chunks(per_keycode)
            .position(|syms| syms.contains(&keysym))
            .and_then(|offset| u8::try_from(offset).ok())
            .map(|offset| min + offset)
            .ok_or_else(|| TrackerError::not_found(format!("keycode for keysym {keysym:#x}")))
    }

    fn fake_input(&self, event_type: u8, detail: u8) -> TrackerResult<()> {
        self.conn
            .xtest_fake_input(event_type, detail, CURRENT_TIME, self.root, 0, 0, 0)
            .map_err(|e| TrackerError::platform_with_source("failed to inject input", e))?;
        self.flush()
    }

    fn fake_key(&self, key: ModifierKey, event_type: u8) -> TrackerResult<()> {
        let keysym = match key {
            ModifierKey::Alt => XK_ALT_L,
            ModifierKey::Shift => XK_SHIFT_L,
            ModifierKey::Control => XK_CONTROL_L,
        };
        let keycode = self.keycode_for(keysym)?;
        self.fake_input(event_type, keycode)
    }

    fn active_window(&self) -> TrackerResult<Option<Window>> {
        get_active_window(&self.conn, self.root, self.atoms.net_active_window)
    }
}

impl WindowSystem for X11System {
    fn foreground_window(&self) -> TrackerResult<Option<WindowHandle>> {
        Ok(self.active_window()?.map(|w| WindowHandle(u64::from(w))))
    }

    /// Managed client windows, topmost first when the stacking list is available.
    fn enumerate_windows(&self) -> TrackerResult<Vec<WindowHandle>> {
        let mut windows = self.window_list(self.atoms.net_client_list_stacking)?;
        if windows.is_empty() {
            windows = self.window_list(self.atoms.net_client_list)?;
        } else {
            windows.reverse();
        }

        Ok(windows
            .into_iter()
            .map(|w| WindowHandle(u64::from(w)))
            .collect())
    }

    fn window_title(&self, window: WindowHandle) -> TrackerResult<String> {
        let window = to_window(window)?;
        Ok(get_window_name(&self.conn, window, &self.atoms)?.unwrap_or_default())
    }

    fn window_process_id(&self, window: WindowHandle) -> TrackerResult<u32> {
        get_window_pid(&self.conn, to_window(window)?, self.atoms.net_wm_pid)
    }

    fn window_thread_id(&self, _window: WindowHandle) -> TrackerResult<u32> {
        Err(TrackerError::Unsupported)
    }

    fn window_rect(&self, window: WindowHandle) -> TrackerResult<WindowRect> {
        let window = to_window(window)?;
        let geometry = self
            .conn
            .get_geometry(window)
            .map_err(|e| TrackerError::platform_with_source("failed to get geometry", e))?
            .reply()
            .map_err(|e| TrackerError::platform_with_source("failed to get geometry reply", e))?;

        // Geometry is parent-relative; reparenting window managers wrap clients in frames.
        let origin = self
            .conn
            .translate_coordinates(window, self.root, 0, 0)
            .map_err(|e| TrackerError::platform_with_source("failed to translate coordinates", e))?
            .reply()
            .map_err(|e| {
                TrackerError::platform_with_source("failed to translate coordinates reply", e)
            })?;

        let left = i32::from(origin.dst_x);
        let top = i32::from(origin.dst_y);
        Ok(WindowRect {
            left,
            top,
            right: left + i32::from(geometry.width),
            bottom: top + i32::from(geometry.height),
        })
    }

    fn process_name(&self, process_id: u32) -> TrackerResult<String> {
        let exe = self.process_executable(process_id).ok();
        let comm = std::fs::read_to_string(format!("/proc/{process_id}/comm")).ok();

        process_name_from(exe.as_deref(), comm.as_deref())
            .ok_or_else(|| TrackerError::not_found(format!("process {process_id}")))
    }

    fn process_executable(&self, process_id: u32) -> TrackerResult<PathBuf> {
        std::fs::read_link(format!("/proc/{process_id}/exe")).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => TrackerError::AccessDenied,
            std::io::ErrorKind::NotFound => TrackerError::not_found(format!("process {process_id}")),
            _ => TrackerError::platform_with_source(
                format!("failed to resolve executable of pid {process_id}"),
                e,
            ),
        })
    }

    fn current_thread_id(&self) -> TrackerResult<u32> {
        Err(TrackerError::Unsupported)
    }

    fn attach_thread_input(&self, _from: u32, _to: u32, _attach: bool) -> TrackerResult<bool> {
        Err(TrackerError::Unsupported)
    }

    fn restore_window(&self, window: WindowHandle) -> TrackerResult<()> {
        self.conn
            .map_window(to_window(window)?)
            .map_err(|e| TrackerError::platform_with_source("failed to map window", e))?;
        self.flush()
    }

    fn raise_window(&self, window: WindowHandle) -> TrackerResult<()> {
        self.conn
            .configure_window(
                to_window(window)?,
                &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
            )
            .map_err(|e| TrackerError::platform_with_source("failed to raise window", e))?;
        self.flush()
    }

    fn request_foreground(&self, window: WindowHandle) -> TrackerResult<bool> {
        let target = to_window(window)?;
        self.send_root_message(
            target,
            self.atoms.net_active_window,
            [SOURCE_PAGER, CURRENT_TIME, 0, 0, 0],
        )?;
        poll_until(ACTIVATION_POLL_TIMEOUT, ACTIVATION_POLL_INTERVAL, || {
            Ok(self.active_window()? == Some(target))
        })
    }

    fn set_foreground_raw(&self, window: WindowHandle) -> TrackerResult<bool> {
        let cookie = self
            .conn
            .set_input_focus(InputFocus::PARENT, to_window(window)?, CURRENT_TIME)
            .map_err(|e| TrackerError::platform_with_source("failed to set input focus", e))?;
        Ok(cookie.check().is_ok())
    }

    fn key_down(&self, key: ModifierKey) -> TrackerResult<()> {
        self.fake_key(key, KEY_PRESS_EVENT)
    }

    fn key_up(&self, key: ModifierKey) -> TrackerResult<()> {
        self.fake_key(key, KEY_RELEASE_EVENT)
    }

    fn cursor_position(&self) -> TrackerResult<(i32, i32)> {
        let pointer = self
            .conn
            .query_pointer(self.root)
            .map_err(|e| TrackerError::platform_with_source("failed to query pointer", e))?
            .reply()
            .map_err(|e| TrackerError::platform_with_source("failed to query pointer reply", e))?;
        Ok((i32::from(pointer.root_x), i32::from(pointer.root_y)))
    }

    fn set_cursor_position(&self, x: i32, y: i32) -> TrackerResult<()> {
        let clamp = |v: i32| v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        self.conn
            .warp_pointer(NONE, self.root, 0, 0, 0, 0, clamp(x), clamp(y))
            .map_err(|e| TrackerError::platform_with_source("failed to warp pointer", e))?;
        self.flush()
    }

    fn click(&self, button: MouseButton) -> TrackerResult<()> {
        let detail = match button {
            MouseButton::Left => 1,
            MouseButton::Right => 3,
        };
        self.fake_input(BUTTON_PRESS_EVENT, detail)?;
        self.fake_input(BUTTON_RELEASE_EVENT, detail)
    }

    fn minimize_window(&self, window: WindowHandle) -> TrackerResult<bool> {
        self.send_root_message(
            to_window(window)?,
            self.atoms.wm_change_state,
            [ICONIC_STATE, 0, 0, 0, 0],
        )?;
        Ok(true)
    }

    fn maximize_window(&self, window: WindowHandle) -> TrackerResult<bool> {
        self.send_root_message(
            to_window(window)?,
            self.atoms.net_wm_state,
            [
                NET_WM_STATE_ADD,
                self.atoms.net_wm_state_maximized_vert,
                self.atoms.net_wm_state_maximized_horz,
                SOURCE_PAGER,
                0,
            ],
        )?;
        Ok(true)
    }

    fn close_window(&self, window: WindowHandle) -> TrackerResult<bool> {
        self.send_root_message(
            to_window(window)?,
            self.atoms.net_close_window,
            [CURRENT_TIME, SOURCE_PAGER, 0, 0, 0],
        )?;
        Ok(true)
    }
}

impl std::fmt::Debug for X11System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X11System")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

fn to_window(window: WindowHandle) -> TrackerResult<Window> {
    Window::try_from(window.0)
        .map_err(|_| TrackerError::not_found(format!("X11 window {window}")))
}

fn connect_to_x11() -> TrackerResult<(RustConnection, usize)> {
    RustConnection::connect(None).map_err(|e| {
        let error_str = e.to_string();
        if error_str.contains("DISPLAY")
            || error_str.contains("display")
            || error_str.contains("No such file or directory")
        {
            TrackerError::NoDisplay
        } else {
            TrackerError::platform_with_source("failed to connect to X11", e)
        }
    })
}

fn setup_atoms<C: Connection>(conn: &C) -> TrackerResult<X11Atoms> {
    Ok(X11Atoms {
        net_active_window: get_atom(conn, b"_NET_ACTIVE_WINDOW")?,
        net_client_list: get_atom(conn, b"_NET_CLIENT_LIST")?,
        net_client_list_stacking: get_atom(conn, b"_NET_CLIENT_LIST_STACKING")?,
        net_wm_name: get_atom(conn, b"_NET_WM_NAME")?,
        net_wm_pid: get_atom(conn, b"_NET_WM_PID")?,
        net_wm_state: get_atom(conn, b"_NET_WM_STATE")?,
        net_wm_state_maximized_vert: get_atom(conn, b"_NET_WM_STATE_MAXIMIZED_VERT")?,
        net_wm_state_maximized_horz: get_atom(conn, b"_NET_WM_STATE_MAXIMIZED_HORZ")?,
        net_close_window: get_atom(conn, b"_NET_CLOSE_WINDOW")?,
        wm_change_state: get_atom(conn, b"WM_CHANGE_STATE")?,
        utf8_string: get_atom(conn, b"UTF8_STRING")?,
    })
}

fn get_atom<C: Connection>(conn: &C, name: &[u8]) -> TrackerResult<u32> {
    let cookie = conn
        .intern_atom(false, name)
        .map_err(|e| TrackerError::platform_with_source("failed to intern atom", e))?;

    let reply = cookie
        .reply()
        .map_err(|e| TrackerError::platform_with_source("failed to get atom reply", e))?;

    Ok(reply.atom)
}

fn get_active_window<C: Connection>(
    conn: &C,
    root: u32,
    net_active_window: u32,
) -> TrackerResult<Option<u32>> {
    let cookie = conn
        .get_property(false, root, net_active_window, AtomEnum::WINDOW, 0, 1)
        .map_err(|e| TrackerError::platform_with_source("failed to get active window property", e))?;

    let reply = cookie
        .reply()
        .map_err(|e| TrackerError::platform_with_source("failed to get active window reply", e))?;

    Ok(reply
        .value32()
        .and_then(|mut v| v.next())
        .filter(|&id| id != 0))
}

/// `_NET_WM_NAME` in UTF-8, falling back to the legacy `WM_NAME`.
fn get_window_name<C: Connection>(
    conn: &C,
    window: u32,
    atoms: &X11Atoms,
) -> TrackerResult<Option<String>> {
    match try_get_property_string(conn, window, atoms.net_wm_name, atoms.utf8_string) {
        Ok(Some(title)) => Ok(Some(title)),
        _ => try_get_property_string(
            conn,
            window,
            AtomEnum::WM_NAME.into(),
            AtomEnum::STRING.into(),
        ),
    }
}

fn try_get_property_string<C: Connection>(
    conn: &C,
    window: u32,
    property: u32,
    property_type: u32,
) -> TrackerResult<Option<String>> {
    let cookie = conn
        .get_property(false, window, property, property_type, 0, MAX_STRING_PROPERTY_LEN)
        .map_err(|e| TrackerError::platform_with_source("failed to get window property", e))?;

    let reply = cookie
        .reply()
        .map_err(|e| TrackerError::platform_with_source("failed to get window property reply", e))?;

    if reply.value_len > 0 {
        Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()))
    } else {
        Ok(None)
    }
}

fn get_window_pid<C: Connection>(conn: &C, window: u32, net_wm_pid: u32) -> TrackerResult<u32> {
    let cookie = conn
        .get_property(false, window, net_wm_pid, AtomEnum::CARDINAL, 0, 1)
        .map_err(|e| TrackerError::platform_with_source("failed to get window PID property", e))?;

    let reply = cookie
        .reply()
        .map_err(|e| TrackerError::platform_with_source("failed to get window PID reply", e))?;

    reply
        .value32()
        .and_then(|mut v| v.next())
        .filter(|&pid| pid != 0)
        .ok_or_else(|| TrackerError::not_found(format!("_NET_WM_PID of window {window:#x}")))
}
