//! Host-only globals: clipboard, window title and exit.

use std::cell::RefCell;
use std::rc::Rc;

use mlua::Lua;

/// Requests scripts make of the window, applied after the current frame.
#[derive(Debug, Default)]
pub struct HostRequests {
    pub title: Option<String>,
    pub exit: bool,
}

pub fn register(lua: &Lua, requests: &Rc<RefCell<HostRequests>>) -> mlua::Result<()> {
    let globals = lua.globals();

    globals.set(
        "Copy",
        lua.create_function(|_, text: String| {
            match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
                Ok(()) => Ok(true),
                Err(e) => {
                    log::warn!("Copy(): clipboard unavailable: {e}");
                    Ok(false)
                }
            }
        })?,
    )?;

    globals.set(
        "Paste",
        lua.create_function(|_, ()| {
            Ok(arboard::Clipboard::new().and_then(|mut cb| cb.get_text()).ok())
        })?,
    )?;

    let r = Rc::clone(requests);
    globals.set(
        "SetWindowTitle",
        lua.create_function(move |_, title: String| {
            r.borrow_mut().title = Some(title);
            Ok(())
        })?,
    )?;

    let r = Rc::clone(requests);
    globals.set(
        "Exit",
        lua.create_function(move |_, ()| {
            r.borrow_mut().exit = true;
            Ok(())
        })?,
    )
}
