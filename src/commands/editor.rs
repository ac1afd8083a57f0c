use super::CommandResponse;
use crate::fleet::FleetCore;
use crate::open_apps::{EditorAvailability, EditorKind};

pub fn detect_editors(core: &FleetCore) -> CommandResponse<EditorAvailability> {
    CommandResponse::ok(core.detect_editors())
}

pub fn open_in_editor(core: &FleetCore, editor: &str, path: &str) -> CommandResponse<bool> {
    match editor.parse::<EditorKind>() {
        Ok(kind) => CommandResponse::ok(core.open_in_editor(kind, path)),
        Err(e) => CommandResponse::err(e),
    }
}
