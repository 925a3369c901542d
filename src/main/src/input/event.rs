use core::ffi::CStr;
use esp_idf_svc::eventloop::*;

use control::InputEvent;

#[derive(Copy, Clone, Debug)]
pub struct UserInputEvent(pub InputEvent);

impl UserInputEvent {
    pub fn value(&self) -> InputEvent {
        self.0
    }
}

unsafe impl EspEventSource for UserInputEvent {
    fn source() -> Option<&'static CStr> {
        // String should be unique across the whole project and ESP IDF
        Some(c"USER-INPUT-EVENT")
    }
}

impl EspEventSerializer for UserInputEvent {
    type Data<'a> = UserInputEvent;

    fn serialize<F, R>(event: &Self::Data<'_>, f: F) -> R
    where
        F: FnOnce(&EspEventPostData) -> R,
    {
        // Go the easy way since our payload implements Copy and is `'static`
        f(&unsafe { EspEventPostData::new(Self::source().unwrap(), Self::event_id(), event) })
    }
}

impl EspEventDeserializer for UserInputEvent {
    type Data<'a> = UserInputEvent;

    fn deserialize<'a>(data: &EspEvent<'a>) -> Self::Data<'a> {
        // Just as easy as serializing
        *unsafe { data.as_payload::<UserInputEvent>() }
    }
}
