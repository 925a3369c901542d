use core::ffi::CStr;
use esp_idf_svc::eventloop::*;

use control::StatusFrame;

#[derive(Copy, Clone, Debug)]
pub enum StatusEvent {
    Frame(StatusFrame),
}

impl StatusEvent {
    pub fn frame(&self) -> StatusFrame {
        match self {
            StatusEvent::Frame(frame) => *frame,
        }
    }
}

unsafe impl EspEventSource for StatusEvent {
    fn source() -> Option<&'static CStr> {
        // String should be unique across the whole project and ESP IDF
        Some(c"STATUS-FRAME-EVENT")
    }
}

impl EspEventSerializer for StatusEvent {
    type Data<'a> = StatusEvent;

    fn serialize<F, R>(event: &Self::Data<'_>, f: F) -> R
    where
        F: FnOnce(&EspEventPostData) -> R,
    {
        // Go the easy way since our payload implements Copy and is `'static`
        f(&unsafe { EspEventPostData::new(Self::source().unwrap(), Self::event_id(), event) })
    }
}

impl EspEventDeserializer for StatusEvent {
    type Data<'a> = StatusEvent;

    fn deserialize<'a>(data: &EspEvent<'a>) -> Self::Data<'a> {
        // Just as easy as serializing
        *unsafe { data.as_payload::<StatusEvent>() }
    }
}
