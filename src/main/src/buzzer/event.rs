use core::ffi::CStr;
use esp_idf_svc::eventloop::*;

use control::Notice;

#[derive(Copy, Clone, Debug)]
pub struct NoticeEvent(pub Notice);

impl NoticeEvent {
    pub fn value(&self) -> Notice {
        self.0
    }
}

unsafe impl EspEventSource for NoticeEvent {
    fn source() -> Option<&'static CStr> {
        // String should be unique across the whole project and ESP IDF
        Some(c"CONTROL-NOTICE-EVENT")
    }
}

impl EspEventSerializer for NoticeEvent {
    type Data<'a> = NoticeEvent;

    fn serialize<F, R>(event: &Self::Data<'_>, f: F) -> R
    where
        F: FnOnce(&EspEventPostData) -> R,
    {
        // Go the easy way since our payload implements Copy and is `'static`
        f(&unsafe { EspEventPostData::new(Self::source().unwrap(), Self::event_id(), event) })
    }
}

impl EspEventDeserializer for NoticeEvent {
    type Data<'a> = NoticeEvent;

    fn deserialize<'a>(data: &EspEvent<'a>) -> Self::Data<'a> {
        // Just as easy as serializing
        *unsafe { data.as_payload::<NoticeEvent>() }
    }
}
