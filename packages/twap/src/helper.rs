use cosmwasm_std::{Event, MessageInfo};

/// ## Description
/// Constructors for the events emitted by the oracle, tagged with who triggered them.
pub trait EventExt {
    fn from_info(name: impl Into<String>, info: &MessageInfo) -> Event;
    fn from_sudo(name: impl Into<String>) -> Event;
}

impl EventExt for Event {
    fn from_info(name: impl Into<String>, info: &MessageInfo) -> Event {
        Event::new(name).add_attribute("tx_sender", info.sender.to_string())
    }

    fn from_sudo(name: impl Into<String>) -> Event {
        Event::new(name).add_attribute("tx_sender", "sudo")
    }
}
