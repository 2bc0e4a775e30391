//! Interactive Menu
//!
//! Maps the numeric menu codes to actions. The mapping is a closed enum
//! rather than string comparisons scattered through the loop, so adding
//! an action means adding a variant and the compiler finds the rest.

/// One user-selectable action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Register,
    ListPeers,
    FetchPublicKey,
    PollMessages,
    SendText,
    RequestSessionKey,
    SendSessionKey,
    SendFile,
    Exit,
}

impl MenuAction {
    /// Parses a menu code as typed at the prompt.
    pub fn parse(input: &str) -> Option<MenuAction> {
        match input.trim() {
            "10" => Some(MenuAction::Register),
            "20" => Some(MenuAction::ListPeers),
            "30" => Some(MenuAction::FetchPublicKey),
            "40" => Some(MenuAction::PollMessages),
            "50" => Some(MenuAction::SendText),
            "51" => Some(MenuAction::RequestSessionKey),
            "52" => Some(MenuAction::SendSessionKey),
            "53" => Some(MenuAction::SendFile),
            "0" => Some(MenuAction::Exit),
            _ => None,
        }
    }
}

/// The usage banner shown before each prompt.
pub const USAGE: &str = "\
Courier client at your service.
10) Register
20) Request for clients list
30) Request for public key
40) Request for waiting messages
50) Send a text message
51) Send a request for symmetric key
52) Send your symmetric key
53) Send a file
0) Exit client
";
