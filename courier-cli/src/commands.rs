//! Menu command implementations.
//!
//! Each function is one menu action: prompt for whatever input the action
//! needs, call the session facade, print the outcome.

use std::fs;

use anyhow::{Context, Result};
use courier_core::{InterpretedEvent, KeyState, SessionClient, TcpTransport};
use dialoguer::Input;

use crate::display;

type Client = SessionClient<TcpTransport>;

fn prompt(label: &str) -> Result<String> {
    Ok(Input::<String>::new().with_prompt(label).interact_text()?)
}

pub fn register(client: &mut Client) -> Result<()> {
    let name = prompt("Please enter registration user name")?;
    let identity = client.register(&name)?;
    display::success(&format!(
        "Registered as {} ({})",
        identity.name(),
        hex::encode(identity.id())
    ));
    Ok(())
}

pub fn list_peers(client: &mut Client) -> Result<()> {
    let peers = client.list_peers()?;
    if peers.is_empty() {
        display::info("No other clients registered.");
        return Ok(());
    }

    for (id, name) in peers {
        let state = match client.directory().find_by_name(&name) {
            Ok(peer) => match peer.key_state() {
                KeyState::NoKey => "",
                KeyState::PublicKeyKnown => " [public key]",
                KeyState::SessionKeyEstablished => " [session key]",
            },
            Err(_) => "",
        };
        println!("  {}  {}{}", hex::encode(id), name, state);
    }
    Ok(())
}

pub fn fetch_public_key(client: &mut Client) -> Result<()> {
    let name = prompt("Peer name")?;
    client.fetch_public_key(&name)?;
    display::success(&format!("Public key for {} is on file.", name));
    Ok(())
}

pub fn poll_messages(client: &mut Client) -> Result<()> {
    let results = client.poll_messages()?;
    if results.is_empty() {
        display::info("No waiting messages.");
        return Ok(());
    }

    for result in results {
        match result {
            Ok(InterpretedEvent::KeyRequested { peer, .. }) => {
                println!("From: {}\nContent:\nRequest for symmetric key\n", peer);
            }
            Ok(InterpretedEvent::SessionKeyEstablished { peer, .. }) => {
                println!("From: {}\nContent:\nSymmetric key received\n", peer);
            }
            Ok(InterpretedEvent::TextReceived { peer, text, .. }) => {
                println!("From: {}\nContent:\n{}\n", peer, text);
            }
            Ok(InterpretedEvent::FileReceived {
                peer,
                message_id,
                bytes,
            }) => {
                let path = std::env::temp_dir().join(format!("{}_{}.bin", peer, message_id));
                fs::write(&path, &bytes)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("From: {}\nContent:\nFile saved to {}\n", peer, path.display());
            }
            Err(e) => display::warning(&format!("Skipped one message: {}", e)),
        }
    }
    Ok(())
}

pub fn send_text(client: &mut Client) -> Result<()> {
    let name = prompt("Peer name")?;
    let text = prompt("Message")?;
    let message_id = client.send_text(&name, &text)?;
    display::success(&format!("Message {} queued for {}.", message_id, name));
    Ok(())
}

pub fn request_session_key(client: &mut Client) -> Result<()> {
    let name = prompt("Peer name")?;
    let message_id = client.request_session_key(&name)?;
    display::success(&format!(
        "Symmetric key request {} queued for {}.",
        message_id, name
    ));
    Ok(())
}

pub fn send_session_key(client: &mut Client) -> Result<()> {
    let name = prompt("Peer name")?;
    let message_id = client.send_session_key(&name)?;
    display::success(&format!(
        "Symmetric key {} queued for {}.",
        message_id, name
    ));
    Ok(())
}

pub fn send_file(client: &mut Client) -> Result<()> {
    let name = prompt("Peer name")?;
    let path = prompt("File path")?;
    let bytes = fs::read(&path).with_context(|| format!("failed to read {}", path))?;
    let message_id = client.send_file(&name, &bytes)?;
    display::success(&format!("File {} queued for {}.", message_id, name));
    Ok(())
}
